//! Three-segment piecewise-linear functions averaged over a sub-range
//!
//! The domain is split by two breakpoints into a lower, middle and upper
//! zone. A query may stay inside one zone or straddle exactly one
//! breakpoint; straddling both is rejected.
//!
//! Zero-width queries sitting exactly on a breakpoint resolve to the middle
//! segment at both ends: `[bp_lower, bp_lower]` reads segment 2, and so does
//! `[bp_upper, bp_upper]`. Non-degenerate ranges ending at `bp_lower` belong to
//! segment 1, ranges starting at `bp_upper` belong to segment 3.

use crate::error::CurveError;
use crate::line::{CurveMath, Line};
use rust_decimal::Decimal;
use tracing::trace;

/// Ordered pair of breakpoints, `lower <= upper`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoints {
    lower: Decimal,
    upper: Decimal,
}

impl Breakpoints {
    pub fn new(lower: Decimal, upper: Decimal) -> Result<Self, CurveError> {
        if lower > upper {
            return Err(CurveError::InvalidBreakpoints { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    pub(crate) fn ordered(lower: Decimal, upper: Decimal) -> Self {
        debug_assert!(lower <= upper);
        Self { lower, upper }
    }

    pub fn lower(&self) -> Decimal {
        self.lower
    }

    pub fn upper(&self) -> Decimal {
        self.upper
    }
}

/// Three line segments joined at two breakpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PiecewiseCurve {
    segments: [Line; 3],
    breakpoints: Breakpoints,
}

impl PiecewiseCurve {
    pub fn new(seg1: Line, seg2: Line, seg3: Line, breakpoints: Breakpoints) -> Self {
        Self {
            segments: [seg1, seg2, seg3],
            breakpoints,
        }
    }

    pub fn segments(&self) -> &[Line; 3] {
        &self.segments
    }

    pub fn breakpoints(&self) -> Breakpoints {
        self.breakpoints
    }

    /// Average of the curve over `[lo, hi]`
    pub fn average(&self, lo: Decimal, hi: Decimal) -> Result<Decimal, CurveError> {
        let [seg1, seg2, seg3] = &self.segments;
        CurveMath::piecewise_average(seg1, seg2, seg3, self.breakpoints, lo, hi)
    }
}

impl CurveMath {
    /// Average a three-segment function over `[lo, hi]`
    ///
    /// # Errors
    /// * `InvalidRange` when `lo > hi`
    /// * `UnexpectedRangeDelta` when the range would need all three segments
    pub fn piecewise_average(
        seg1: &Line,
        seg2: &Line,
        seg3: &Line,
        breakpoints: Breakpoints,
        lo: Decimal,
        hi: Decimal,
    ) -> Result<Decimal, CurveError> {
        let bp_lower = breakpoints.lower;
        let bp_upper = breakpoints.upper;

        if lo > hi {
            return Err(CurveError::InvalidRange { lo, hi });
        }

        if (lo <= bp_lower && hi > bp_upper) || (lo < bp_lower && hi >= bp_upper) {
            return Err(CurveError::UnexpectedRangeDelta {
                lo,
                hi,
                bp_lower,
                bp_upper,
            });
        }

        if lo < bp_lower && hi <= bp_lower {
            trace!(%lo, %hi, "range below lower breakpoint");
            return Self::range_average(seg1, lo, hi);
        }

        if lo >= bp_upper && hi > bp_upper {
            trace!(%lo, %hi, "range above upper breakpoint");
            return Self::range_average(seg3, lo, hi);
        }

        if bp_lower <= lo && hi <= bp_upper {
            trace!(%lo, %hi, "range inside breakpoints");
            return Self::range_average(seg2, lo, hi);
        }

        if lo < bp_lower {
            // lo < bp_lower < hi < bp_upper
            trace!(%lo, %hi, "range crosses lower breakpoint");
            return Self::blend(seg1, lo, bp_lower, seg2, hi);
        }

        // bp_lower < lo < bp_upper < hi
        trace!(%lo, %hi, "range crosses upper breakpoint");
        Self::blend(seg2, lo, bp_upper, seg3, hi)
    }

    /// Width-weighted mean of `left` over `[lo, split]` and `right` over `[split, hi]`
    fn blend(
        left: &Line,
        lo: Decimal,
        split: Decimal,
        right: &Line,
        hi: Decimal,
    ) -> Result<Decimal, CurveError> {
        let left_width = split - lo;
        let right_width = hi - split;
        let left_avg = Self::range_average(left, lo, split)?;
        let right_avg = Self::range_average(right, split, hi)?;

        let weighted = left_avg
            .checked_mul(left_width)
            .zip(right_avg.checked_mul(right_width))
            .and_then(|(l, r)| l.checked_add(r));
        weighted
            .and_then(|total| total.checked_div(hi - lo))
            .ok_or(CurveError::MathOverflow { x: hi })
    }
}
