//! Straight-line segments with exact evaluation and range averaging
//!
//! Every value is a `Decimal`, so evaluating a line never goes through a
//! floating-point intermediate. Products are taken before the division by the
//! line's width to keep slopes like 1/3 from truncating early.

use crate::error::CurveError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Linear function through two points: `y = y1 + slope * (x - x1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    x1: Decimal,
    y1: Decimal,
    x2: Decimal,
    y2: Decimal,
}

impl Line {
    /// Build a line through `(x1, y1)` and `(x2, y2)`
    ///
    /// A zero-width line (`x1 == x2`) is accepted only when both endpoints
    /// carry the same value; it then behaves as a constant.
    pub fn new(x1: Decimal, y1: Decimal, x2: Decimal, y2: Decimal) -> Result<Self, CurveError> {
        if x1 == x2 && y1 != y2 {
            return Err(CurveError::DegenerateLine { x: x1, y1, y2 });
        }

        Ok(Self { x1, y1, x2, y2 })
    }

    /// Line through two points already known to have distinct x or equal y
    pub(crate) fn between(x1: Decimal, y1: Decimal, x2: Decimal, y2: Decimal) -> Self {
        debug_assert!(x1 != x2 || y1 == y2);
        Self { x1, y1, x2, y2 }
    }

    /// Constant line anchored at `x`
    pub fn flat(x: Decimal, y: Decimal) -> Self {
        Self {
            x1: x,
            y1: y,
            x2: x,
            y2: y,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.y1 == self.y2
    }
}

/// Line evaluation helpers
pub struct CurveMath;

impl CurveMath {
    /// Value of `line` at `x`
    ///
    /// Points outside `[x1, x2]` extrapolate along the same slope, so a far
    /// enough `x` can overflow.
    pub fn point_value(line: &Line, x: Decimal) -> Result<Decimal, CurveError> {
        if line.is_flat() {
            return Ok(line.y1);
        }

        // Non-flat lines always have x1 != x2 (enforced by Line::new)
        let overflow = || CurveError::MathOverflow { x };
        let run = line.x2.checked_sub(line.x1).ok_or_else(overflow)?;
        let offset = x.checked_sub(line.x1).ok_or_else(overflow)?;
        (line.y2 - line.y1)
            .checked_mul(offset)
            .and_then(|rise| rise.checked_div(run))
            .and_then(|delta| line.y1.checked_add(delta))
            .ok_or_else(overflow)
    }

    /// Average value of `line` over `[lo, hi]`
    ///
    /// For a linear function the mean over an interval is the mean of its
    /// endpoint values, so no integration is needed.
    pub fn range_average(line: &Line, lo: Decimal, hi: Decimal) -> Result<Decimal, CurveError> {
        if line.is_flat() {
            return Ok(line.y1);
        }
        if lo == hi {
            return Self::point_value(line, lo);
        }

        Self::point_value(line, lo)?
            .checked_add(Self::point_value(line, hi)?)
            .map(|sum| sum / dec!(2))
            .ok_or(CurveError::MathOverflow { x: hi })
    }
}
