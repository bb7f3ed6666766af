//! Fee-factor curves over the reserve asset ratio
//!
//! Each swap direction owns one three-segment curve. The breakpoints are the
//! soft bounds and the outer segments run out to the hard bounds:
//!
//! ```text
//! seg1: (hard_lower, hard_lower_factor) -> (soft_lower, lower_factor)
//! seg2: (soft_lower, lower_factor)      -> (soft_upper, upper_factor)
//! seg3: (soft_upper, upper_factor)      -> (hard_upper, hard_upper_factor)
//! ```
//!
//! Factors are multipliers on the unfee'd output: below 1 is a fee, above 1 a
//! bonus.

use crate::error::CurveError;
use crate::line::{CurveMath, Line};
use crate::piecewise::{Breakpoints, PiecewiseCurve};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Largest factor a curve point may take (a 100% bonus)
pub const MAX_FEE_FACTOR: Decimal = dec!(2);

/// Which reserve side the trader receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapDirection {
    /// Perp in, stable out; the asset ratio falls
    ToStable,
    /// Stable in, perp out; the asset ratio rises
    ToPerp,
}

/// Soft and hard asset-ratio bounds
///
/// Invariant: `hard_lower <= soft_lower <= soft_upper <= hard_upper`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct Bounds {
    soft_lower: Decimal,
    soft_upper: Decimal,
    hard_lower: Decimal,
    hard_upper: Decimal,
}

#[derive(Deserialize)]
struct RawBounds {
    soft_lower: Decimal,
    soft_upper: Decimal,
    hard_lower: Decimal,
    hard_upper: Decimal,
}

impl TryFrom<RawBounds> for Bounds {
    type Error = CurveError;

    fn try_from(raw: RawBounds) -> Result<Self, Self::Error> {
        Self::new((raw.soft_lower, raw.soft_upper), (raw.hard_lower, raw.hard_upper))
    }
}

impl Bounds {
    pub fn new(soft: (Decimal, Decimal), hard: (Decimal, Decimal)) -> Result<Self, CurveError> {
        let (soft_lower, soft_upper) = soft;
        let (hard_lower, hard_upper) = hard;

        let nested = Decimal::ZERO <= hard_lower
            && hard_lower <= soft_lower
            && soft_lower <= soft_upper
            && soft_upper <= hard_upper;
        if !nested {
            return Err(CurveError::InvalidBounds {
                soft_lower,
                soft_upper,
                hard_lower,
                hard_upper,
            });
        }

        Ok(Self {
            soft_lower,
            soft_upper,
            hard_lower,
            hard_upper,
        })
    }

    pub fn soft(&self) -> (Decimal, Decimal) {
        (self.soft_lower, self.soft_upper)
    }

    pub fn hard(&self) -> (Decimal, Decimal) {
        (self.hard_lower, self.hard_upper)
    }

    /// Soft bounds as curve breakpoints
    pub fn breakpoints(&self) -> Breakpoints {
        Breakpoints::ordered(self.soft_lower, self.soft_upper)
    }

    /// `true` when `ratio` lies in `[hard_lower, hard_upper]`
    pub fn within_hard(&self, ratio: Decimal) -> bool {
        self.hard_lower <= ratio && ratio <= self.hard_upper
    }

    pub fn clamp_to_hard(&self, ratio: Decimal) -> Decimal {
        ratio.clamp(self.hard_lower, self.hard_upper)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            soft_lower: dec!(0.75),
            soft_upper: dec!(1.25),
            hard_lower: dec!(0.5),
            hard_upper: dec!(2.0),
        }
    }
}

/// Factor schedule for one swap direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeCurveParams {
    /// Factor at `soft_lower`
    pub lower_factor: Decimal,
    /// Factor at `soft_upper`
    pub upper_factor: Decimal,
    /// Factor at `hard_lower`
    pub hard_lower_factor: Decimal,
    /// Factor at `hard_upper`
    pub hard_upper_factor: Decimal,
}

impl FeeCurveParams {
    /// Same factor everywhere
    pub fn flat(factor: Decimal) -> Self {
        Self {
            lower_factor: factor,
            upper_factor: factor,
            hard_lower_factor: factor,
            hard_upper_factor: factor,
        }
    }

    pub fn validate(&self) -> Result<(), CurveError> {
        check_factor("lower_factor", self.lower_factor)?;
        check_factor("upper_factor", self.upper_factor)?;
        check_factor("hard_lower_factor", self.hard_lower_factor)?;
        check_factor("hard_upper_factor", self.hard_upper_factor)
    }
}

impl Default for FeeCurveParams {
    fn default() -> Self {
        Self::flat(Decimal::ONE)
    }
}

fn check_factor(name: &'static str, value: Decimal) -> Result<(), CurveError> {
    if value < Decimal::ZERO || value > MAX_FEE_FACTOR {
        return Err(CurveError::InvalidPerc {
            name,
            value,
            min: Decimal::ZERO,
            max: MAX_FEE_FACTOR,
        });
    }
    Ok(())
}

/// Fee schedule for both swap directions over one set of bounds
///
/// Curves are rebuilt on every configuration write, so a failed update
/// leaves the previous schedule in force.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeCurveModel {
    bounds: Bounds,
    to_stable: FeeCurveParams,
    to_perp: FeeCurveParams,
    to_stable_curve: PiecewiseCurve,
    to_perp_curve: PiecewiseCurve,
}

impl FeeCurveModel {
    pub fn new(
        bounds: Bounds,
        to_stable: FeeCurveParams,
        to_perp: FeeCurveParams,
    ) -> Result<Self, CurveError> {
        let to_stable_curve = Self::build_curve(&bounds, &to_stable)?;
        let to_perp_curve = Self::build_curve(&bounds, &to_perp)?;

        Ok(Self {
            bounds,
            to_stable,
            to_perp,
            to_stable_curve,
            to_perp_curve,
        })
    }

    /// Build the three segments for one direction
    ///
    /// When a hard bound coincides with its soft bound the outer segment has
    /// no width, so it collapses to a constant at the soft factor. Coinciding
    /// soft bounds leave no room for the middle segment to move between two
    /// factors, so they require `lower_factor == upper_factor`.
    pub fn build_curve(
        bounds: &Bounds,
        params: &FeeCurveParams,
    ) -> Result<PiecewiseCurve, CurveError> {
        params.validate()?;

        let (soft_lower, soft_upper) = bounds.soft();
        if soft_lower == soft_upper && params.lower_factor != params.upper_factor {
            return Err(CurveError::CollapsedSoftBounds {
                at: soft_lower,
                lower_factor: params.lower_factor,
                upper_factor: params.upper_factor,
            });
        }

        Ok(Self::assemble(bounds, params))
    }

    fn assemble(bounds: &Bounds, params: &FeeCurveParams) -> PiecewiseCurve {
        let (soft_lower, soft_upper) = bounds.soft();
        let (hard_lower, hard_upper) = bounds.hard();

        let seg1 = if hard_lower == soft_lower {
            Line::flat(soft_lower, params.lower_factor)
        } else {
            Line::between(hard_lower, params.hard_lower_factor, soft_lower, params.lower_factor)
        };

        let seg2 = if soft_lower == soft_upper {
            Line::flat(soft_lower, params.lower_factor)
        } else {
            Line::between(soft_lower, params.lower_factor, soft_upper, params.upper_factor)
        };

        let seg3 = if soft_upper == hard_upper {
            Line::flat(soft_upper, params.upper_factor)
        } else {
            Line::between(soft_upper, params.upper_factor, hard_upper, params.hard_upper_factor)
        };

        PiecewiseCurve::new(seg1, seg2, seg3, bounds.breakpoints())
    }

    /// Average factor of `curve` between two asset ratios, in either order
    pub fn fee_factor_for_range(
        curve: &PiecewiseCurve,
        ar_from: Decimal,
        ar_to: Decimal,
    ) -> Result<Decimal, CurveError> {
        let lo = ar_from.min(ar_to);
        let hi = ar_from.max(ar_to);
        curve.average(lo, hi)
    }

    /// Average factor for a trade in `direction` moving the ratio from `ar_from` to `ar_to`
    pub fn fee_factor(
        &self,
        direction: SwapDirection,
        ar_from: Decimal,
        ar_to: Decimal,
    ) -> Result<Decimal, CurveError> {
        let factor = Self::fee_factor_for_range(self.curve(direction), ar_from, ar_to)?;
        debug!(?direction, %ar_from, %ar_to, %factor, "fee factor for range");
        Ok(factor)
    }

    /// Curve value at `hard_lower`
    pub fn factor_at_hard_lower(&self, direction: SwapDirection) -> Result<Decimal, CurveError> {
        let [seg1, _, _] = self.curve(direction).segments();
        CurveMath::point_value(seg1, self.bounds.hard_lower)
    }

    /// Curve value at `hard_upper`
    pub fn factor_at_hard_upper(&self, direction: SwapDirection) -> Result<Decimal, CurveError> {
        let [_, _, seg3] = self.curve(direction).segments();
        CurveMath::point_value(seg3, self.bounds.hard_upper)
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn params(&self, direction: SwapDirection) -> &FeeCurveParams {
        match direction {
            SwapDirection::ToStable => &self.to_stable,
            SwapDirection::ToPerp => &self.to_perp,
        }
    }

    pub fn curve(&self, direction: SwapDirection) -> &PiecewiseCurve {
        match direction {
            SwapDirection::ToStable => &self.to_stable_curve,
            SwapDirection::ToPerp => &self.to_perp_curve,
        }
    }

    /// Replace both bound pairs, rebuilding both curves
    pub fn update_bounds(
        &mut self,
        soft: (Decimal, Decimal),
        hard: (Decimal, Decimal),
    ) -> Result<(), CurveError> {
        let bounds = Bounds::new(soft, hard)?;
        *self = Self::new(bounds, self.to_stable, self.to_perp)?;
        info!(?soft, ?hard, "bounds updated");
        Ok(())
    }

    /// Replace the soft-bound factors of one direction
    pub fn update_fee_curve(
        &mut self,
        direction: SwapDirection,
        lower_factor: Decimal,
        upper_factor: Decimal,
    ) -> Result<(), CurveError> {
        let params = FeeCurveParams {
            lower_factor,
            upper_factor,
            ..*self.params(direction)
        };
        self.replace_params(direction, params)?;
        info!(?direction, %lower_factor, %upper_factor, "fee curve updated");
        Ok(())
    }

    /// Replace the hard-bound factors of one direction
    pub fn update_fee_curve_extremes(
        &mut self,
        direction: SwapDirection,
        hard_lower_factor: Decimal,
        hard_upper_factor: Decimal,
    ) -> Result<(), CurveError> {
        let params = FeeCurveParams {
            hard_lower_factor,
            hard_upper_factor,
            ..*self.params(direction)
        };
        self.replace_params(direction, params)?;
        info!(?direction, %hard_lower_factor, %hard_upper_factor, "fee curve extremes updated");
        Ok(())
    }

    fn replace_params(
        &mut self,
        direction: SwapDirection,
        params: FeeCurveParams,
    ) -> Result<(), CurveError> {
        let curve = Self::build_curve(&self.bounds, &params)?;
        match direction {
            SwapDirection::ToStable => {
                self.to_stable = params;
                self.to_stable_curve = curve;
            }
            SwapDirection::ToPerp => {
                self.to_perp = params;
                self.to_perp_curve = curve;
            }
        }
        Ok(())
    }
}

impl Default for FeeCurveModel {
    fn default() -> Self {
        let bounds = Bounds::default();
        let flat = FeeCurveParams::default();
        let curve = Self::assemble(&bounds, &flat);

        Self {
            bounds,
            to_stable: flat,
            to_perp: flat,
            to_stable_curve: curve,
            to_perp_curve: curve,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed() -> FeeCurveParams {
        FeeCurveParams {
            lower_factor: dec!(0.99),
            upper_factor: dec!(0.99),
            hard_lower_factor: dec!(1.01),
            hard_upper_factor: dec!(0.9),
        }
    }

    fn model() -> FeeCurveModel {
        FeeCurveModel::new(Bounds::default(), skewed(), FeeCurveParams::flat(dec!(0.997))).unwrap()
    }

    #[test]
    fn test_bounds_must_nest() {
        assert!(Bounds::new((dec!(0.75), dec!(1.25)), (dec!(0.5), dec!(2))).is_ok());
        assert!(Bounds::new((dec!(1), dec!(1)), (dec!(1), dec!(1))).is_ok());

        for (soft, hard) in [
            ((dec!(0.4), dec!(1.25)), (dec!(0.5), dec!(2))),
            ((dec!(0.75), dec!(2.5)), (dec!(0.5), dec!(2))),
            ((dec!(1.25), dec!(0.75)), (dec!(0.5), dec!(2))),
            ((dec!(0.75), dec!(1.25)), (dec!(-0.5), dec!(2))),
        ] {
            assert!(matches!(
                Bounds::new(soft, hard),
                Err(CurveError::InvalidBounds { .. })
            ));
        }
    }

    #[test]
    fn test_flat_middle_range_returns_lower_factor() {
        let factor = model()
            .fee_factor(SwapDirection::ToStable, dec!(0.76), dec!(1.24))
            .unwrap();
        assert_eq!(factor, dec!(0.99));
    }

    #[test]
    fn test_direction_of_travel_does_not_change_factor() {
        let model = model();
        let up = model.fee_factor(SwapDirection::ToStable, dec!(1.1), dec!(1.5)).unwrap();
        let down = model.fee_factor(SwapDirection::ToStable, dec!(1.5), dec!(1.1)).unwrap();
        assert_eq!(up, down);
    }

    #[test]
    fn test_curve_is_continuous_at_soft_bounds() {
        let curve = FeeCurveModel::build_curve(&Bounds::default(), &skewed()).unwrap();
        let [seg1, seg2, seg3] = curve.segments();
        assert_eq!(
            CurveMath::point_value(seg1, dec!(0.75)).unwrap(),
            CurveMath::point_value(seg2, dec!(0.75)).unwrap()
        );
        assert_eq!(
            CurveMath::point_value(seg2, dec!(1.25)).unwrap(),
            CurveMath::point_value(seg3, dec!(1.25)).unwrap()
        );
    }

    #[test]
    fn test_outer_segment_average() {
        // seg3 runs 0.99 @ 1.25 -> 0.9 @ 2.0; over [1.25, 2.0] it averages 0.945
        let factor = model()
            .fee_factor(SwapDirection::ToStable, dec!(1.25), dec!(2.0))
            .unwrap();
        assert_eq!(factor, dec!(0.945));
    }

    #[test]
    fn test_extreme_factors() {
        let model = model();
        assert_eq!(model.factor_at_hard_lower(SwapDirection::ToStable).unwrap(), dec!(1.01));
        assert_eq!(model.factor_at_hard_upper(SwapDirection::ToStable).unwrap(), dec!(0.9));
        assert_eq!(model.factor_at_hard_upper(SwapDirection::ToPerp).unwrap(), dec!(0.997));
    }

    #[test]
    fn test_collapsed_outer_segment_uses_soft_factor() {
        let bounds = Bounds::new((dec!(0.5), dec!(1.5)), (dec!(0.5), dec!(2))).unwrap();
        let model = FeeCurveModel::new(bounds, skewed(), skewed()).unwrap();
        assert_eq!(model.factor_at_hard_lower(SwapDirection::ToPerp).unwrap(), dec!(0.99));
    }

    #[test]
    fn test_collapsed_soft_bounds_need_equal_factors() {
        let bounds = Bounds::new((dec!(1), dec!(1)), (dec!(0.5), dec!(2))).unwrap();
        let split = FeeCurveParams {
            lower_factor: dec!(0.99),
            upper_factor: dec!(0.95),
            ..skewed()
        };
        assert_eq!(
            FeeCurveModel::build_curve(&bounds, &split).unwrap_err(),
            CurveError::CollapsedSoftBounds {
                at: dec!(1),
                lower_factor: dec!(0.99),
                upper_factor: dec!(0.95),
            }
        );

        // Equal factors meet at the single breakpoint from both sides
        let curve = FeeCurveModel::build_curve(&bounds, &skewed()).unwrap();
        let [seg1, seg2, seg3] = curve.segments();
        let at = |seg: &Line| CurveMath::point_value(seg, dec!(1)).unwrap();
        assert_eq!(at(seg1), at(seg2));
        assert_eq!(at(seg2), at(seg3));
    }

    #[test]
    fn test_collapsing_bounds_update_keeps_previous() {
        let mut model = FeeCurveModel::new(
            Bounds::default(),
            FeeCurveParams {
                upper_factor: dec!(0.95),
                ..skewed()
            },
            skewed(),
        )
        .unwrap();
        let before = model.clone();
        let err = model
            .update_bounds((dec!(1), dec!(1)), (dec!(0.5), dec!(2)))
            .unwrap_err();
        assert!(matches!(err, CurveError::CollapsedSoftBounds { .. }));
        assert_eq!(model, before);
    }

    #[test]
    fn test_steep_segment_overflow_is_an_error() {
        // seg3 drops 0.09 over 0.0001 of ratio
        let bounds = Bounds::new((dec!(0.75), dec!(1.25)), (dec!(0.5), dec!(1.2501))).unwrap();
        let model = FeeCurveModel::new(bounds, skewed(), skewed()).unwrap();
        let result = model.fee_factor(SwapDirection::ToStable, dec!(1.2501), Decimal::MAX);
        assert!(matches!(result, Err(CurveError::MathOverflow { .. })));
    }

    #[test]
    fn test_factor_out_of_range_rejected() {
        let mut model = model();
        let before = model.clone();

        let err = model
            .update_fee_curve(SwapDirection::ToPerp, dec!(-0.1), dec!(1))
            .unwrap_err();
        assert!(matches!(err, CurveError::InvalidPerc { name: "lower_factor", .. }));

        let err = model
            .update_fee_curve_extremes(SwapDirection::ToPerp, dec!(1), dec!(2.5))
            .unwrap_err();
        assert!(matches!(err, CurveError::InvalidPerc { name: "hard_upper_factor", .. }));

        assert_eq!(model, before);
    }

    #[test]
    fn test_update_bounds_rebuilds_both_curves() {
        let mut model = model();
        model
            .update_bounds((dec!(0.9), dec!(1.1)), (dec!(0.8), dec!(1.2)))
            .unwrap();
        assert_eq!(model.bounds().soft(), (dec!(0.9), dec!(1.1)));
        assert_eq!(model.curve(SwapDirection::ToPerp).breakpoints().upper(), dec!(1.1));
        assert_eq!(model.factor_at_hard_upper(SwapDirection::ToStable).unwrap(), dec!(0.9));
    }

    #[test]
    fn test_bad_bounds_update_keeps_previous() {
        let mut model = model();
        let before = model.clone();
        assert!(model
            .update_bounds((dec!(1.1), dec!(0.9)), (dec!(0.8), dec!(1.2)))
            .is_err());
        assert_eq!(model, before);
    }

    #[test]
    fn test_update_fee_curve_keeps_extremes() {
        let mut model = model();
        model
            .update_fee_curve(SwapDirection::ToStable, dec!(1), dec!(0.98))
            .unwrap();
        let params = model.params(SwapDirection::ToStable);
        assert_eq!(params.lower_factor, dec!(1));
        assert_eq!(params.upper_factor, dec!(0.98));
        assert_eq!(params.hard_upper_factor, dec!(0.9));
    }

    #[test]
    fn test_bounds_deserialize_validates() {
        let ok: Bounds = serde_json::from_str(
            r#"{"soft_lower":"0.8","soft_upper":"1.2","hard_lower":"0.6","hard_upper":"1.6"}"#,
        )
        .unwrap();
        assert_eq!(ok.hard(), (dec!(0.6), dec!(1.6)));

        let bad = serde_json::from_str::<Bounds>(
            r#"{"soft_lower":"0.5","soft_upper":"1.2","hard_lower":"0.6","hard_upper":"1.6"}"#,
        );
        assert!(bad.is_err());
    }
}
