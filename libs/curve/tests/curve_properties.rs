//! Fee Curve Property Tests
//!
//! Structural properties of the piecewise fee curve that must hold for every
//! valid bound and factor configuration.

use proptest::prelude::*;
use skew_curve::{
    Bounds, CurveError, CurveMath, FeeCurveModel, FeeCurveParams, SwapDirection,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Factor in [0, 2] with four decimal places
fn factor() -> impl Strategy<Value = Decimal> {
    (0i64..=20_000).prop_map(|raw| Decimal::new(raw, 4))
}

fn params() -> impl Strategy<Value = FeeCurveParams> {
    (factor(), factor(), factor(), factor()).prop_map(|(lower, upper, hard_lower, hard_upper)| {
        FeeCurveParams {
            lower_factor: lower,
            upper_factor: upper,
            hard_lower_factor: hard_lower,
            hard_upper_factor: hard_upper,
        }
    })
}

/// Nested bounds from four gaps, three decimal places; `mid` sets the soft width
fn nested_bounds(mid: std::ops::Range<i64>) -> impl Strategy<Value = Bounds> {
    (0i64..1_000, 0i64..1_000, mid, 0i64..1_000).prop_map(|(base, outer_lo, mid, outer_hi)| {
        let hard_lower = Decimal::new(base, 3);
        let soft_lower = hard_lower + Decimal::new(outer_lo, 3);
        let soft_upper = soft_lower + Decimal::new(mid, 3);
        let hard_upper = soft_upper + Decimal::new(outer_hi, 3);
        Bounds::new((soft_lower, soft_upper), (hard_lower, hard_upper))
            .expect("gaps are non-negative")
    })
}

/// Bounds with a soft interval of positive width
fn bounds() -> impl Strategy<Value = Bounds> {
    nested_bounds(1..2_000)
}

/// Bounds whose soft interval may collapse to a point
fn any_bounds() -> impl Strategy<Value = Bounds> {
    prop_oneof![nested_bounds(0..1), nested_bounds(0..2_000)]
}

/// Params that sometimes share one soft factor, so collapsed bounds can build
fn any_params() -> impl Strategy<Value = FeeCurveParams> {
    prop_oneof![
        params(),
        params().prop_map(|p| FeeCurveParams { upper_factor: p.lower_factor, ..p }),
    ]
}

/// Fraction in [0, 1] used to place points inside an interval
fn fraction() -> impl Strategy<Value = Decimal> {
    (0i64..=1_000).prop_map(|raw| Decimal::new(raw, 3))
}

proptest! {
    #[test]
    fn prop_continuous_at_breakpoints(bounds in any_bounds(), params in any_params()) {
        let (soft_lower, soft_upper) = bounds.soft();

        let curve = match FeeCurveModel::build_curve(&bounds, &params) {
            Ok(curve) => curve,
            Err(err) => {
                let collapsed = soft_lower == soft_upper && params.lower_factor != params.upper_factor;
                let is_collapse_error = matches!(err, CurveError::CollapsedSoftBounds { .. });
                prop_assert!(collapsed);
                prop_assert!(is_collapse_error);
                return Ok(());
            }
        };

        let [seg1, seg2, seg3] = curve.segments();
        let at = |seg: &skew_curve::Line, x: Decimal| CurveMath::point_value(seg, x).unwrap();
        prop_assert_eq!(at(seg1, soft_lower), at(seg2, soft_lower));
        prop_assert_eq!(at(seg2, soft_upper), at(seg3, soft_upper));
    }

    #[test]
    fn prop_flat_middle_is_constant(
        bounds in bounds(),
        flat in factor(),
        a in fraction(),
        b in fraction(),
    ) {
        let params = FeeCurveParams { lower_factor: flat, upper_factor: flat, ..FeeCurveParams::default() };
        let model = FeeCurveModel::new(bounds, params, params).unwrap();
        let (soft_lower, soft_upper) = bounds.soft();
        let width = soft_upper - soft_lower;
        let x = soft_lower + width * a;
        let y = soft_lower + width * b;

        prop_assert_eq!(model.fee_factor(SwapDirection::ToPerp, x, y).unwrap(), flat);
    }

    #[test]
    fn prop_zero_width_reads_tie_break_segment(bounds in bounds(), params in params(), t in fraction()) {
        let curve = FeeCurveModel::build_curve(&bounds, &params).unwrap();
        let [seg1, seg2, seg3] = curve.segments();
        let (soft_lower, soft_upper) = bounds.soft();
        let (hard_lower, hard_upper) = bounds.hard();

        let at = |seg: &skew_curve::Line, x: Decimal| CurveMath::point_value(seg, x).unwrap();

        // Both breakpoints read the middle segment
        prop_assert_eq!(curve.average(soft_lower, soft_lower).unwrap(), at(seg2, soft_lower));
        prop_assert_eq!(curve.average(soft_upper, soft_upper).unwrap(), at(seg2, soft_upper));

        let below = hard_lower + (soft_lower - hard_lower) * t;
        if below < soft_lower {
            prop_assert_eq!(curve.average(below, below).unwrap(), at(seg1, below));
        }
        let above = soft_upper + (hard_upper - soft_upper) * t;
        if above > soft_upper {
            prop_assert_eq!(curve.average(above, above).unwrap(), at(seg3, above));
        }
    }

    #[test]
    fn prop_spanning_both_breakpoints_rejected(
        bounds in bounds(),
        params in params(),
        below in 1i64..1_000,
        above in 1i64..1_000,
    ) {
        let curve = FeeCurveModel::build_curve(&bounds, &params).unwrap();
        let (soft_lower, soft_upper) = bounds.soft();
        let lo = soft_lower - Decimal::new(below, 3);
        let hi = soft_upper + Decimal::new(above, 3);

        let is_range_delta = matches!(curve.average(lo, hi), Err(CurveError::UnexpectedRangeDelta { .. }));
        prop_assert!(is_range_delta);
    }

    #[test]
    fn prop_direction_symmetric(bounds in bounds(), params in params(), a in fraction(), b in fraction()) {
        let model = FeeCurveModel::new(bounds, params, params).unwrap();
        let (hard_lower, hard_upper) = bounds.hard();
        let x = hard_lower + (hard_upper - hard_lower) * a;
        let y = hard_lower + (hard_upper - hard_lower) * b;

        let forward = model.fee_factor(SwapDirection::ToStable, x, y);
        let backward = model.fee_factor(SwapDirection::ToStable, y, x);
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn prop_average_within_factor_limits(bounds in bounds(), params in params(), a in fraction(), b in fraction()) {
        let model = FeeCurveModel::new(bounds, params, params).unwrap();
        let (hard_lower, hard_upper) = bounds.hard();
        let x = hard_lower + (hard_upper - hard_lower) * a;
        let y = hard_lower + (hard_upper - hard_lower) * b;

        if let Ok(factor) = model.fee_factor(SwapDirection::ToPerp, x, y) {
            // Tolerance covers the last digit of a 28-digit division
            prop_assert!(factor >= dec!(-0.0000000000000000000001));
            prop_assert!(factor <= dec!(2.0000000000000000000001));
        }
    }
}
