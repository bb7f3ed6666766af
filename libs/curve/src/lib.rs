//! # Skew Curve - Range-Averaged Fee Curves
//!
//! ## Purpose
//!
//! Exact decimal math for the broker's fee schedule. A fee curve maps the
//! reserve's asset ratio (stable value / perp value) to a multiplier on the
//! unfee'd swap output. Trades move the ratio across an interval, so the
//! factor actually charged is the curve's average over that interval, not
//! its value at either end.
//!
//! ## Integration Points
//!
//! - **Input Sources**: bound and factor configuration from `skew-config`,
//!   pre/post-trade asset ratios from `skew-reserve`
//! - **Output Destinations**: swap sizing in `skew-reserve`
//! - **Precision**: `rust_decimal::Decimal` throughout, no floating point
//!
//! ## Architecture Role
//!
//! ```text
//! Line --> CurveMath::point_value / range_average
//!            |
//!            v
//! PiecewiseCurve (3 segments, 2 breakpoints) --> CurveMath::piecewise_average
//!            |
//!            v
//! FeeCurveModel (one curve per SwapDirection, shared Bounds) --> fee_factor
//! ```

pub mod error;
pub mod fee_curve;
pub mod line;
pub mod piecewise;

pub use error::CurveError;
pub use fee_curve::{Bounds, FeeCurveModel, FeeCurveParams, SwapDirection, MAX_FEE_FACTOR};
pub use line::{CurveMath, Line};
pub use piecewise::{Breakpoints, PiecewiseCurve};

/// Common types for curve calculations
pub use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;
