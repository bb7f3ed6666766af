//! Error types for curve construction and range queries

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while building fee curves or averaging them over a range
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CurveError {
    /// Query range is reversed
    #[error("Invalid range: lower end {lo} exceeds upper end {hi}")]
    InvalidRange { lo: Decimal, hi: Decimal },

    /// Query range would have to blend all three segments
    #[error("Range [{lo}, {hi}] spans both breakpoints {bp_lower} and {bp_upper}")]
    UnexpectedRangeDelta {
        lo: Decimal,
        hi: Decimal,
        bp_lower: Decimal,
        bp_upper: Decimal,
    },

    /// Zero-width line whose endpoints disagree, slope is undefined
    #[error("Zero-width line at x = {x} spans distinct values {y1} and {y2}")]
    DegenerateLine { x: Decimal, y1: Decimal, y2: Decimal },

    /// Breakpoints given upper-first
    #[error("Breakpoints out of order: lower {lower} exceeds upper {upper}")]
    InvalidBreakpoints { lower: Decimal, upper: Decimal },

    /// Factor or share outside its accepted interval
    #[error("{name} = {value} is outside the accepted range [{min}, {max}]")]
    InvalidPerc {
        name: &'static str,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },

    /// Hard bound does not contain the soft bound
    #[error(
        "Bounds not nested: hard [{hard_lower}, {hard_upper}] must contain soft [{soft_lower}, {soft_upper}]"
    )]
    InvalidBounds {
        soft_lower: Decimal,
        soft_upper: Decimal,
        hard_lower: Decimal,
        hard_upper: Decimal,
    },

    /// Soft bounds coincide but the factors on either side of them differ
    #[error(
        "Soft bounds collapse at {at} with distinct factors {lower_factor} and {upper_factor}"
    )]
    CollapsedSoftBounds {
        at: Decimal,
        lower_factor: Decimal,
        upper_factor: Decimal,
    },

    /// Decimal arithmetic left the representable range
    #[error("Arithmetic overflow evaluating curve at x = {x}")]
    MathOverflow { x: Decimal },
}
