//! Error types for reserve accounting

use crate::state::Asset;
use rust_decimal::Decimal;
use skew_curve::CurveError;
use thiserror::Error;

/// Errors raised while sizing mints, redemptions and swaps
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReserveError {
    /// Curve construction or range averaging failed
    #[error(transparent)]
    Curve(#[from] CurveError),

    /// Swap is well-formed but its result is not allowed
    #[error("Unacceptable swap: {reason}")]
    UnacceptableSwap { reason: String },

    /// Shares redeemed against a reserve that has never been minted into
    #[error("Cannot redeem: share supply is zero")]
    ZeroSupply,

    #[error("Insufficient share supply: requested {requested}, outstanding {available}")]
    InsufficientSupply { requested: Decimal, available: Decimal },

    #[error("Insufficient {asset} reserve: requested {requested}, available {available}")]
    InsufficientReserve {
        asset: Asset,
        requested: Decimal,
        available: Decimal,
    },

    /// Shares are outstanding but both reserve sides are empty
    #[error("Reserve is empty while {supply} shares are outstanding")]
    EmptyReserve { supply: Decimal },

    #[error("Invalid {asset} price {price}: prices must be positive")]
    InvalidPrice { asset: Asset, price: Decimal },

    #[error("Amount {amount} is negative")]
    NegativeAmount { amount: Decimal },

    #[error("{asset} balance {balance} is negative")]
    NegativeBalance { asset: Asset, balance: Decimal },

    #[error("{name} = {decimals} exceeds the supported maximum of {max}")]
    InvalidDecimals {
        name: &'static str,
        decimals: u32,
        max: u32,
    },

    #[error("Math overflow in reserve calculation")]
    MathOverflow,
}
