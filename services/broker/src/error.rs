//! Error types for broker operations

use crate::settlement::SettlementError;
use rust_decimal::Decimal;
use skew_reserve::{Asset, ReserveError};
use thiserror::Error;

/// Result type alias for broker operations
pub type Result<T> = std::result::Result<T, BrokerError>;

/// Main error type for broker operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// Sizing or configuration rejected by the accounting core
    #[error(transparent)]
    Reserve(#[from] ReserveError),

    /// Feed reading flagged invalid or not strictly positive
    #[error("Unreliable {asset} price reading {price}")]
    UnreliablePrice {
        /// Asset whose reading was rejected
        asset: Asset,
        /// The rejected price
        price: Decimal,
    },

    /// Computed output fell below the caller's minimum
    #[error("Slippage exceeded: {expected} below minimum {minimum}")]
    SlippageExceeded {
        /// Output the broker would have delivered
        expected: Decimal,
        /// Minimum the caller accepts
        minimum: Decimal,
    },

    /// Mutation requested with nothing to move
    #[error("Amount must be non-zero")]
    ZeroAmount,

    /// Settlement refused the transfer plan
    #[error(transparent)]
    Settlement(#[from] SettlementError),
}
