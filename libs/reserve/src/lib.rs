//! # Skew Reserve - Two-Asset Reserve Accounting
//!
//! ## Purpose
//!
//! Sizes every balance-changing operation of the broker: share mints against
//! a deposit, pro-rata redemptions, and fee-adjusted swaps between the stable
//! and perp sides. The reserve's asset ratio (stable value / perp value at
//! feed prices) drives the swap fee through `skew-curve`.
//!
//! ## Integration Points
//!
//! - **Input Sources**: balances and feed prices as a `ReserveState`,
//!   owner parameters as a `ReserveConfig`
//! - **Output Destinations**: `MintQuote`, `RedeemQuote` and `SwapQuote`
//!   consumed by the broker service, which settles them and then commits the
//!   matching `ReserveAccounting::apply_*` state
//! - **Rounding**: toward zero at each asset's configured precision
//!
//! ## Architecture Role
//!
//! ```text
//! PriceFeed --> ReserveState --asset_ratio--> AssetRatio
//!                    |
//!                    v
//! ReserveConfig --> ReserveAccounting::compute_* --> quotes --> settlement
//!  (FeeCurveModel)        |
//!                         v
//!                 ReserveAccounting::apply_* --> next ReserveState
//! ```

pub mod accounting;
pub mod config;
pub mod error;
pub mod state;

pub use accounting::{MintQuote, RedeemQuote, ReserveAccounting, SwapQuote};
pub use config::{ReserveConfig, MAX_DECIMALS};
pub use error::ReserveError;
pub use state::{Asset, AssetRatio, ReserveState};
