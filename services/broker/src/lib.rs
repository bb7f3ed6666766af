//! # Skew Broker - Imbalance-Priced Two-Asset Broker
//!
//! ## Purpose
//!
//! Orchestration layer over the reserve accounting core. Holds the reserve
//! balances, share supply and accrued protocol fees, reads prices from a
//! `PriceFeed`, and moves funds through a `Settlement` backend. Liquidity
//! providers mint and redeem shares; traders swap between the stable and
//! perp sides at feed prices adjusted by a fee curve over the reserve's
//! asset ratio.
//!
//! ## Integration Points
//!
//! - **Input Sources**: `PriceFeed` readings (validity checked on every use),
//!   `ReserveConfig` from `skew-config` or built directly
//! - **Output Destinations**: one `SettlementPlan` per operation
//! - **Logging**: `tracing` events, see [`telemetry::init_tracing`]
//!
//! ## Architecture Role
//!
//! ```text
//! caller --> Broker::{mint, redeem, swap, collect_protocol_fees}
//!              |  1. PriceFeed::price (stable, perp)
//!              |  2. ReserveAccounting::compute_*   (pure, full result)
//!              |  3. Settlement::settle(plan)        (all legs or none)
//!              v  4. commit ReserveState / supply / fees
//! ```
//!
//! A failure at any step before 4 leaves the broker exactly as it was.

pub mod broker;
pub mod error;
pub mod feed;
pub mod settlement;
pub mod telemetry;

pub use broker::{Broker, ProtocolFees};
pub use error::{BrokerError, Result};
pub use feed::{PriceFeed, PriceReading, StaticPriceFeed};
pub use settlement::{
    AccountId, Holding, InMemoryLedger, Leg, Settlement, SettlementError, SettlementPlan,
};

pub use skew_curve::SwapDirection;
pub use skew_reserve::{Asset, AssetRatio, MintQuote, RedeemQuote, ReserveConfig, SwapQuote};
