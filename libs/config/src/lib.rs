//! # Skew Broker Configuration
//!
//! Loads the broker's owner parameters and turns them into the validated
//! `skew_reserve::ReserveConfig` the accounting core runs on.
//!
//! ## Sources (later wins)
//!
//! - **Base file**: `config/broker.toml` unless a path is given, required
//! - **Environment overlay**: `environments/<name>.toml` beside the base file
//! - **Environment variables**: `SKEW_` prefix, `__` between nested keys
//!
//! ## Usage
//!
//! ```rust,no_run
//! use skew_config::{load_broker_config, BrokerSettings};
//!
//! // Validated accounting configuration
//! let reserve_config = load_broker_config(Some("staging"))?;
//!
//! // Raw settings, e.g. for asset symbols
//! let settings = BrokerSettings::load(None, None)?;
//! println!("{}", settings.assets.perp.symbol);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod settings;

pub use settings::{
    environment_overlay_path, load_broker_config, AssetSettings, AssetSpec, BrokerSettings,
    FeeCurveSettings, DEFAULT_CONFIG_PATH, ENV_PREFIX,
};
