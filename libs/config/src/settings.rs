//! Broker Settings Module
//!
//! Loads the broker's owner parameters from a TOML file, an optional
//! environment overlay, and `SKEW_` environment variables, then converts
//! them into a validated `ReserveConfig`.
//!
//! Nested keys use a double underscore in environment variables, e.g.
//! `SKEW_BOUNDS__HARD_UPPER=2.5` or `SKEW_FEE_CURVES__TO_PERP__LOWER_FACTOR=0.997`.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use skew_curve::{Bounds, FeeCurveModel, FeeCurveParams};
use skew_reserve::{ReserveConfig, ReserveError};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings file read when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config/broker.toml";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "SKEW";

/// Complete broker settings as written in configuration files
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BrokerSettings {
    /// Rounding precision of minted shares
    #[serde(default = "default_share_decimals")]
    pub share_decimals: u32,

    /// Fraction of each fee routed to the protocol
    #[serde(default)]
    pub protocol_share: Decimal,

    #[serde(default)]
    pub assets: AssetSettings,

    /// Validated as it is read; a `[bounds]` table must end up with all
    /// four keys once every source is merged
    #[serde(default)]
    pub bounds: Bounds,

    #[serde(default)]
    pub fee_curves: FeeCurveSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AssetSettings {
    #[serde(default = "AssetSpec::stable")]
    pub stable: AssetSpec,
    #[serde(default = "AssetSpec::perp")]
    pub perp: AssetSpec,
}

/// Display symbol and amount precision of one asset
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AssetSpec {
    pub symbol: String,
    pub decimals: u32,
}

impl AssetSpec {
    fn stable() -> Self {
        Self {
            symbol: "USD".to_string(),
            decimals: 6,
        }
    }

    fn perp() -> Self {
        Self {
            symbol: "PERP".to_string(),
            decimals: 8,
        }
    }
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            stable: AssetSpec::stable(),
            perp: AssetSpec::perp(),
        }
    }
}

/// Factor schedule for each swap direction
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct FeeCurveSettings {
    pub to_stable: FeeCurveParams,
    pub to_perp: FeeCurveParams,
}

fn default_share_decimals() -> u32 {
    18
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            share_decimals: default_share_decimals(),
            protocol_share: Decimal::ZERO,
            assets: AssetSettings::default(),
            bounds: Bounds::default(),
            fee_curves: FeeCurveSettings::default(),
        }
    }
}

impl BrokerSettings {
    /// Load settings from files with environment overrides
    ///
    /// `environment` selects `environments/<name>.toml` next to the base
    /// file; a missing overlay is logged and skipped.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        Self::load_with_prefix(base_path, environment, ENV_PREFIX)
    }

    fn load_with_prefix(
        base_path: Option<&Path>,
        environment: Option<&str>,
        prefix: &str,
    ) -> Result<Self> {
        let base = base_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

        let mut builder = Config::builder().add_source(File::from(base).required(true));

        if let Some(env) = environment {
            let env_file = environment_overlay_path(base, env);
            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .with_context(|| format!("Failed to build configuration from {}", base.display()))?;

        config
            .try_deserialize()
            .context("Failed to deserialize broker settings")
    }

    /// Validated accounting configuration for these settings
    pub fn to_reserve_config(&self) -> Result<ReserveConfig, ReserveError> {
        let fee_model =
            FeeCurveModel::new(self.bounds, self.fee_curves.to_stable, self.fee_curves.to_perp)?;

        ReserveConfig::new(fee_model, self.protocol_share)?.with_decimals(
            self.assets.stable.decimals,
            self.assets.perp.decimals,
            self.share_decimals,
        )
    }

    /// Render as TOML, e.g. to seed a new configuration file
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize broker settings")
    }
}

/// Load settings from the default location and convert them
pub fn load_broker_config(environment: Option<&str>) -> Result<ReserveConfig> {
    let settings = BrokerSettings::load(None, environment)?;
    let reserve_config = settings
        .to_reserve_config()
        .context("Invalid broker settings")?;

    info!(
        stable = %settings.assets.stable.symbol,
        perp = %settings.assets.perp.symbol,
        protocol_share = %settings.protocol_share,
        "Broker configuration loaded"
    );
    Ok(reserve_config)
}

/// Overlay path for `environment` next to `base`
pub fn environment_overlay_path(base: &Path, environment: &str) -> PathBuf {
    base.parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
        .join("environments")
        .join(format!("{environment}.toml"))
}
