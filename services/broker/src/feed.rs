//! Price feed contract
//!
//! Readings carry their own validity flag. The broker refuses to price
//! anything off an invalid or non-positive reading and never falls back to
//! an earlier value.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use skew_reserve::Asset;

/// One price observation in the common quote unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceReading {
    pub price: Decimal,
    pub valid: bool,
}

impl PriceReading {
    pub fn valid(price: Decimal) -> Self {
        Self { price, valid: true }
    }

    pub fn invalid(price: Decimal) -> Self {
        Self { price, valid: false }
    }

    /// Usable for pricing: flagged valid and strictly positive
    pub fn is_usable(&self) -> bool {
        self.valid && self.price > Decimal::ZERO
    }
}

/// Source of current asset prices
pub trait PriceFeed {
    fn price(&self, asset: Asset) -> PriceReading;
}

/// Feed holding one settable reading per asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPriceFeed {
    stable: PriceReading,
    perp: PriceReading,
}

impl StaticPriceFeed {
    pub fn new(stable_price: Decimal, perp_price: Decimal) -> Self {
        Self {
            stable: PriceReading::valid(stable_price),
            perp: PriceReading::valid(perp_price),
        }
    }

    pub fn set_reading(&mut self, asset: Asset, reading: PriceReading) {
        match asset {
            Asset::Stable => self.stable = reading,
            Asset::Perp => self.perp = reading,
        }
    }

    pub fn set_price(&mut self, asset: Asset, price: Decimal) {
        self.set_reading(asset, PriceReading::valid(price));
    }

    /// Keep the last price but flag it unreliable
    pub fn invalidate(&mut self, asset: Asset) {
        let price = self.price(asset).price;
        self.set_reading(asset, PriceReading::invalid(price));
    }
}

impl PriceFeed for StaticPriceFeed {
    fn price(&self, asset: Asset) -> PriceReading {
        match asset {
            Asset::Stable => self.stable,
            Asset::Perp => self.perp,
        }
    }
}
