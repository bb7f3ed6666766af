//! Reserve balances, price inputs and the asset ratio they imply

use crate::error::ReserveError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use skew_curve::SwapDirection;
use std::fmt;

/// The two assets the broker holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// Stable reference asset
    Stable,
    /// Volatile perp asset
    Perp,
}

impl Asset {
    pub fn other(self) -> Self {
        match self {
            Self::Stable => Self::Perp,
            Self::Perp => Self::Stable,
        }
    }

    /// `(asset_in, asset_out)` for a swap in `direction`
    pub fn swap_legs(direction: SwapDirection) -> (Self, Self) {
        match direction {
            SwapDirection::ToStable => (Self::Perp, Self::Stable),
            SwapDirection::ToPerp => (Self::Stable, Self::Perp),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable => write!(f, "stable"),
            Self::Perp => write!(f, "perp"),
        }
    }
}

/// Stable-side value over perp-side value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AssetRatio {
    Finite(Decimal),
    /// Perp side is empty, stable side is not
    Infinite,
    /// Both sides are empty
    Empty,
}

impl fmt::Display for AssetRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(ratio) => write!(f, "{ratio}"),
            Self::Infinite => write!(f, "inf"),
            Self::Empty => write!(f, "empty"),
        }
    }
}

/// Reserve balances plus the prices they are valued at
///
/// Balances are in asset units, prices in a common quote unit per asset unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReserveState {
    stable_balance: Decimal,
    perp_balance: Decimal,
    stable_price: Decimal,
    perp_price: Decimal,
}

impl ReserveState {
    pub fn new(
        stable_balance: Decimal,
        perp_balance: Decimal,
        stable_price: Decimal,
        perp_price: Decimal,
    ) -> Result<Self, ReserveError> {
        check_balance(Asset::Stable, stable_balance)?;
        check_balance(Asset::Perp, perp_balance)?;

        Self {
            stable_balance,
            perp_balance,
            stable_price: Decimal::ONE,
            perp_price: Decimal::ONE,
        }
        .with_prices(stable_price, perp_price)
    }

    /// Empty reserve valued at unit prices
    pub fn empty() -> Self {
        Self {
            stable_balance: Decimal::ZERO,
            perp_balance: Decimal::ZERO,
            stable_price: Decimal::ONE,
            perp_price: Decimal::ONE,
        }
    }

    /// Same balances revalued at fresh prices
    pub fn with_prices(self, stable_price: Decimal, perp_price: Decimal) -> Result<Self, ReserveError> {
        check_price(Asset::Stable, stable_price)?;
        check_price(Asset::Perp, perp_price)?;

        Ok(Self {
            stable_price,
            perp_price,
            ..self
        })
    }

    pub fn balance(&self, asset: Asset) -> Decimal {
        match asset {
            Asset::Stable => self.stable_balance,
            Asset::Perp => self.perp_balance,
        }
    }

    pub fn price(&self, asset: Asset) -> Decimal {
        match asset {
            Asset::Stable => self.stable_price,
            Asset::Perp => self.perp_price,
        }
    }

    /// Quote-unit value held on one side
    pub fn value(&self, asset: Asset) -> Result<Decimal, ReserveError> {
        self.balance(asset)
            .checked_mul(self.price(asset))
            .ok_or(ReserveError::MathOverflow)
    }

    pub fn is_empty(&self) -> bool {
        self.stable_balance.is_zero() && self.perp_balance.is_zero()
    }

    /// Stable value divided by perp value
    pub fn asset_ratio(&self) -> Result<AssetRatio, ReserveError> {
        let stable_value = self.value(Asset::Stable)?;
        let perp_value = self.value(Asset::Perp)?;

        if stable_value.is_zero() && perp_value.is_zero() {
            return Ok(AssetRatio::Empty);
        }
        if perp_value.is_zero() {
            return Ok(AssetRatio::Infinite);
        }

        stable_value
            .checked_div(perp_value)
            .map(AssetRatio::Finite)
            .ok_or(ReserveError::MathOverflow)
    }

    /// Balance moved by a signed delta, rejecting results below zero
    pub fn with_delta(self, asset: Asset, delta: Decimal) -> Result<Self, ReserveError> {
        let current = self.balance(asset);
        let updated = current.checked_add(delta).ok_or(ReserveError::MathOverflow)?;
        if updated < Decimal::ZERO {
            return Err(ReserveError::InsufficientReserve {
                asset,
                requested: -delta,
                available: current,
            });
        }

        let mut next = self;
        match asset {
            Asset::Stable => next.stable_balance = updated,
            Asset::Perp => next.perp_balance = updated,
        }
        Ok(next)
    }
}

fn check_balance(asset: Asset, balance: Decimal) -> Result<(), ReserveError> {
    if balance < Decimal::ZERO {
        return Err(ReserveError::NegativeBalance { asset, balance });
    }
    Ok(())
}

fn check_price(asset: Asset, price: Decimal) -> Result<(), ReserveError> {
    if price <= Decimal::ZERO {
        return Err(ReserveError::InvalidPrice { asset, price });
    }
    Ok(())
}
