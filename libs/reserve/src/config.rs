//! Owner-set broker parameters
//!
//! Every setter re-validates before writing, so a rejected update leaves the
//! running configuration unchanged.

use crate::error::ReserveError;
use crate::state::Asset;
use rust_decimal::Decimal;
use skew_curve::{Bounds, CurveError, FeeCurveModel, SwapDirection};
use tracing::info;

/// Largest supported decimal precision for any amount
pub const MAX_DECIMALS: u32 = 18;

/// Fee model, protocol share and amount precision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReserveConfig {
    fee_model: FeeCurveModel,
    protocol_share: Decimal,
    stable_decimals: u32,
    perp_decimals: u32,
    share_decimals: u32,
}

impl ReserveConfig {
    pub fn new(fee_model: FeeCurveModel, protocol_share: Decimal) -> Result<Self, ReserveError> {
        check_share(protocol_share)?;
        Ok(Self {
            fee_model,
            protocol_share,
            ..Self::default()
        })
    }

    /// Set the rounding precision of each amount kind
    pub fn with_decimals(
        self,
        stable_decimals: u32,
        perp_decimals: u32,
        share_decimals: u32,
    ) -> Result<Self, ReserveError> {
        check_decimals("stable_decimals", stable_decimals)?;
        check_decimals("perp_decimals", perp_decimals)?;
        check_decimals("share_decimals", share_decimals)?;

        Ok(Self {
            stable_decimals,
            perp_decimals,
            share_decimals,
            ..self
        })
    }

    pub fn fee_model(&self) -> &FeeCurveModel {
        &self.fee_model
    }

    pub fn bounds(&self) -> &Bounds {
        self.fee_model.bounds()
    }

    pub fn protocol_share(&self) -> Decimal {
        self.protocol_share
    }

    pub fn decimals(&self, asset: Asset) -> u32 {
        match asset {
            Asset::Stable => self.stable_decimals,
            Asset::Perp => self.perp_decimals,
        }
    }

    pub fn share_decimals(&self) -> u32 {
        self.share_decimals
    }

    pub fn update_bounds(
        &mut self,
        soft: (Decimal, Decimal),
        hard: (Decimal, Decimal),
    ) -> Result<(), ReserveError> {
        Ok(self.fee_model.update_bounds(soft, hard)?)
    }

    pub fn update_fee_curve(
        &mut self,
        direction: SwapDirection,
        lower_factor: Decimal,
        upper_factor: Decimal,
    ) -> Result<(), ReserveError> {
        Ok(self
            .fee_model
            .update_fee_curve(direction, lower_factor, upper_factor)?)
    }

    pub fn update_fee_curve_extremes(
        &mut self,
        direction: SwapDirection,
        hard_lower_factor: Decimal,
        hard_upper_factor: Decimal,
    ) -> Result<(), ReserveError> {
        Ok(self
            .fee_model
            .update_fee_curve_extremes(direction, hard_lower_factor, hard_upper_factor)?)
    }

    /// Fraction of each collected fee routed to the protocol, in `[0, 1]`
    pub fn update_protocol_share(&mut self, share: Decimal) -> Result<(), ReserveError> {
        check_share(share)?;
        self.protocol_share = share;
        info!(%share, "protocol share updated");
        Ok(())
    }
}

impl Default for ReserveConfig {
    fn default() -> Self {
        Self {
            fee_model: FeeCurveModel::default(),
            protocol_share: Decimal::ZERO,
            stable_decimals: 6,
            perp_decimals: 8,
            share_decimals: 18,
        }
    }
}

fn check_share(share: Decimal) -> Result<(), ReserveError> {
    if share < Decimal::ZERO || share > Decimal::ONE {
        return Err(CurveError::InvalidPerc {
            name: "protocol_share",
            value: share,
            min: Decimal::ZERO,
            max: Decimal::ONE,
        }
        .into());
    }
    Ok(())
}

fn check_decimals(name: &'static str, decimals: u32) -> Result<(), ReserveError> {
    if decimals > MAX_DECIMALS {
        return Err(ReserveError::InvalidDecimals {
            name,
            decimals,
            max: MAX_DECIMALS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_protocol_share_range() {
        let mut config = ReserveConfig::default();
        config.update_protocol_share(dec!(0.25)).unwrap();
        assert_eq!(config.protocol_share(), dec!(0.25));

        let err = config.update_protocol_share(dec!(1.01)).unwrap_err();
        assert!(matches!(
            err,
            ReserveError::Curve(CurveError::InvalidPerc { name: "protocol_share", .. })
        ));
        assert_eq!(config.protocol_share(), dec!(0.25));

        assert!(ReserveConfig::new(FeeCurveModel::default(), dec!(-0.1)).is_err());
    }

    #[test]
    fn test_decimals_validated() {
        let config = ReserveConfig::default().with_decimals(2, 4, 6).unwrap();
        assert_eq!(config.decimals(Asset::Stable), 2);
        assert_eq!(config.decimals(Asset::Perp), 4);
        assert_eq!(config.share_decimals(), 6);

        assert_eq!(
            ReserveConfig::default().with_decimals(6, 19, 18).unwrap_err(),
            ReserveError::InvalidDecimals {
                name: "perp_decimals",
                decimals: 19,
                max: MAX_DECIMALS
            }
        );
    }

    #[test]
    fn test_bound_updates_pass_through() {
        let mut config = ReserveConfig::default();
        config
            .update_bounds((dec!(0.9), dec!(1.1)), (dec!(0.5), dec!(3)))
            .unwrap();
        assert_eq!(config.bounds().hard(), (dec!(0.5), dec!(3)));

        let err = config
            .update_bounds((dec!(0.4), dec!(1.1)), (dec!(0.5), dec!(3)))
            .unwrap_err();
        assert!(matches!(err, ReserveError::Curve(CurveError::InvalidBounds { .. })));
        assert_eq!(config.bounds().soft(), (dec!(0.9), dec!(1.1)));
    }
}
