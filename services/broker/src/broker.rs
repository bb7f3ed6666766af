//! Broker façade
//!
//! Every mutation follows the same sequence: read prices, size the whole
//! operation against a snapshot, settle the transfers once, then commit the
//! new reserve. Nothing is written before settlement succeeds.

use crate::error::{BrokerError, Result};
use crate::feed::PriceFeed;
use crate::settlement::{AccountId, Settlement, SettlementPlan};
use rust_decimal::Decimal;
use serde::Serialize;
use skew_curve::SwapDirection;
use skew_reserve::{
    Asset, AssetRatio, MintQuote, RedeemQuote, ReserveAccounting, ReserveConfig, ReserveState,
    SwapQuote,
};
use tracing::{info, warn};

/// Protocol fees accrued in custody and not yet collected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProtocolFees {
    pub stable: Decimal,
    pub perp: Decimal,
}

impl ProtocolFees {
    pub fn amount(&self, asset: Asset) -> Decimal {
        match asset {
            Asset::Stable => self.stable,
            Asset::Perp => self.perp,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.stable.is_zero() && self.perp.is_zero()
    }

    fn accrue(&mut self, asset: Asset, amount: Decimal) {
        match asset {
            Asset::Stable => self.stable += amount,
            Asset::Perp => self.perp += amount,
        }
    }
}

/// Two-asset broker over a price feed and a settlement backend
pub struct Broker<F: PriceFeed, S: Settlement> {
    config: ReserveConfig,
    reserve: ReserveState,
    supply: Decimal,
    protocol_fees: ProtocolFees,
    feed: F,
    settlement: S,
}

impl<F: PriceFeed, S: Settlement> Broker<F, S> {
    /// Broker with an empty reserve and no shares outstanding
    pub fn new(config: ReserveConfig, feed: F, settlement: S) -> Self {
        Self {
            config,
            reserve: ReserveState::empty(),
            supply: Decimal::ZERO,
            protocol_fees: ProtocolFees::default(),
            feed,
            settlement,
        }
    }

    pub fn config(&self) -> &ReserveConfig {
        &self.config
    }

    pub fn reserve_balance(&self, asset: Asset) -> Decimal {
        self.reserve.balance(asset)
    }

    pub fn total_supply(&self) -> Decimal {
        self.supply
    }

    pub fn protocol_fees(&self) -> ProtocolFees {
        self.protocol_fees
    }

    pub fn feed(&self) -> &F {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut F {
        &mut self.feed
    }

    pub fn settlement(&self) -> &S {
        &self.settlement
    }

    pub fn settlement_mut(&mut self) -> &mut S {
        &mut self.settlement
    }

    /// Reserve balances valued at current feed prices
    pub fn priced_state(&self) -> Result<ReserveState> {
        let stable_price = self.read_price(Asset::Stable)?;
        let perp_price = self.read_price(Asset::Perp)?;
        Ok(self.reserve.with_prices(stable_price, perp_price)?)
    }

    pub fn asset_ratio(&self) -> Result<AssetRatio> {
        Ok(ReserveAccounting::asset_ratio(&self.priced_state()?)?)
    }

    fn read_price(&self, asset: Asset) -> Result<Decimal> {
        let reading = self.feed.price(asset);
        if !reading.is_usable() {
            warn!(%asset, price = %reading.price, valid = reading.valid, "unreliable price reading");
            return Err(BrokerError::UnreliablePrice {
                asset,
                price: reading.price,
            });
        }
        Ok(reading.price)
    }

    pub fn quote_mint(&self, stable_in: Decimal, perp_in: Decimal) -> Result<MintQuote> {
        let state = self.priced_state()?;
        Ok(ReserveAccounting::compute_mint_amount(
            &self.config,
            &state,
            self.supply,
            stable_in,
            perp_in,
        )?)
    }

    /// Redemption is pro-rata on balances and needs no prices
    pub fn quote_redeem(&self, shares: Decimal) -> Result<RedeemQuote> {
        Ok(ReserveAccounting::compute_redemption_amounts(
            &self.config,
            &self.reserve,
            self.supply,
            shares,
        )?)
    }

    pub fn quote_swap(&self, direction: SwapDirection, amount_in: Decimal) -> Result<SwapQuote> {
        let state = self.priced_state()?;
        Ok(ReserveAccounting::compute_swap_amount(
            &self.config,
            &state,
            direction,
            amount_in,
        )?)
    }

    /// Deposit up to `stable_in` and `perp_in` for at least `min_shares`
    pub fn mint(
        &mut self,
        account: &AccountId,
        stable_in: Decimal,
        perp_in: Decimal,
        min_shares: Decimal,
    ) -> Result<MintQuote> {
        if stable_in.is_zero() && perp_in.is_zero() {
            return Err(BrokerError::ZeroAmount);
        }

        let state = self.priced_state()?;
        let quote = ReserveAccounting::compute_mint_amount(
            &self.config,
            &state,
            self.supply,
            stable_in,
            perp_in,
        )
        .inspect_err(|err| warn!(%err, %account, %stable_in, %perp_in, "mint rejected"))?;

        if quote.shares_out.is_zero() {
            return Err(BrokerError::ZeroAmount);
        }
        check_minimum(quote.shares_out, min_shares)?;

        let next = ReserveAccounting::apply_mint(&state, &quote)?;
        let plan = SettlementPlan::new()
            .deposit(account, Asset::Stable, quote.stable_used)
            .deposit(account, Asset::Perp, quote.perp_used)
            .mint_shares(account, quote.shares_out);
        self.settlement.settle(&plan)?;

        self.reserve = next;
        self.supply += quote.shares_out;
        info!(
            %account,
            shares = %quote.shares_out,
            stable = %quote.stable_used,
            perp = %quote.perp_used,
            supply = %self.supply,
            "mint applied"
        );
        Ok(quote)
    }

    /// Burn `shares` for at least `min_stable` and `min_perp`
    pub fn redeem(
        &mut self,
        account: &AccountId,
        shares: Decimal,
        min_stable: Decimal,
        min_perp: Decimal,
    ) -> Result<RedeemQuote> {
        if shares.is_zero() {
            return Err(BrokerError::ZeroAmount);
        }

        let quote = ReserveAccounting::compute_redemption_amounts(
            &self.config,
            &self.reserve,
            self.supply,
            shares,
        )
        .inspect_err(|err| warn!(%err, %account, %shares, "redemption rejected"))?;

        check_minimum(quote.stable_out, min_stable)?;
        check_minimum(quote.perp_out, min_perp)?;

        let next = ReserveAccounting::apply_redemption(&self.reserve, &quote)?;
        let plan = SettlementPlan::new()
            .burn_shares(account, shares)
            .withdraw(account, Asset::Stable, quote.stable_out)
            .withdraw(account, Asset::Perp, quote.perp_out);
        self.settlement.settle(&plan)?;

        self.reserve = next;
        self.supply -= shares;
        info!(
            %account,
            %shares,
            stable = %quote.stable_out,
            perp = %quote.perp_out,
            supply = %self.supply,
            "redemption applied"
        );
        Ok(quote)
    }

    /// Sell `amount_in` for at least `min_amount_out` of the other asset
    pub fn swap(
        &mut self,
        account: &AccountId,
        direction: SwapDirection,
        amount_in: Decimal,
        min_amount_out: Decimal,
    ) -> Result<SwapQuote> {
        if amount_in.is_zero() {
            return Err(BrokerError::ZeroAmount);
        }

        let state = self.priced_state()?;
        let quote = ReserveAccounting::compute_swap_amount(&self.config, &state, direction, amount_in)
            .inspect_err(|err| warn!(%err, %account, ?direction, %amount_in, "swap rejected"))?;

        check_minimum(quote.amount_out, min_amount_out)?;

        let next = ReserveAccounting::apply_swap(&state, &quote)?;
        let plan = SettlementPlan::new()
            .deposit(account, quote.asset_in(), quote.amount_in)
            .withdraw(account, quote.asset_out(), quote.amount_out);
        self.settlement.settle(&plan)?;

        self.reserve = next;
        self.protocol_fees
            .accrue(quote.asset_out(), quote.protocol_fee_amount);
        info!(
            %account,
            ?direction,
            amount_in = %quote.amount_in,
            amount_out = %quote.amount_out,
            fee_factor = %quote.fee_factor,
            protocol_fee = %quote.protocol_fee_amount,
            bonus = quote.is_bonus(),
            "swap applied"
        );
        Ok(quote)
    }

    /// Pay all accrued protocol fees to `recipient`
    pub fn collect_protocol_fees(&mut self, recipient: &AccountId) -> Result<ProtocolFees> {
        let fees = self.protocol_fees;
        if fees.is_zero() {
            return Ok(fees);
        }

        let plan = SettlementPlan::new()
            .withdraw(recipient, Asset::Stable, fees.stable)
            .withdraw(recipient, Asset::Perp, fees.perp);
        self.settlement.settle(&plan)?;

        self.protocol_fees = ProtocolFees::default();
        info!(%recipient, stable = %fees.stable, perp = %fees.perp, "protocol fees collected");
        Ok(fees)
    }

    pub fn update_bounds(&mut self, soft: (Decimal, Decimal), hard: (Decimal, Decimal)) -> Result<()> {
        Ok(self.config.update_bounds(soft, hard)?)
    }

    pub fn update_fee_curve(
        &mut self,
        direction: SwapDirection,
        lower_factor: Decimal,
        upper_factor: Decimal,
    ) -> Result<()> {
        Ok(self
            .config
            .update_fee_curve(direction, lower_factor, upper_factor)?)
    }

    pub fn update_fee_curve_extremes(
        &mut self,
        direction: SwapDirection,
        hard_lower_factor: Decimal,
        hard_upper_factor: Decimal,
    ) -> Result<()> {
        Ok(self
            .config
            .update_fee_curve_extremes(direction, hard_lower_factor, hard_upper_factor)?)
    }

    pub fn update_protocol_share(&mut self, share: Decimal) -> Result<()> {
        Ok(self.config.update_protocol_share(share)?)
    }
}

fn check_minimum(expected: Decimal, minimum: Decimal) -> Result<()> {
    if expected < minimum {
        return Err(BrokerError::SlippageExceeded { expected, minimum });
    }
    Ok(())
}
