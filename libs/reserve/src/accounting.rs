//! Mint, redemption and swap sizing against the current reserve
//!
//! Every function here is pure: it reads a `ReserveState` snapshot and returns
//! a quote. Applying a quote produces a new state value, so callers can run
//! settlement first and only then commit.
//!
//! Rounding is always toward zero at the output asset's precision, which
//! keeps dust in the reserve rather than paying it out.

use crate::config::ReserveConfig;
use crate::error::ReserveError;
use crate::state::{Asset, AssetRatio, ReserveState};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use skew_curve::SwapDirection;
use tracing::debug;

/// Shares issued for a deposit and the amounts actually taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MintQuote {
    pub shares_out: Decimal,
    pub stable_used: Decimal,
    pub perp_used: Decimal,
}

impl MintQuote {
    pub fn zero() -> Self {
        Self {
            shares_out: Decimal::ZERO,
            stable_used: Decimal::ZERO,
            perp_used: Decimal::ZERO,
        }
    }
}

/// Amounts paid out for burning shares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RedeemQuote {
    pub stable_out: Decimal,
    pub perp_out: Decimal,
}

impl RedeemQuote {
    pub fn zero() -> Self {
        Self {
            stable_out: Decimal::ZERO,
            perp_out: Decimal::ZERO,
        }
    }
}

/// Fully sized swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapQuote {
    pub direction: SwapDirection,
    pub amount_in: Decimal,
    /// Output at feed prices before the fee factor
    pub base_amount_out: Decimal,
    /// Output paid to the trader
    pub amount_out: Decimal,
    /// Range-averaged curve factor applied to `base_amount_out`
    pub fee_factor: Decimal,
    /// Difference between `base_amount_out` and the factored output
    pub fee_amount: Decimal,
    /// Part of a fee routed to the protocol, zero for bonuses
    pub protocol_fee_amount: Decimal,
    pub ratio_before: AssetRatio,
    /// Ratio at `base_amount_out`, always inside the hard bounds
    pub ratio_after: Decimal,
    /// Ratio once the trader's output and the protocol's cut have left,
    /// also inside the hard bounds
    pub ratio_settled: Decimal,
}

impl SwapQuote {
    pub fn asset_in(&self) -> Asset {
        Asset::swap_legs(self.direction).0
    }

    pub fn asset_out(&self) -> Asset {
        Asset::swap_legs(self.direction).1
    }

    /// Factor above one pays the trader more than the feed price
    pub fn is_bonus(&self) -> bool {
        self.fee_factor > Decimal::ONE
    }
}

/// Reserve accounting math
pub struct ReserveAccounting;

impl ReserveAccounting {
    pub fn asset_ratio(state: &ReserveState) -> Result<AssetRatio, ReserveError> {
        state.asset_ratio()
    }

    /// Size a deposit of both assets into shares
    ///
    /// * Empty supply bootstraps: one share per quote unit of value deposited.
    /// * One empty side: only the other side's amount is taken.
    /// * Both sides funded: the deposit is capped to the reserve's current
    ///   proportions and the excess of the other asset is left with the caller.
    pub fn compute_mint_amount(
        config: &ReserveConfig,
        state: &ReserveState,
        supply: Decimal,
        stable_in: Decimal,
        perp_in: Decimal,
    ) -> Result<MintQuote, ReserveError> {
        check_amount(stable_in)?;
        check_amount(perp_in)?;

        if stable_in.is_zero() && perp_in.is_zero() {
            return Ok(MintQuote::zero());
        }

        let share_dp = config.share_decimals();

        if supply.is_zero() {
            let stable_value = mul(stable_in, state.price(Asset::Stable))?;
            let perp_value = mul(perp_in, state.price(Asset::Perp))?;
            let value = stable_value
                .checked_add(perp_value)
                .ok_or(ReserveError::MathOverflow)?;

            let quote = MintQuote {
                shares_out: round_down(value, share_dp),
                stable_used: stable_in,
                perp_used: perp_in,
            };
            debug!(?quote, "bootstrap mint");
            return Ok(quote);
        }

        let stable_balance = state.balance(Asset::Stable);
        let perp_balance = state.balance(Asset::Perp);

        let quote = match (stable_balance.is_zero(), perp_balance.is_zero()) {
            (true, true) => return Err(ReserveError::EmptyReserve { supply }),
            (false, true) => MintQuote {
                shares_out: mul_div_down(supply, stable_in, stable_balance, share_dp)?,
                stable_used: stable_in,
                perp_used: Decimal::ZERO,
            },
            (true, false) => MintQuote {
                shares_out: mul_div_down(supply, perp_in, perp_balance, share_dp)?,
                stable_used: Decimal::ZERO,
                perp_used: perp_in,
            },
            (false, false) => {
                let required_perp = mul_div_down(
                    stable_in,
                    perp_balance,
                    stable_balance,
                    config.decimals(Asset::Perp),
                )?;

                let (stable_used, perp_used) = if required_perp <= perp_in {
                    (stable_in, required_perp)
                } else {
                    let required_stable = mul_div_down(
                        perp_in,
                        stable_balance,
                        perp_balance,
                        config.decimals(Asset::Stable),
                    )?;
                    (required_stable, perp_in)
                };

                // Rounded legs can disagree slightly; issue against the smaller
                let via_stable = mul_div_down(supply, stable_used, stable_balance, share_dp)?;
                let via_perp = mul_div_down(supply, perp_used, perp_balance, share_dp)?;

                MintQuote {
                    shares_out: via_stable.min(via_perp),
                    stable_used,
                    perp_used,
                }
            }
        };

        debug!(?quote, %supply, "mint sized");
        Ok(quote)
    }

    /// Pro-rata share of both balances for `shares_in`
    pub fn compute_redemption_amounts(
        config: &ReserveConfig,
        state: &ReserveState,
        supply: Decimal,
        shares_in: Decimal,
    ) -> Result<RedeemQuote, ReserveError> {
        check_amount(shares_in)?;

        if shares_in.is_zero() {
            return Ok(RedeemQuote::zero());
        }
        if supply.is_zero() {
            return Err(ReserveError::ZeroSupply);
        }
        if shares_in > supply {
            return Err(ReserveError::InsufficientSupply {
                requested: shares_in,
                available: supply,
            });
        }

        let stable_balance = state.balance(Asset::Stable);
        let perp_balance = state.balance(Asset::Perp);

        // Last holder out takes everything, so an empty supply means an empty reserve
        if shares_in == supply {
            return Ok(RedeemQuote {
                stable_out: stable_balance,
                perp_out: perp_balance,
            });
        }

        let quote = RedeemQuote {
            stable_out: mul_div_down(
                stable_balance,
                shares_in,
                supply,
                config.decimals(Asset::Stable),
            )?,
            perp_out: mul_div_down(
                perp_balance,
                shares_in,
                supply,
                config.decimals(Asset::Perp),
            )?,
        };

        debug!(?quote, %shares_in, %supply, "redemption sized");
        Ok(quote)
    }

    /// Size a swap of `amount_in` in `direction`
    ///
    /// The base output converts at feed prices. The post-trade ratio uses that
    /// base output and must land inside the hard bounds; together with the
    /// pre-trade ratio it selects the range the fee curve is averaged over.
    /// The reserve left after the actual payout is gated again, so a bonus
    /// cannot carry the ratio past a hard bound.
    pub fn compute_swap_amount(
        config: &ReserveConfig,
        state: &ReserveState,
        direction: SwapDirection,
        amount_in: Decimal,
    ) -> Result<SwapQuote, ReserveError> {
        if amount_in <= Decimal::ZERO {
            return Err(ReserveError::UnacceptableSwap {
                reason: format!("amount in must be positive, got {amount_in}"),
            });
        }

        let (asset_in, asset_out) = Asset::swap_legs(direction);
        let out_balance = state.balance(asset_out);

        let base_amount_out = mul(amount_in, state.price(asset_in))?
            .checked_div(state.price(asset_out))
            .ok_or(ReserveError::MathOverflow)?;

        if out_balance.is_zero() || base_amount_out > out_balance {
            return Err(ReserveError::InsufficientReserve {
                asset: asset_out,
                requested: base_amount_out,
                available: out_balance,
            });
        }

        let ratio_before = state.asset_ratio()?;
        let post = state
            .with_delta(asset_in, amount_in)?
            .with_delta(asset_out, -base_amount_out)?;

        let bounds = config.bounds();
        let ratio_after = within_hard_bounds(config, post.asset_ratio()?, "post-trade")?;

        let fee_model = config.fee_model();
        let fee_factor = match ratio_before {
            // Perp side empty: priced at the curve's upper extreme
            AssetRatio::Infinite => fee_model.factor_at_hard_upper(direction)?,
            // Stable side empty: priced at the curve's lower extreme
            AssetRatio::Finite(ratio) if ratio.is_zero() => fee_model.factor_at_hard_lower(direction)?,
            AssetRatio::Finite(ratio) => {
                fee_model.fee_factor(direction, bounds.clamp_to_hard(ratio), ratio_after)?
            }
            AssetRatio::Empty => {
                return Err(ReserveError::InsufficientReserve {
                    asset: asset_out,
                    requested: base_amount_out,
                    available: out_balance,
                })
            }
        };

        let out_dp = config.decimals(asset_out);
        let exact_out = mul(base_amount_out, fee_factor)?;
        let amount_out = round_down(exact_out, out_dp);
        let fee_exact = (base_amount_out - exact_out).abs();
        let fee_amount = round_down(fee_exact, out_dp);
        let protocol_fee_amount = if fee_factor < Decimal::ONE {
            round_down(mul(fee_exact, config.protocol_share())?, out_dp)
        } else {
            Decimal::ZERO
        };

        if amount_out.is_zero() {
            return Err(ReserveError::UnacceptableSwap {
                reason: format!("output for {amount_in} {asset_in} rounds to zero"),
            });
        }

        let payout = amount_out
            .checked_add(protocol_fee_amount)
            .ok_or(ReserveError::MathOverflow)?;
        if payout > out_balance {
            return Err(ReserveError::InsufficientReserve {
                asset: asset_out,
                requested: payout,
                available: out_balance,
            });
        }

        let settled = state
            .with_delta(asset_in, amount_in)?
            .with_delta(asset_out, -payout)?;
        let ratio_settled = within_hard_bounds(config, settled.asset_ratio()?, "settled")?;

        let quote = SwapQuote {
            direction,
            amount_in,
            base_amount_out,
            amount_out,
            fee_factor,
            fee_amount,
            protocol_fee_amount,
            ratio_before,
            ratio_after,
            ratio_settled,
        };
        debug!(?quote, "swap sized");
        Ok(quote)
    }

    /// Reserve after taking a mint's deposit
    pub fn apply_mint(state: &ReserveState, quote: &MintQuote) -> Result<ReserveState, ReserveError> {
        state
            .with_delta(Asset::Stable, quote.stable_used)?
            .with_delta(Asset::Perp, quote.perp_used)
    }

    /// Reserve after paying out a redemption
    pub fn apply_redemption(
        state: &ReserveState,
        quote: &RedeemQuote,
    ) -> Result<ReserveState, ReserveError> {
        state
            .with_delta(Asset::Stable, -quote.stable_out)?
            .with_delta(Asset::Perp, -quote.perp_out)
    }

    /// Reserve after a swap; the protocol's cut leaves with the trader's output
    pub fn apply_swap(state: &ReserveState, quote: &SwapQuote) -> Result<ReserveState, ReserveError> {
        let payout = quote.amount_out + quote.protocol_fee_amount;
        state
            .with_delta(quote.asset_in(), quote.amount_in)?
            .with_delta(quote.asset_out(), -payout)
    }
}

fn within_hard_bounds(
    config: &ReserveConfig,
    ratio: AssetRatio,
    stage: &str,
) -> Result<Decimal, ReserveError> {
    match ratio {
        AssetRatio::Finite(ratio) if config.bounds().within_hard(ratio) => Ok(ratio),
        outside => {
            let (hard_lower, hard_upper) = config.bounds().hard();
            Err(ReserveError::UnacceptableSwap {
                reason: format!(
                    "{stage} asset ratio {outside} outside hard bounds [{hard_lower}, {hard_upper}]"
                ),
            })
        }
    }
}

fn check_amount(amount: Decimal) -> Result<(), ReserveError> {
    if amount < Decimal::ZERO {
        return Err(ReserveError::NegativeAmount { amount });
    }
    Ok(())
}

fn mul(a: Decimal, b: Decimal) -> Result<Decimal, ReserveError> {
    a.checked_mul(b).ok_or(ReserveError::MathOverflow)
}

fn round_down(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

/// `a * b / c` rounded toward zero at `dp` decimal places
fn mul_div_down(a: Decimal, b: Decimal, c: Decimal, dp: u32) -> Result<Decimal, ReserveError> {
    let quotient = mul(a, b)?
        .checked_div(c)
        .ok_or(ReserveError::MathOverflow)?;
    Ok(round_down(quotient, dp))
}
