//! Settlement contract and an in-memory ledger
//!
//! The broker hands each operation's transfers to `Settlement::settle` as
//! one `SettlementPlan`. A settlement either applies every leg or none.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use skew_reserve::Asset;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Owner of balances held outside the reserve
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything an account can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Holding {
    Asset(Asset),
    Shares,
}

impl fmt::Display for Holding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asset(asset) => write!(f, "{asset}"),
            Self::Shares => write!(f, "shares"),
        }
    }
}

/// One transfer in a settlement plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Leg {
    /// Account pays `amount` of `asset` into custody
    Deposit {
        account: AccountId,
        asset: Asset,
        amount: Decimal,
    },
    /// Custody pays `amount` of `asset` to the account
    Withdraw {
        account: AccountId,
        asset: Asset,
        amount: Decimal,
    },
    MintShares { account: AccountId, amount: Decimal },
    BurnShares { account: AccountId, amount: Decimal },
}

/// Ordered transfers settled as a unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    legs: Vec<Leg>,
}

impl SettlementPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero amounts are skipped
    pub fn deposit(mut self, account: &AccountId, asset: Asset, amount: Decimal) -> Self {
        if !amount.is_zero() {
            self.legs.push(Leg::Deposit {
                account: account.clone(),
                asset,
                amount,
            });
        }
        self
    }

    /// Zero amounts are skipped
    pub fn withdraw(mut self, account: &AccountId, asset: Asset, amount: Decimal) -> Self {
        if !amount.is_zero() {
            self.legs.push(Leg::Withdraw {
                account: account.clone(),
                asset,
                amount,
            });
        }
        self
    }

    pub fn mint_shares(mut self, account: &AccountId, amount: Decimal) -> Self {
        self.legs.push(Leg::MintShares {
            account: account.clone(),
            amount,
        });
        self
    }

    pub fn burn_shares(mut self, account: &AccountId, amount: Decimal) -> Self {
        self.legs.push(Leg::BurnShares {
            account: account.clone(),
            amount,
        });
        self
    }

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }
}

/// Reasons a settlement refuses a plan
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("Account {account} holds {available} {holding}, needs {requested}")]
    InsufficientFunds {
        account: AccountId,
        holding: Holding,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Custody holds {available} {asset}, needs {requested}")]
    InsufficientCustody {
        asset: Asset,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Invalid leg amount {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("Settlement rejected: {reason}")]
    Rejected { reason: String },
}

/// Atomic executor of settlement plans
pub trait Settlement {
    /// Apply every leg of `plan`, or none of them on error
    fn settle(&mut self, plan: &SettlementPlan) -> Result<(), SettlementError>;
}

/// Per-account balances plus the broker's custody, all in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryLedger {
    accounts: HashMap<(AccountId, Holding), Decimal>,
    custody: HashMap<Asset, Decimal>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fund an account from outside the system
    pub fn credit(&mut self, account: &AccountId, holding: Holding, amount: Decimal) {
        *self
            .accounts
            .entry((account.clone(), holding))
            .or_insert(Decimal::ZERO) += amount;
    }

    pub fn balance(&self, account: &AccountId, holding: Holding) -> Decimal {
        self.accounts
            .get(&(account.clone(), holding))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Asset held on behalf of the broker
    pub fn custody(&self, asset: Asset) -> Decimal {
        self.custody.get(&asset).copied().unwrap_or(Decimal::ZERO)
    }

    fn debit_account(
        accounts: &mut HashMap<(AccountId, Holding), Decimal>,
        account: &AccountId,
        holding: Holding,
        amount: Decimal,
    ) -> Result<(), SettlementError> {
        let entry = accounts
            .entry((account.clone(), holding))
            .or_insert(Decimal::ZERO);
        if *entry < amount {
            return Err(SettlementError::InsufficientFunds {
                account: account.clone(),
                holding,
                requested: amount,
                available: *entry,
            });
        }
        *entry -= amount;
        Ok(())
    }

    fn debit_custody(
        custody: &mut HashMap<Asset, Decimal>,
        asset: Asset,
        amount: Decimal,
    ) -> Result<(), SettlementError> {
        let entry = custody.entry(asset).or_insert(Decimal::ZERO);
        if *entry < amount {
            return Err(SettlementError::InsufficientCustody {
                asset,
                requested: amount,
                available: *entry,
            });
        }
        *entry -= amount;
        Ok(())
    }
}

impl Settlement for InMemoryLedger {
    fn settle(&mut self, plan: &SettlementPlan) -> Result<(), SettlementError> {
        // Work on copies; commit only once every leg has applied
        let mut accounts = self.accounts.clone();
        let mut custody = self.custody.clone();

        for leg in plan.legs() {
            match leg {
                Leg::Deposit {
                    account,
                    asset,
                    amount,
                } => {
                    check_leg_amount(*amount)?;
                    Self::debit_account(&mut accounts, account, Holding::Asset(*asset), *amount)?;
                    *custody.entry(*asset).or_insert(Decimal::ZERO) += *amount;
                }
                Leg::Withdraw {
                    account,
                    asset,
                    amount,
                } => {
                    check_leg_amount(*amount)?;
                    Self::debit_custody(&mut custody, *asset, *amount)?;
                    *accounts
                        .entry((account.clone(), Holding::Asset(*asset)))
                        .or_insert(Decimal::ZERO) += *amount;
                }
                Leg::MintShares { account, amount } => {
                    check_leg_amount(*amount)?;
                    *accounts
                        .entry((account.clone(), Holding::Shares))
                        .or_insert(Decimal::ZERO) += *amount;
                }
                Leg::BurnShares { account, amount } => {
                    check_leg_amount(*amount)?;
                    Self::debit_account(&mut accounts, account, Holding::Shares, *amount)?;
                }
            }
        }

        self.accounts = accounts;
        self.custody = custody;
        debug!(legs = plan.legs().len(), "settlement applied");
        Ok(())
    }
}

fn check_leg_amount(amount: Decimal) -> Result<(), SettlementError> {
    if amount < Decimal::ZERO {
        return Err(SettlementError::InvalidAmount { amount });
    }
    Ok(())
}
