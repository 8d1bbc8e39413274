//! # Custody
//!
//! The escrow never stores value itself. It is handed a [`ValueLedger`]
//! and owns one account inside it (the custody account). Deposits are
//! transfers from a caller into custody; payouts are transfers out.
//!
//! A `ValueLedger` must make each [`transfer`](ValueLedger::transfer)
//! all-or-nothing: on error no balance changes. Multi-leg payouts go
//! through [`ValueLedger::transfer_batch`], which undoes completed legs
//! when a later one fails.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pact_core::{Address, Amount, OrderId};

/// Errors raised by a value ledger or by the escrow's custody accounting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    /// The paying account cannot cover the transfer.
    #[error("insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        /// The paying account.
        account: Address,
        /// Transfer amount.
        required: Amount,
        /// Current balance.
        available: Amount,
    },

    /// Crediting the account would overflow its balance.
    #[error("balance overflow crediting {account}")]
    Overflow {
        /// The receiving account.
        account: Address,
    },

    /// A payout would exceed what the order still has in custody.
    #[error("order {order_id} holds {held}, cannot pay out {requested}")]
    InsufficientHeld {
        /// The order.
        order_id: OrderId,
        /// Requested payout.
        requested: Amount,
        /// What the order holds.
        held: Amount,
    },

    /// The account is the escrow's own custody account and cannot act as a
    /// party or receive new value.
    #[error("account {0} is reserved for escrow custody")]
    ReservedAccount(Address),

    /// The custody balance does not equal the sum of held order value.
    #[error("custody balance {actual} does not match held total {expected}")]
    CustodyMismatch {
        /// Sum of `held` across all orders.
        expected: Amount,
        /// Balance of the custody account.
        actual: Amount,
    },
}

/// One leg of a batch payout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    /// Paying account.
    pub from: Address,
    /// Receiving account.
    pub to: Address,
    /// Value moved.
    pub amount: Amount,
}

impl Transfer {
    /// Construct a transfer leg.
    pub fn new(from: Address, to: Address, amount: Amount) -> Self {
        Self { from, to, amount }
    }

    fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
            amount: self.amount,
        }
    }
}

/// Capability to read balances and move value between accounts.
pub trait ValueLedger {
    /// Current balance of `account`; zero for unknown accounts.
    fn balance_of(&self, account: &Address) -> Amount;

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// [`CustodyError::InsufficientFunds`] or [`CustodyError::Overflow`].
    /// On error no balance has changed.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount)
        -> Result<(), CustodyError>;

    /// Apply every leg in order, or none of them.
    ///
    /// Completed legs are reversed (newest first) if a later leg fails.
    fn transfer_batch(&mut self, legs: &[Transfer]) -> Result<(), CustodyError> {
        for (done, leg) in legs.iter().enumerate() {
            if let Err(err) = self.transfer(&leg.from, &leg.to, leg.amount) {
                for completed in legs[..done].iter().rev() {
                    let back = completed.reversed();
                    if let Err(undo) = self.transfer(&back.from, &back.to, back.amount) {
                        tracing::error!(error = %undo, "failed to roll back transfer leg");
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

// ── In-memory bank ──────────────────────────────────────────────────────

/// Reference [`ValueLedger`]: a map of balances, funded by [`mint`](Self::mint).
///
/// Zero balances are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryBank {
    balances: BTreeMap<Address, Amount>,
}

impl InMemoryBank {
    /// An empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` of new value in `account`.
    ///
    /// # Errors
    ///
    /// [`CustodyError::Overflow`] if the account balance or the total
    /// supply would overflow.
    pub fn mint(&mut self, account: &Address, amount: Amount) -> Result<(), CustodyError> {
        let overflow = || CustodyError::Overflow {
            account: account.clone(),
        };
        self.total_supply()
            .and_then(|supply| supply.checked_add(amount))
            .ok_or_else(overflow)?;
        let updated = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or_else(overflow)?;
        self.set_balance(account, updated);
        Ok(())
    }

    /// Sum of all balances, or `None` if it does not fit.
    pub fn total_supply(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(Amount::ZERO, |acc, b| acc.checked_add(*b))
    }

    /// Non-zero balances in address order.
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, Amount)> {
        self.balances.iter().map(|(a, b)| (a, *b))
    }

    fn set_balance(&mut self, account: &Address, balance: Amount) {
        if balance.is_zero() {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), balance);
        }
    }
}

impl ValueLedger for InMemoryBank {
    fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), CustodyError> {
        let available = self.balance_of(from);
        let debited = available
            .checked_sub(amount)
            .ok_or_else(|| CustodyError::InsufficientFunds {
                account: from.clone(),
                required: amount,
                available,
            })?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| CustodyError::Overflow {
                account: to.clone(),
            })?;
        self.set_balance(from, debited);
        self.set_balance(to, credited);
        Ok(())
    }
}

/// Summary of a successful custody audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyReport {
    /// The escrow's account in the value ledger.
    pub custody_account: Address,
    /// Its balance.
    pub custody_balance: Amount,
    /// Sum of `held` across every order. Equal to `custody_balance`.
    pub total_held: Amount,
    /// Orders not yet `Inactive`.
    pub open_orders: usize,
}
