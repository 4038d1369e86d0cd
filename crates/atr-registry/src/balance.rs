//! # Balance Book
//!
//! Tracks value accumulated by addresses. Portals credit the value sent
//! with attest and replace operations here; the owner-gated withdraw path
//! in the portal pipeline debits it. A transfer that cannot be funded
//! fails with no effect on either account.

use std::collections::HashMap;

use thiserror::Error;

use atr_core::Address;

/// Error during a balance transfer.
#[derive(Error, Debug)]
pub enum BalanceError {
    /// The source account does not hold enough to fund the transfer.
    #[error("insufficient funds: {address} holds {held}, transfer needs {needed}")]
    InsufficientFunds {
        /// The debited account.
        address: Address,
        /// Its current balance.
        held: u128,
        /// The requested transfer amount.
        needed: u128,
    },
}

/// Address-keyed balance book.
#[derive(Debug, Default)]
pub struct Balances {
    accounts: HashMap<Address, u128>,
}

impl Balances {
    /// Create an empty balance book.
    pub fn new() -> Self {
        Self::default()
    }

    /// The balance held by `address` (zero if never credited).
    pub fn balance_of(&self, address: Address) -> u128 {
        self.accounts.get(&address).copied().unwrap_or(0)
    }

    /// Credit `amount` to `address`.
    pub fn deposit(&mut self, address: Address, amount: u128) {
        if amount == 0 {
            return;
        }
        *self.accounts.entry(address).or_insert(0) += amount;
    }

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` if `from` holds less than `amount`;
    /// neither account is touched.
    pub fn transfer(&mut self, from: Address, to: Address, amount: u128) -> Result<(), BalanceError> {
        let held = self.balance_of(from);
        if held < amount {
            return Err(BalanceError::InsufficientFunds {
                address: from,
                held,
                needed: amount,
            });
        }
        self.accounts.insert(from, held - amount);
        self.deposit(to, amount);
        Ok(())
    }
}
