//! Boundary to the external fungible-token ledger.
//!
//! [`TokenLedger`] is the only way collateral moves. Calls are synchronous
//! from the core's point of view: each either succeeds or returns a
//! [`TokenError`]. [`InMemoryTokenLedger`] backs the development server
//! and the test suite.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Mutex;

use crate::domain::AccountId;

/// Failure reported by the token ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Sender balance is below the transfer amount.
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance {
        /// Amount requested.
        required: u128,
        /// Amount held.
        available: u128,
    },
    /// Spender allowance is below the transfer amount.
    #[error("insufficient allowance: have {available}, need {required}")]
    InsufficientAllowance {
        /// Amount requested.
        required: u128,
        /// Amount approved.
        available: u128,
    },
    /// The ledger refused or reverted the transfer.
    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// External token-transfer primitive consumed by custody.
pub trait TokenLedger: Send + Sync + fmt::Debug {
    /// Moves `amount` from `from` to `to` using the allowance `from`
    /// granted to the custody account.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] if the transfer does not happen.
    fn transfer_in(&self, from: &AccountId, to: &AccountId, amount: u128)
    -> Result<(), TokenError>;

    /// Moves `amount` out of custody to `to`.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] if the transfer does not happen.
    fn transfer_out(&self, to: &AccountId, amount: u128) -> Result<(), TokenError>;

    /// Balance held by `holder`.
    fn balance_of(&self, holder: &AccountId) -> u128;

    /// Amount `owner` has approved `spender` to pull.
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128;
}

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<AccountId, u128>,
    allowances: HashMap<(AccountId, AccountId), u128>,
    blocked: HashSet<AccountId>,
}

/// Process-local token ledger with failure injection.
///
/// Transfers out of custody debit `custody`. Recipients registered with
/// [`Self::block_recipient`] make every transfer to them fail, which is how
/// tests drive the claimable-ledger fallback.
#[derive(Debug)]
pub struct InMemoryTokenLedger {
    custody: AccountId,
    book: Mutex<Book>,
}

impl InMemoryTokenLedger {
    /// Creates an empty ledger whose outbound transfers debit `custody`.
    #[must_use]
    pub fn new(custody: AccountId) -> Self {
        Self {
            custody,
            book: Mutex::new(Book::default()),
        }
    }

    /// Credits `amount` to `to` out of thin air.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Rejected`] if the ledger lock is poisoned or
    /// the balance would overflow.
    pub fn mint(&self, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        let mut book = self.lock()?;
        let balance = book.balances.entry(to.clone()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TokenError::Rejected("balance overflow".to_string()))?;
        Ok(())
    }

    /// Sets the allowance `owner` grants `spender`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Rejected`] if the ledger lock is poisoned.
    pub fn approve(
        &self,
        owner: &AccountId,
        spender: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        let mut book = self.lock()?;
        book.allowances
            .insert((owner.clone(), spender.clone()), amount);
        Ok(())
    }

    /// Makes every future transfer to `account` fail.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Rejected`] if the ledger lock is poisoned.
    pub fn block_recipient(&self, account: &AccountId) -> Result<(), TokenError> {
        self.lock()?.blocked.insert(account.clone());
        Ok(())
    }

    /// Reverts [`Self::block_recipient`].
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Rejected`] if the ledger lock is poisoned.
    pub fn unblock_recipient(&self, account: &AccountId) -> Result<(), TokenError> {
        self.lock()?.blocked.remove(account);
        Ok(())
    }

    /// Account debited by [`TokenLedger::transfer_out`].
    #[must_use]
    pub fn custody(&self) -> &AccountId {
        &self.custody
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Book>, TokenError> {
        self.book
            .lock()
            .map_err(|_| TokenError::Rejected("token ledger unavailable".to_string()))
    }
}

impl Book {
    fn move_balance(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        if self.blocked.contains(to) {
            return Err(TokenError::Rejected(format!("recipient {to} refuses transfers")));
        }
        let available = self.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        let credited = self
            .balances
            .get(to)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or_else(|| TokenError::Rejected("balance overflow".to_string()))?;
        self.balances.insert(from.clone(), available - amount);
        // `from == to` must still net to zero.
        let credited = if from == to { available } else { credited };
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn transfer_in(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TokenError> {
        let mut book = self.lock()?;
        let key = (from.clone(), self.custody.clone());
        let allowed = book.allowances.get(&key).copied().unwrap_or(0);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                required: amount,
                available: allowed,
            });
        }
        book.move_balance(from, to, amount)?;
        book.allowances.insert(key, allowed - amount);
        Ok(())
    }

    fn transfer_out(&self, to: &AccountId, amount: u128) -> Result<(), TokenError> {
        let mut book = self.lock()?;
        let custody = self.custody.clone();
        book.move_balance(&custody, to, amount)
    }

    fn balance_of(&self, holder: &AccountId) -> u128 {
        self.lock()
            .map(|book| book.balances.get(holder).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> u128 {
        self.lock()
            .map(|book| {
                book.allowances
                    .get(&(owner.clone(), spender.clone()))
                    .copied()
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn ledger() -> InMemoryTokenLedger {
        InMemoryTokenLedger::new(AccountId::from("custody"))
    }

    #[test]
    fn transfer_in_consumes_allowance() {
        let ledger = ledger();
        let alice = AccountId::from("alice");
        let custody = AccountId::from("custody");
        let _ = ledger.mint(&alice, 500);
        let _ = ledger.approve(&alice, &custody, 300);

        assert!(ledger.transfer_in(&alice, &custody, 200).is_ok());
        assert_eq!(ledger.balance_of(&alice), 300);
        assert_eq!(ledger.balance_of(&custody), 200);
        assert_eq!(ledger.allowance(&alice, &custody), 100);
    }

    #[test]
    fn transfer_in_without_allowance_fails() {
        let ledger = ledger();
        let alice = AccountId::from("alice");
        let _ = ledger.mint(&alice, 500);
        let result = ledger.transfer_in(&alice, &AccountId::from("custody"), 1);
        assert!(matches!(result, Err(TokenError::InsufficientAllowance { .. })));
    }

    #[test]
    fn transfer_in_without_balance_keeps_allowance() {
        let ledger = ledger();
        let alice = AccountId::from("alice");
        let custody = AccountId::from("custody");
        let _ = ledger.approve(&alice, &custody, 50);
        let result = ledger.transfer_in(&alice, &custody, 50);
        assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
        assert_eq!(ledger.allowance(&alice, &custody), 50);
    }

    #[test]
    fn blocked_recipient_fails_transfer_out() {
        let ledger = ledger();
        let custody = AccountId::from("custody");
        let bob = AccountId::from("bob");
        let _ = ledger.mint(&custody, 100);
        let _ = ledger.block_recipient(&bob);
        assert!(matches!(
            ledger.transfer_out(&bob, 10),
            Err(TokenError::Rejected(_))
        ));
        assert_eq!(ledger.balance_of(&custody), 100);

        let _ = ledger.unblock_recipient(&bob);
        assert!(ledger.transfer_out(&bob, 10).is_ok());
        assert_eq!(ledger.balance_of(&bob), 10);
    }
}
