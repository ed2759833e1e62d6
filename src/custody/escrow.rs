//! Collateral escrow with guaranteed-delivery refunds.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use super::claimable::{ClaimKey, ClaimableLedger};
use super::token_ledger::{TokenError, TokenLedger};
use crate::domain::AccountId;
use crate::error::PoolError;

/// Where a refund ended up.
///
/// Callers branch on this to emit the matching notification; a
/// [`Self::CreditedClaimable`] outcome must be followed by a
/// `TokensClaimable` event.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RefundOutcome {
    /// Zero amount, nothing moved.
    Nothing,
    /// Transferred directly to the recipient.
    Delivered {
        /// Amount transferred.
        #[serde(serialize_with = "super::serialize_amount")]
        #[schema(value_type = String)]
        amount: u128,
    },
    /// Sent to the burn sink because the recipient is forfeited.
    Burned {
        /// Amount burned.
        #[serde(serialize_with = "super::serialize_amount")]
        #[schema(value_type = String)]
        amount: u128,
    },
    /// Direct transfer failed; credited to the claimable ledger.
    CreditedClaimable {
        /// Amount credited.
        #[serde(serialize_with = "super::serialize_amount")]
        #[schema(value_type = String)]
        amount: u128,
        /// Account entitled to claim it.
        owner: AccountId,
        /// Ledger key actually credited.
        key: ClaimKey,
    },
}

impl RefundOutcome {
    /// Amount that left (or will leave) custody.
    #[must_use]
    pub fn amount(&self) -> u128 {
        match self {
            Self::Nothing => 0,
            Self::Delivered { amount }
            | Self::Burned { amount }
            | Self::CreditedClaimable { amount, .. } => *amount,
        }
    }
}

/// Custody of all escrowed collateral.
///
/// Holds the custody and burn-sink accounts and every call into the
/// external [`TokenLedger`].
#[derive(Debug, Clone)]
pub struct TokenCustody {
    ledger: Arc<dyn TokenLedger>,
    custody_account: AccountId,
    burn_account: AccountId,
}

impl TokenCustody {
    /// Creates a custody over `ledger`.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn TokenLedger>,
        custody_account: AccountId,
        burn_account: AccountId,
    ) -> Self {
        Self {
            ledger,
            custody_account,
            burn_account,
        }
    }

    /// Account that holds escrowed collateral.
    #[must_use]
    pub fn custody_account(&self) -> &AccountId {
        &self.custody_account
    }

    /// Burn sink for forfeited collateral.
    #[must_use]
    pub fn burn_account(&self) -> &AccountId {
        &self.burn_account
    }

    /// Tokens currently held by custody.
    #[must_use]
    pub fn balance(&self) -> u128 {
        self.ledger.balance_of(&self.custody_account)
    }

    /// Balance of any account on the underlying ledger.
    #[must_use]
    pub fn balance_of(&self, holder: &AccountId) -> u128 {
        self.ledger.balance_of(holder)
    }

    /// Allowance `owner` granted to custody.
    #[must_use]
    pub fn allowance_of(&self, owner: &AccountId) -> u128 {
        self.ledger.allowance(owner, &self.custody_account)
    }

    /// Checks allowance and balance for a lock without moving anything.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InsufficientAllowance`] or
    /// [`PoolError::InsufficientBalance`].
    pub fn ensure_lockable(&self, from: &AccountId, amount: u128) -> Result<(), PoolError> {
        if amount == 0 {
            return Ok(());
        }
        let allowance = self.allowance_of(from);
        if allowance < amount {
            return Err(PoolError::InsufficientAllowance {
                required: amount,
                available: allowance,
            });
        }
        let balance = self.ledger.balance_of(from);
        if balance < amount {
            return Err(PoolError::InsufficientBalance {
                required: amount,
                available: balance,
            });
        }
        Ok(())
    }

    /// Pulls `amount` from `from` into custody.
    ///
    /// # Errors
    ///
    /// Returns an economic [`PoolError`] if allowance or balance is short,
    /// or the ledger refuses the transfer.
    pub fn lock(&self, from: &AccountId, amount: u128) -> Result<(), PoolError> {
        if amount == 0 {
            return Ok(());
        }
        self.ensure_lockable(from, amount)?;
        self.ledger
            .transfer_in(from, &self.custody_account, amount)
            .map_err(|err| match err {
                TokenError::InsufficientAllowance {
                    required,
                    available,
                } => PoolError::InsufficientAllowance {
                    required,
                    available,
                },
                TokenError::InsufficientBalance {
                    required,
                    available,
                } => PoolError::InsufficientBalance {
                    required,
                    available,
                },
                TokenError::Rejected(reason) => PoolError::TransferFailed(reason),
            })?;
        tracing::debug!(account = %from, amount, "collateral locked");
        Ok(())
    }

    /// Returns `amount` to `to`, or to the burn sink when `forfeited`.
    ///
    /// Never fails: a refused transfer is credited to `claimable` under
    /// `key` (or under the burn account for a refused burn).
    pub fn refund(
        &self,
        claimable: &mut ClaimableLedger,
        key: ClaimKey,
        to: &AccountId,
        amount: u128,
        forfeited: bool,
    ) -> RefundOutcome {
        if amount == 0 {
            return RefundOutcome::Nothing;
        }

        if forfeited {
            return match self.ledger.transfer_out(&self.burn_account, amount) {
                Ok(()) => RefundOutcome::Burned { amount },
                Err(err) => {
                    tracing::warn!(error = %err, amount, "burn transfer failed; crediting burn sink");
                    let key = claimable.credit(
                        ClaimKey::Account(self.burn_account.clone()),
                        &self.burn_account,
                        amount,
                    );
                    RefundOutcome::CreditedClaimable {
                        amount,
                        owner: self.burn_account.clone(),
                        key,
                    }
                }
            };
        }

        match self.ledger.transfer_out(to, amount) {
            Ok(()) => RefundOutcome::Delivered { amount },
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    recipient = %to,
                    amount,
                    "refund transfer failed; credited as claimable"
                );
                let key = claimable.credit(key, to, amount);
                RefundOutcome::CreditedClaimable {
                    amount,
                    owner: to.clone(),
                    key,
                }
            }
        }
    }

    /// Pays out the claimable balance under `key` to `caller`.
    ///
    /// The entry is removed before the transfer and restored if the
    /// transfer fails, so a balance can be paid at most once.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NothingToClaim`], [`PoolError::Forbidden`], or
    /// [`PoolError::TransferFailed`].
    pub fn claim(
        &self,
        claimable: &mut ClaimableLedger,
        key: &ClaimKey,
        caller: &AccountId,
    ) -> Result<u128, PoolError> {
        let entry = claimable.take(key, caller)?;
        let amount = entry.amount;
        if let Err(err) = self.ledger.transfer_out(caller, amount) {
            claimable.restore(key.clone(), entry);
            return Err(PoolError::TransferFailed(err.to_string()));
        }
        Ok(amount)
    }

    /// Sweeps up to `amount` of the custody balance to the burn sink.
    ///
    /// Returns the amount actually swept after clamping.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::TransferFailed`] if the sweep is refused.
    pub fn sweep(&self, amount: u128) -> Result<u128, PoolError> {
        let amount = amount.min(self.balance());
        if amount == 0 {
            return Ok(0);
        }
        self.ledger
            .transfer_out(&self.burn_account, amount)
            .map_err(|err| PoolError::TransferFailed(err.to_string()))?;
        Ok(amount)
    }
}
