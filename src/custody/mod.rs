//! Token custody: collateral escrow, refunds, and the claimable ledger.
//!
//! Every outbound money movement goes through [`TokenCustody::refund`],
//! which either delivers directly or credits the [`ClaimableLedger`].
//! A failed refund therefore never rolls back the membership change
//! that triggered it.

pub mod claimable;
pub mod escrow;
pub mod token_ledger;

pub use claimable::{ClaimEntry, ClaimKey, ClaimableLedger};
pub use escrow::{RefundOutcome, TokenCustody};
pub use token_ledger::{InMemoryTokenLedger, TokenError, TokenLedger};

/// Serializes a u128 amount as a JSON string.
///
/// # Errors
///
/// Propagates the serializer's error.
pub fn serialize_amount<S: serde::Serializer>(amount: &u128, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(amount)
}
