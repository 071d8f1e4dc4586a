//! Ledger entry types.
//!
//! Every balance-affecting event creates exactly one ledger entry. Entries
//! are append-only: immutable after creation except for the status
//! transition `Pending -> Completed`, and never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, EntryId};

/// An immutable record of one balance-affecting event.
///
/// `coin_delta` and `currency_delta_paise` are signed; positive values
/// credit, negative values debit. Either may be zero but not both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique entry ID (ULID for time-ordering).
    pub id: EntryId,

    /// The account whose balances this entry affects.
    pub account_id: AccountId,

    /// What kind of event produced this entry.
    pub kind: EntryKind,

    /// Signed coin delta.
    pub coin_delta: i64,

    /// Signed wallet delta in paise.
    pub currency_delta_paise: i64,

    /// Entry status. Only withdrawals start `Pending`; everything else is
    /// `Completed` at creation.
    pub status: EntryStatus,

    /// Optional external reference (gateway payment id, withdrawal id).
    pub reference: Option<String>,

    /// Human-readable description.
    pub description: String,

    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Signup bonus granted at registration.
    #[must_use]
    pub fn signup_bonus(account_id: AccountId, coins: i64) -> Self {
        Self::completed(
            account_id,
            EntryKind::SignupBonus,
            coins,
            0,
            None,
            format!("Signup bonus of {coins} coins"),
        )
    }

    /// Referral bonus granted to the referrer for a completed registration.
    #[must_use]
    pub fn referral_bonus(account_id: AccountId, coins: i64, referred: AccountId) -> Self {
        Self::completed(
            account_id,
            EntryKind::ReferralBonus,
            coins,
            0,
            Some(referred.to_string()),
            format!("Referral bonus of {coins} coins"),
        )
    }

    /// Coin purchase credited after a verified payment confirmation.
    #[must_use]
    pub fn purchase(account_id: AccountId, coins: i64, payment_id: &str) -> Self {
        Self::completed(
            account_id,
            EntryKind::Purchase,
            coins,
            0,
            Some(payment_id.to_string()),
            format!("Purchased {coins} coins"),
        )
    }

    /// Coin debit taken when an idea is submitted.
    #[must_use]
    pub fn idea_submission_cost(account_id: AccountId, coins: i64, idea_ref: &str) -> Self {
        Self::completed(
            account_id,
            EntryKind::IdeaSubmissionCost,
            -coins.abs(), // Always a debit
            0,
            Some(idea_ref.to_string()),
            format!("Idea submission cost ({coins} coins)"),
        )
    }

    /// Wallet credit for an approved idea.
    #[must_use]
    pub fn idea_earning(account_id: AccountId, payout_paise: i64, idea_ref: &str) -> Self {
        Self::completed(
            account_id,
            EntryKind::IdeaEarning,
            0,
            payout_paise,
            Some(idea_ref.to_string()),
            format!("Earning for approved idea ({payout_paise} paise)"),
        )
    }

    /// Wallet debit held against a pending withdrawal request.
    ///
    /// Created `Pending`; flipped to `Completed` when the administrator
    /// decides the request.
    #[must_use]
    pub fn withdrawal(account_id: AccountId, amount_paise: i64, withdrawal_ref: &str) -> Self {
        Self {
            id: EntryId::generate(),
            account_id,
            kind: EntryKind::Withdrawal,
            coin_delta: 0,
            currency_delta_paise: -amount_paise.abs(), // Always a debit
            status: EntryStatus::Pending,
            reference: Some(withdrawal_ref.to_string()),
            description: format!("Withdrawal of {amount_paise} paise"),
            created_at: Utc::now(),
        }
    }

    /// Compensating credit returning a rejected withdrawal's amount.
    #[must_use]
    pub fn withdrawal_reversal(
        account_id: AccountId,
        amount_paise: i64,
        withdrawal_ref: &str,
    ) -> Self {
        Self::completed(
            account_id,
            EntryKind::Withdrawal,
            0,
            amount_paise.abs(),
            Some(withdrawal_ref.to_string()),
            format!("Withdrawal rejected, {amount_paise} paise returned"),
        )
    }

    fn completed(
        account_id: AccountId,
        kind: EntryKind,
        coin_delta: i64,
        currency_delta_paise: i64,
        reference: Option<String>,
        description: String,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            account_id,
            kind,
            coin_delta,
            currency_delta_paise,
            status: EntryStatus::Completed,
            reference,
            description,
            created_at: Utc::now(),
        }
    }
}

/// What kind of event produced a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Registration bonus coins.
    SignupBonus,

    /// Referral bonus coins to the referrer.
    ReferralBonus,

    /// Coins bought through the payment gateway.
    Purchase,

    /// Coins debited for an idea submission.
    IdeaSubmissionCost,

    /// Wallet credit for an approved idea.
    IdeaEarning,

    /// Wallet debit for a withdrawal (or its compensating reversal).
    Withdrawal,
}

impl EntryKind {
    /// Check if entries of this kind credit the account.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(
            self,
            Self::SignupBonus | Self::ReferralBonus | Self::Purchase | Self::IdeaEarning
        )
    }
}

/// Ledger entry status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Entry applied to the balance but awaiting a terminal decision
    /// (withdrawals only).
    Pending,

    /// Entry settled.
    Completed,
}
