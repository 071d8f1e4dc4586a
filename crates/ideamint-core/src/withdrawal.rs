//! Withdrawal requests.
//!
//! A withdrawal debits the wallet up front and holds the amount behind a
//! pending request. An administrator later approves (the debit stands as the
//! payout) or rejects (a compensating ledger credit makes the user whole,
//! fee included).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::ids::{AccountId, EntryId, WithdrawalId};

/// Minimum withdrawal amount: ₹500.
pub const MIN_WITHDRAWAL_PAISE: i64 = 50_000;

/// Withdrawal fee in basis points: 2%.
pub const WITHDRAWAL_FEE_BPS: i64 = 200;

/// Compute the fee for a withdrawal amount, rounding down.
#[must_use]
pub const fn withdrawal_fee_paise(amount_paise: i64) -> i64 {
    amount_paise * WITHDRAWAL_FEE_BPS / 10_000
}

/// A fee-adjusted payout request awaiting administrator decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Unique request ID.
    pub id: WithdrawalId,

    /// The withdrawing account.
    pub account_id: AccountId,

    /// Gross amount debited from the wallet, in paise.
    pub amount_paise: i64,

    /// Fee withheld, in paise.
    pub fee_paise: i64,

    /// Net payout after fee, in paise.
    pub net_paise: i64,

    /// Request status.
    pub status: WithdrawalStatus,

    /// The pending ledger entry holding the debit; flipped to completed
    /// when the request is decided.
    pub ledger_entry_id: EntryId,

    /// Administrator note recorded with the decision.
    pub admin_note: Option<String>,

    /// The administrator who decided the request.
    pub decided_by: Option<AccountId>,

    /// When the request was created.
    pub created_at: DateTime<Utc>,

    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl WithdrawalRequest {
    /// Create a new pending request with the fee computed from the amount.
    ///
    /// The id is passed in rather than generated so the caller can create
    /// the holding ledger entry (which references this id) first.
    #[must_use]
    pub fn new(
        id: WithdrawalId,
        account_id: AccountId,
        amount_paise: i64,
        ledger_entry_id: EntryId,
    ) -> Self {
        let fee_paise = withdrawal_fee_paise(amount_paise);
        let now = Utc::now();
        Self {
            id,
            account_id,
            amount_paise,
            fee_paise,
            net_paise: amount_paise - fee_paise,
            status: WithdrawalStatus::Pending,
            ledger_entry_id,
            admin_note: None,
            decided_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record the administrator's decision.
    ///
    /// # Errors
    ///
    /// Returns `MarketError::InvalidTransition` if the request is already
    /// decided.
    pub fn decide(
        &mut self,
        admin: AccountId,
        approve: bool,
        note: Option<String>,
    ) -> Result<(), MarketError> {
        if self.status != WithdrawalStatus::Pending {
            return Err(MarketError::InvalidTransition {
                from: self.status.as_str(),
                to: if approve { "approved" } else { "rejected" },
            });
        }
        self.status = if approve {
            WithdrawalStatus::Approved
        } else {
            WithdrawalStatus::Rejected
        };
        self.admin_note = note;
        self.decided_by = Some(admin);
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Withdrawal request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    /// Awaiting administrator decision; amount held.
    Pending,

    /// Payout executed (terminal).
    Approved,

    /// Request rejected and amount returned (terminal).
    Rejected,
}

impl WithdrawalStatus {
    /// Stable lowercase name for API payloads and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}
