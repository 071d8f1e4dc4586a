//! Idea submission lifecycle.
//!
//! An idea is created `Pending` when its submission cost is debited, and is
//! decided exactly once by a reviewer: `Approved` (with a payout) or
//! `Rejected` (with a reason). Both are terminal; there is no re-opening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::ids::{AccountId, IdeaId};

/// A user-submitted idea under moderator review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    /// Unique idea ID.
    pub id: IdeaId,

    /// The submitting account.
    pub account_id: AccountId,

    /// Category slug chosen at submission.
    pub category: String,

    /// Title.
    pub title: String,

    /// The problem the idea addresses.
    pub problem: String,

    /// The proposed solution.
    pub solution: String,

    /// References to uploaded attachments (storage keys).
    pub attachments: Vec<String>,

    /// Lifecycle status.
    pub status: IdeaStatus,

    /// Payout in paise, set only on approval.
    pub payout_paise: Option<i64>,

    /// Moderator note (approval) or rejection reason.
    pub moderator_note: Option<String>,

    /// The reviewer who decided the idea.
    pub reviewed_by: Option<AccountId>,

    /// When the idea was submitted.
    pub created_at: DateTime<Utc>,

    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    /// Create a new idea in `Pending`.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        category: String,
        title: String,
        problem: String,
        solution: String,
        attachments: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: IdeaId::generate(),
            account_id,
            category,
            title,
            problem,
            solution,
            attachments,
            status: IdeaStatus::Pending,
            payout_paise: None,
            moderator_note: None,
            reviewed_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition `Pending -> Approved`, recording the payout and reviewer.
    ///
    /// # Errors
    ///
    /// - `MarketError::InvalidTransition` if the idea is already decided.
    /// - `MarketError::Validation` if `payout_paise` is not positive.
    pub fn approve(
        &mut self,
        reviewer: AccountId,
        payout_paise: i64,
        note: Option<String>,
    ) -> Result<(), MarketError> {
        if self.status != IdeaStatus::Pending {
            return Err(MarketError::InvalidTransition {
                from: self.status.as_str(),
                to: IdeaStatus::Approved.as_str(),
            });
        }
        if payout_paise <= 0 {
            return Err(MarketError::Validation(
                "payout amount must be positive".into(),
            ));
        }
        self.status = IdeaStatus::Approved;
        self.payout_paise = Some(payout_paise);
        self.moderator_note = note;
        self.reviewed_by = Some(reviewer);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Transition `Pending -> Rejected`, recording the reason and reviewer.
    ///
    /// # Errors
    ///
    /// - `MarketError::InvalidTransition` if the idea is already decided.
    /// - `MarketError::Validation` if `reason` is empty.
    pub fn reject(&mut self, reviewer: AccountId, reason: String) -> Result<(), MarketError> {
        if self.status != IdeaStatus::Pending {
            return Err(MarketError::InvalidTransition {
                from: self.status.as_str(),
                to: IdeaStatus::Rejected.as_str(),
            });
        }
        if reason.trim().is_empty() {
            return Err(MarketError::Validation(
                "rejection reason must not be empty".into(),
            ));
        }
        self.status = IdeaStatus::Rejected;
        self.moderator_note = Some(reason);
        self.reviewed_by = Some(reviewer);
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Idea lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdeaStatus {
    /// Awaiting review.
    Pending,

    /// Approved with a payout (terminal).
    Approved,

    /// Rejected with a reason (terminal).
    Rejected,
}

impl IdeaStatus {
    /// Stable lowercase name used in API filters and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for IdeaStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(MarketError::Validation(format!(
                "unknown idea status: {other}"
            ))),
        }
    }
}
