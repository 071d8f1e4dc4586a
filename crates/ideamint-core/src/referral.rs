//! Referral codes.
//!
//! Each account gets one code at registration. Redeeming a code during a
//! later registration increments the code's counter exactly once and earns
//! the owner a referral bonus through the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::AccountId;

/// Length of a generated referral code.
pub const REFERRAL_CODE_LEN: usize = 8;

/// A referral code and its redemption counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralCode {
    /// The owning account.
    pub account_id: AccountId,

    /// The code itself (unique across accounts).
    pub code: String,

    /// Completed referred registrations.
    pub total_referrals: i64,

    /// Inactive codes cannot be redeemed.
    pub active: bool,

    /// When the code was issued.
    pub created_at: DateTime<Utc>,
}

impl ReferralCode {
    /// Issue a code for an account.
    #[must_use]
    pub fn new(account_id: AccountId, code: String) -> Self {
        Self {
            account_id,
            code,
            total_referrals: 0,
            active: true,
            created_at: Utc::now(),
        }
    }
}

/// Generate a candidate referral code.
///
/// Uniqueness is enforced by the store's code index; callers retry with a
/// fresh candidate on collision.
#[must_use]
pub fn generate_code() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex.chars()
        .take(REFERRAL_CODE_LEN)
        .collect::<String>()
        .to_uppercase()
}
