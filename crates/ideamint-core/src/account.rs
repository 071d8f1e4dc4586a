//! Account types for ideamint.
//!
//! An account carries two balances: a coin balance (non-monetary submission
//! credits) and a wallet balance in paise (monetary, withdrawable). Both are
//! running sums over the account's ledger entries and are never mutated
//! outside a ledger append.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::AccountId;

/// Coins debited per idea submission.
pub const IDEA_SUBMISSION_COST_COINS: i64 = 2;

/// Coins granted to every new account at registration.
pub const SIGNUP_BONUS_COINS: i64 = 10;

/// Coins granted to the referrer when a referred registration completes.
pub const REFERRAL_BONUS_COINS: i64 = 5;

/// A user account with its two running balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID.
    pub id: AccountId,

    /// Display name shown on listings.
    pub display_name: String,

    /// Email address (unique across accounts).
    pub email: String,

    /// Mobile number (unique across accounts).
    pub mobile: String,

    /// Coin balance. Always the sum of `coin_delta` over the account's
    /// ledger entries; never negative.
    pub coins: i64,

    /// Wallet balance in paise. Always the sum of `currency_delta_paise`
    /// over the account's ledger entries; never negative.
    pub wallet_paise: i64,

    /// Role controlling review/admin authorization.
    pub role: Role,

    /// This account's own referral code, if one was issued.
    pub referral_code: Option<String>,

    /// The account whose code was redeemed at registration, if any.
    /// Lookup-only back-reference, never an ownership edge.
    pub referred_by: Option<AccountId>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with zero balances and the `User` role.
    #[must_use]
    pub fn new(id: AccountId, display_name: String, email: String, mobile: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            display_name,
            email,
            mobile,
            coins: 0,
            wallet_paise: 0,
            role: Role::User,
            referral_code: None,
            referred_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account can cover a coin debit.
    #[must_use]
    pub const fn has_sufficient_coins(&self, amount: i64) -> bool {
        self.coins >= amount
    }

    /// Check if the account can cover a wallet debit.
    #[must_use]
    pub const fn has_sufficient_balance(&self, amount_paise: i64) -> bool {
        self.wallet_paise >= amount_paise
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular user: submits ideas, buys coins, withdraws.
    User,

    /// Moderator: reviews pending ideas.
    Moderator,

    /// Administrator: decides withdrawal requests; implies moderator rights.
    Admin,
}

impl Role {
    /// Whether this role may approve or reject ideas.
    #[must_use]
    pub const fn can_review(self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }

    /// Whether this role may decide withdrawal requests.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_has_zero_balances() {
        let account = Account::new(
            AccountId::generate(),
            "Asha".into(),
            "asha@example.com".into(),
            "9800000001".into(),
        );
        assert_eq!(account.coins, 0);
        assert_eq!(account.wallet_paise, 0);
        assert_eq!(account.role, Role::User);
        assert!(account.referral_code.is_none());
        assert!(account.referred_by.is_none());
    }

    #[test]
    fn sufficient_coins_boundary() {
        let mut account = Account::new(
            AccountId::generate(),
            "Asha".into(),
            "asha@example.com".into(),
            "9800000001".into(),
        );
        account.coins = 2;
        assert!(account.has_sufficient_coins(2));
        assert!(!account.has_sufficient_coins(3));
    }

    #[test]
    fn role_permissions() {
        assert!(!Role::User.can_review());
        assert!(Role::Moderator.can_review());
        assert!(Role::Admin.can_review());

        assert!(!Role::User.is_admin());
        assert!(!Role::Moderator.is_admin());
        assert!(Role::Admin.is_admin());
    }
}
