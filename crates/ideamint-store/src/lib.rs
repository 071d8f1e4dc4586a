//! `RocksDB` storage layer for ideamint.
//!
//! This crate is the only path to balance mutation: every operation that
//! moves coins or wallet money appends a ledger entry and updates the
//! account's running balances in one atomic `WriteBatch`, with a store-level
//! write lock serializing the read-check-write window. Partial application
//! (an entry without its balance effect, or vice versa) cannot be observed.
//!
//! # Column families
//!
//! - `accounts` (+ unique email/mobile indexes)
//! - `ledger` (+ per-account index; entry ids are ULIDs, so the index is
//!   chronological)
//! - `ideas` (+ per-account and per-status indexes)
//! - `referral_codes` (keyed by code; uniqueness guard)
//! - `orders` (+ unique external-order-id index and per-account index)
//! - `withdrawals` (+ per-account index)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use ideamint_core::{
    Account, AccountId, EntryId, Idea, IdeaId, IdeaStatus, LedgerEntry, OrderId, PaymentOrder,
    ReferralCode, Role, WithdrawalId, WithdrawalRequest,
};

/// Outcome of a payment confirmation.
#[derive(Debug)]
pub enum ConfirmOutcome {
    /// First confirmation for this order: coins were credited.
    Credited {
        /// The completed order.
        order: PaymentOrder,
        /// The account's coin balance after the credit.
        coin_balance: i64,
    },

    /// The order was already completed; nothing changed.
    AlreadyProcessed {
        /// The previously completed order.
        order: PaymentOrder,
    },
}

/// A reviewer's decision on a pending idea.
#[derive(Debug, Clone)]
pub enum IdeaDecision {
    /// Approve with a payout (paise) and optional note.
    Approve {
        /// Payout credited to the owner's wallet.
        payout_paise: i64,
        /// Optional moderator note.
        note: Option<String>,
    },

    /// Reject with a reason.
    Reject {
        /// The rejection reason shown to the owner.
        reason: String,
    },
}

/// The storage trait defining all database operations.
///
/// Abstracts the storage layer so the service can be tested against
/// alternative implementations.
pub trait Store: Send + Sync {
    // =========================================================================
    // Accounts & Registration
    // =========================================================================

    /// Register a new account: enforce email/mobile uniqueness, issue a
    /// unique referral code, grant the signup bonus, and redeem the given
    /// referral code (bonus to the referrer) if it resolves. One atomic unit.
    ///
    /// Returns the stored account with its code, balances and back-reference
    /// filled in. An unknown or inactive referral code is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if the email or mobile is taken.
    fn register_account(&self, account: Account, referral_code: Option<&str>) -> Result<Account>;

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>>;

    /// Look up an account by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Change an account's role (administrator operation).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn set_role(&self, account_id: &AccountId, role: Role) -> Result<Account>;

    // =========================================================================
    // Ledger
    // =========================================================================

    /// Append a ledger entry and apply its deltas to the account's running
    /// balances atomically. Fails without writing anything if either
    /// resulting balance would go negative.
    ///
    /// Returns `(coin_balance, wallet_paise)` after the append.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::Domain` with `InsufficientCoins` / `InsufficientBalance`
    ///   if a balance precondition fails.
    fn append_entry(&self, entry: &LedgerEntry) -> Result<(i64, i64)>;

    /// Get a ledger entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_entry(&self, entry_id: &EntryId) -> Result<Option<LedgerEntry>>;

    /// List an account's ledger entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_entries_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerEntry>>;

    // =========================================================================
    // Ideas
    // =========================================================================

    /// Debit the submission cost and create the idea in `Pending` as one
    /// unit. If the debit fails, the idea is not created.
    ///
    /// Returns the coin balance after the debit.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::Domain(InsufficientCoins)` if coins cannot cover the cost.
    fn submit_idea(&self, idea: &Idea, cost_entry: &LedgerEntry) -> Result<i64>;

    /// Get an idea by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_idea(&self, idea_id: &IdeaId) -> Result<Option<Idea>>;

    /// Decide a pending idea. Approval credits the owner's wallet in the
    /// same unit as the status change; rejection has no balance effect.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the idea doesn't exist.
    /// - `StoreError::Domain(InvalidTransition)` if the idea is already decided.
    /// - `StoreError::Domain(Validation)` for a non-positive payout or empty
    ///   reason.
    fn decide_idea(
        &self,
        idea_id: &IdeaId,
        reviewer: AccountId,
        decision: IdeaDecision,
    ) -> Result<Idea>;

    /// List an account's ideas, newest first, optionally restricted to one
    /// status. The filter applies before `limit`/`offset`, so a filtered
    /// page walks matching ideas only.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_ideas_by_account(
        &self,
        account_id: &AccountId,
        status: Option<IdeaStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Idea>>;

    /// List ideas in a given status (the moderation queue for `Pending`).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_ideas_by_status(
        &self,
        status: IdeaStatus,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Idea>>;

    // =========================================================================
    // Referrals
    // =========================================================================

    /// Look up a referral code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_referral_code(&self, code: &str) -> Result<Option<ReferralCode>>;

    // =========================================================================
    // Payment Orders
    // =========================================================================

    /// Persist a freshly created order (status `Created`).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if the external order id is taken.
    fn create_order(&self, order: &PaymentOrder) -> Result<()>;

    /// Get an order by internal ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_order(&self, order_id: &OrderId) -> Result<Option<PaymentOrder>>;

    /// Look up an order by the gateway's order id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_order_by_external(&self, external_order_id: &str) -> Result<Option<PaymentOrder>>;

    /// Complete an order and credit its coins exactly once. The
    /// `Created -> Completed` flip is the idempotency gate: a second call
    /// for the same external order id observes `AlreadyProcessed`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no order has this external id.
    fn confirm_order(
        &self,
        external_order_id: &str,
        external_payment_id: &str,
    ) -> Result<ConfirmOutcome>;

    /// List an account's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_orders_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<PaymentOrder>>;

    // =========================================================================
    // Withdrawals
    // =========================================================================

    /// Debit the wallet and create a pending withdrawal request as one unit.
    /// The wallet is never debited on failure.
    ///
    /// # Errors
    ///
    /// - `StoreError::Domain(BelowMinimum)` under the minimum amount.
    /// - `StoreError::Domain(InsufficientBalance)` over the wallet balance.
    fn request_withdrawal(
        &self,
        account_id: &AccountId,
        amount_paise: i64,
    ) -> Result<WithdrawalRequest>;

    /// Get a withdrawal request by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_withdrawal(&self, withdrawal_id: &WithdrawalId) -> Result<Option<WithdrawalRequest>>;

    /// Decide a pending withdrawal. Approval settles the held debit;
    /// rejection appends a compensating credit restoring the full amount,
    /// in the same atomic unit as the status change.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the request doesn't exist.
    /// - `StoreError::Domain(InvalidTransition)` if already decided.
    fn decide_withdrawal(
        &self,
        withdrawal_id: &WithdrawalId,
        admin: AccountId,
        approve: bool,
        note: Option<String>,
    ) -> Result<WithdrawalRequest>;

    /// List an account's withdrawal requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_withdrawals_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<WithdrawalRequest>>;
}
