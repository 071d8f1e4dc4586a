//! Key encoding utilities for `RocksDB`.
//!
//! Primary records are keyed by their raw 16-byte ids. Per-account indexes
//! use `account_id || record_id` composite keys so an account's records can
//! be prefix-scanned; ledger entry ids are ULIDs, so that scan is also
//! chronological.

use ideamint_core::{AccountId, EntryId, IdeaId, IdeaStatus, OrderId, WithdrawalId};

/// Create an account key from an account ID.
#[must_use]
pub fn account_key(account_id: &AccountId) -> Vec<u8> {
    account_id.as_bytes().to_vec()
}

/// Create a unique-index key from an email or mobile string.
///
/// Normalized to lowercase so `A@x.com` and `a@x.com` collide.
#[must_use]
pub fn contact_key(value: &str) -> Vec<u8> {
    value.trim().to_lowercase().into_bytes()
}

/// Create a ledger entry key from an entry ID.
#[must_use]
pub fn entry_key(entry_id: &EntryId) -> Vec<u8> {
    entry_id.to_bytes().to_vec()
}

/// Create an `account_id || record_id` composite index key.
#[must_use]
pub fn account_index_key(account_id: &AccountId, record_id: &[u8; 16]) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(record_id);
    key
}

/// Create a prefix for iterating an account's index entries.
#[must_use]
pub fn account_prefix(account_id: &AccountId) -> Vec<u8> {
    account_id.as_bytes().to_vec()
}

/// Extract the trailing 16-byte record id from a composite index key.
///
/// Returns `None` if the key is shorter than 32 bytes.
#[must_use]
pub fn record_id_from_index_key(key: &[u8]) -> Option<[u8; 16]> {
    let tail = key.get(16..32)?;
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(tail);
    Some(bytes)
}

/// Create an idea key from an idea ID.
#[must_use]
pub fn idea_key(idea_id: &IdeaId) -> Vec<u8> {
    idea_id.as_bytes().to_vec()
}

/// Status discriminant byte for the ideas-by-status index.
#[must_use]
pub const fn status_byte(status: IdeaStatus) -> u8 {
    match status {
        IdeaStatus::Pending => 0,
        IdeaStatus::Approved => 1,
        IdeaStatus::Rejected => 2,
    }
}

/// Create a `status_byte || idea_id` index key.
#[must_use]
pub fn idea_status_key(status: IdeaStatus, idea_id: &IdeaId) -> Vec<u8> {
    let mut key = Vec::with_capacity(17);
    key.push(status_byte(status));
    key.extend_from_slice(idea_id.as_bytes());
    key
}

/// Extract the idea id from an ideas-by-status index key.
#[must_use]
pub fn idea_id_from_status_key(key: &[u8]) -> Option<[u8; 16]> {
    let tail = key.get(1..17)?;
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(tail);
    Some(bytes)
}

/// Create a referral code key.
#[must_use]
pub fn referral_code_key(code: &str) -> Vec<u8> {
    code.as_bytes().to_vec()
}

/// Create an order key from an internal order ID.
#[must_use]
pub fn order_key(order_id: &OrderId) -> Vec<u8> {
    order_id.as_bytes().to_vec()
}

/// Create an external-order-id index key.
#[must_use]
pub fn external_order_key(external_order_id: &str) -> Vec<u8> {
    external_order_id.as_bytes().to_vec()
}

/// Create a withdrawal key from a withdrawal ID.
#[must_use]
pub fn withdrawal_key(withdrawal_id: &WithdrawalId) -> Vec<u8> {
    withdrawal_id.as_bytes().to_vec()
}
