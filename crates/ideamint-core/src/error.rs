//! Error types for ideamint.

use crate::ids::IdError;

/// Result type for ideamint operations.
pub type Result<T> = std::result::Result<T, MarketError>;

/// Errors that can occur in marketplace operations.
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// Malformed or missing input, rejected before any mutation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Coin balance cannot cover the debit.
    #[error("insufficient coins: balance={balance}, required={required}")]
    InsufficientCoins {
        /// Current coin balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Wallet balance cannot cover the debit.
    #[error("insufficient balance: balance={balance_paise}, required={required_paise}")]
    InsufficientBalance {
        /// Current wallet balance in paise.
        balance_paise: i64,
        /// Required amount in paise.
        required_paise: i64,
    },

    /// Withdrawal amount below the configured minimum.
    #[error("withdrawal below minimum: requested={requested_paise}, minimum={minimum_paise}")]
    BelowMinimum {
        /// Requested amount in paise.
        requested_paise: i64,
        /// Minimum allowed amount in paise.
        minimum_paise: i64,
    },

    /// State-machine precondition failed, rejected before any mutation.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        /// The current state.
        from: &'static str,
        /// The attempted target state.
        to: &'static str,
    },

    /// Payment confirmation signature did not verify.
    #[error("invalid payment signature")]
    InvalidSignature,

    /// Account not found.
    #[error("account not found: {account_id}")]
    AccountNotFound {
        /// The account ID that was not found.
        account_id: String,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
