//! Error types for ideamint storage.

use ideamint_core::MarketError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The entity type.
        entity: &'static str,
        /// The looked-up identifier.
        id: String,
    },

    /// A unique field (email, mobile, external order id) is already taken.
    #[error("duplicate {field}: {value}")]
    Duplicate {
        /// The conflicting field.
        field: &'static str,
        /// The conflicting value.
        value: String,
    },

    /// Referral code generation kept colliding.
    #[error("could not generate a unique referral code")]
    CodeExhausted,

    /// Domain precondition failed (balance, transition, validation).
    #[error(transparent)]
    Domain(#[from] MarketError),
}

impl StoreError {
    /// Shorthand for a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
