//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ideamint_core::MarketError;
use ideamint_store::StoreError;
use serde::Serialize;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - valid credentials but insufficient role.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - duplicate resource or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Insufficient coins for the operation.
    #[error("insufficient coins: balance={balance}, required={required}")]
    InsufficientCoins {
        /// Current coin balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Insufficient wallet balance for the operation.
    #[error("insufficient balance: balance={balance_paise}, required={required_paise}")]
    InsufficientBalance {
        /// Current wallet balance in paise.
        balance_paise: i64,
        /// Required amount in paise.
        required_paise: i64,
    },

    /// Payment confirmation signature did not verify.
    #[error("invalid payment signature")]
    InvalidSignature,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InsufficientCoins { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_coins",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::InsufficientBalance {
                balance_paise,
                required_paise,
            } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_balance",
                self.to_string(),
                Some(serde_json::json!({
                    "balance_paise": balance_paise,
                    "required_paise": required_paise
                })),
            ),
            Self::InvalidSignature => (
                StatusCode::BAD_REQUEST,
                "invalid_signature",
                self.to_string(),
                None,
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        match err {
            MarketError::Validation(msg) => Self::BadRequest(msg),
            MarketError::InsufficientCoins { balance, required } => {
                Self::InsufficientCoins { balance, required }
            }
            MarketError::InsufficientBalance {
                balance_paise,
                required_paise,
            } => Self::InsufficientBalance {
                balance_paise,
                required_paise,
            },
            MarketError::BelowMinimum {
                requested_paise,
                minimum_paise,
            } => Self::BadRequest(format!(
                "withdrawal below minimum: requested={requested_paise}, minimum={minimum_paise}"
            )),
            MarketError::InvalidTransition { from, to } => {
                Self::Conflict(format!("invalid transition from {from} to {to}"))
            }
            MarketError::InvalidSignature => Self::InvalidSignature,
            MarketError::AccountNotFound { account_id } => {
                Self::NotFound(format!("account not found: {account_id}"))
            }
            MarketError::Storage(msg) => Self::Internal(msg),
            MarketError::InvalidId(e) => Self::BadRequest(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound(format!("{entity} not found: {id}")),
            StoreError::Duplicate { field, value } => {
                Self::Conflict(format!("duplicate {field}: {value}"))
            }
            StoreError::Domain(e) => e.into(),
            StoreError::CodeExhausted
            | StoreError::Database(_)
            | StoreError::Serialization(_) => Self::Internal(err.to_string()),
        }
    }
}
