//! Withdrawal handlers.
//!
//! A withdrawal request debits the wallet immediately and holds the funds
//! until an administrator decides it. Approval settles the debit; rejection
//! returns the full amount, fee included.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use ideamint_core::{WithdrawalId, WithdrawalRequest, WithdrawalStatus};
use ideamint_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::Pagination;
use crate::notify::TemplateKind;
use crate::state::AppState;

/// Withdrawal response.
#[derive(Debug, Serialize)]
pub struct WithdrawalResponse {
    /// Withdrawal request ID.
    pub withdrawal_id: String,
    /// Gross amount debited, in paise.
    pub amount_paise: i64,
    /// Processing fee, in paise.
    pub fee_paise: i64,
    /// Net amount paid out on approval, in paise.
    pub net_paise: i64,
    /// Request status.
    pub status: WithdrawalStatus,
    /// Administrator note, set on decision.
    pub admin_note: Option<String>,
    /// Created timestamp.
    pub created_at: String,
    /// Last update.
    pub updated_at: String,
}

impl From<&WithdrawalRequest> for WithdrawalResponse {
    fn from(request: &WithdrawalRequest) -> Self {
        Self {
            withdrawal_id: request.id.to_string(),
            amount_paise: request.amount_paise,
            fee_paise: request.fee_paise,
            net_paise: request.net_paise,
            status: request.status,
            admin_note: request.admin_note.clone(),
            created_at: request.created_at.to_rfc3339(),
            updated_at: request.updated_at.to_rfc3339(),
        }
    }
}

/// Withdrawal request body.
#[derive(Debug, Deserialize)]
pub struct RequestWithdrawalBody {
    /// Gross amount to withdraw, in paise.
    pub amount_paise: i64,
}

/// Request a withdrawal, debiting the wallet immediately.
pub async fn request_withdrawal(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<RequestWithdrawalBody>,
) -> Result<Json<WithdrawalResponse>, ApiError> {
    if body.amount_paise <= 0 {
        return Err(ApiError::BadRequest("amount must be positive".into()));
    }

    let request = state
        .store
        .request_withdrawal(&auth.account_id, body.amount_paise)?;

    tracing::info!(
        withdrawal_id = %request.id,
        account_id = %auth.account_id,
        amount_paise = request.amount_paise,
        fee_paise = request.fee_paise,
        "Withdrawal requested"
    );

    Ok(Json(WithdrawalResponse::from(&request)))
}

/// List the current user's withdrawal requests, newest first.
pub async fn list_withdrawals(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<WithdrawalResponse>>, ApiError> {
    let (limit, offset) = page.bounds();
    let requests = state
        .store
        .list_withdrawals_by_account(&auth.account_id, limit, offset)?;

    Ok(Json(requests.iter().map(WithdrawalResponse::from).collect()))
}

/// Decision request body.
#[derive(Debug, Deserialize)]
pub struct DecideWithdrawalBody {
    /// `true` to approve, `false` to reject.
    pub approve: bool,
    /// Optional note shown to the requester.
    pub note: Option<String>,
}

/// Decide a pending withdrawal (administrators only).
pub async fn decide_withdrawal(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(withdrawal_id): Path<WithdrawalId>,
    Json(body): Json<DecideWithdrawalBody>,
) -> Result<Json<WithdrawalResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    if !account.role.is_admin() {
        return Err(ApiError::Forbidden);
    }

    let request = state.store.decide_withdrawal(
        &withdrawal_id,
        auth.account_id,
        body.approve,
        body.note,
    )?;

    tracing::info!(
        withdrawal_id = %request.id,
        admin = %auth.account_id,
        approved = body.approve,
        "Withdrawal decided"
    );

    state.notifier.notify(
        request.account_id,
        TemplateKind::WithdrawalDecided,
        serde_json::json!({
            "withdrawal_id": request.id.to_string(),
            "status": request.status,
            "amount_paise": request.amount_paise,
            "net_paise": request.net_paise,
        }),
    );

    Ok(Json(WithdrawalResponse::from(&request)))
}
