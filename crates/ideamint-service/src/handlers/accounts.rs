//! Account management handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use ideamint_core::{Account, AccountId, LedgerEntry, Role};
use ideamint_store::Store;

use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::handlers::Pagination;
use crate::state::AppState;

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub account_id: String,
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Mobile number.
    pub mobile: String,
    /// Current coin balance.
    pub coins: i64,
    /// Wallet balance in paise.
    pub wallet_paise: i64,
    /// Wallet balance formatted as rupees.
    pub wallet_formatted: String,
    /// Account role.
    pub role: Role,
    /// This account's referral code.
    pub referral_code: Option<String>,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&Account> for AccountResponse {
    #[allow(clippy::cast_precision_loss)]
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id.to_string(),
            display_name: account.display_name.clone(),
            email: account.email.clone(),
            mobile: account.mobile.clone(),
            coins: account.coins,
            wallet_paise: account.wallet_paise,
            wallet_formatted: format!("₹{:.2}", account.wallet_paise as f64 / 100.0),
            role: account.role,
            referral_code: account.referral_code.clone(),
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Register account request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Display name.
    pub display_name: String,
    /// Email address (must be unique).
    pub email: String,
    /// Mobile number (must be unique).
    pub mobile: String,
    /// Another account's referral code to redeem (optional).
    pub referral_code: Option<String>,
}

/// Register a new account for the authenticated subject.
///
/// Grants the signup bonus, issues a referral code, and redeems the given
/// referral code if it resolves to an active account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    if body.display_name.trim().is_empty() {
        return Err(ApiError::BadRequest("display_name must not be empty".into()));
    }
    if body.email.trim().is_empty() || !body.email.contains('@') {
        return Err(ApiError::BadRequest("a valid email is required".into()));
    }
    if body.mobile.trim().is_empty() {
        return Err(ApiError::BadRequest("mobile must not be empty".into()));
    }

    if state.store.get_account(&auth.account_id)?.is_some() {
        return Err(ApiError::Conflict("Account already exists".into()));
    }

    let account = Account::new(
        auth.account_id,
        body.display_name.trim().to_string(),
        body.email.trim().to_string(),
        body.mobile.trim().to_string(),
    );

    let account = state
        .store
        .register_account(account, body.referral_code.as_deref())?;

    tracing::info!(account_id = %account.id, "Account registered");

    Ok(Json(AccountResponse::from(&account)))
}

/// Get the current user's account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(AccountResponse::from(&account)))
}

/// Ledger entry response.
#[derive(Debug, Serialize)]
pub struct LedgerEntryResponse {
    /// Entry ID.
    pub entry_id: String,
    /// Entry kind.
    pub kind: ideamint_core::EntryKind,
    /// Signed coin delta.
    pub coin_delta: i64,
    /// Signed wallet delta in paise.
    pub currency_delta_paise: i64,
    /// Entry status.
    pub status: ideamint_core::EntryStatus,
    /// External reference, if any.
    pub reference: Option<String>,
    /// Description.
    pub description: String,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&LedgerEntry> for LedgerEntryResponse {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            entry_id: entry.id.to_string(),
            kind: entry.kind,
            coin_delta: entry.coin_delta,
            currency_delta_paise: entry.currency_delta_paise,
            status: entry.status,
            reference: entry.reference.clone(),
            description: entry.description.clone(),
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Ledger history response.
#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    /// Entries, newest first.
    pub entries: Vec<LedgerEntryResponse>,
    /// Coin balance after all entries.
    pub coins: i64,
    /// Wallet balance after all entries, in paise.
    pub wallet_paise: i64,
}

/// List the current user's ledger entries, newest first.
pub async fn list_ledger(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(page): Query<Pagination>,
) -> Result<Json<LedgerResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let (limit, offset) = page.bounds();
    let entries = state
        .store
        .list_entries_by_account(&auth.account_id, limit, offset)?;

    Ok(Json(LedgerResponse {
        entries: entries.iter().map(LedgerEntryResponse::from).collect(),
        coins: account.coins,
        wallet_paise: account.wallet_paise,
    }))
}

/// Role change request.
#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    /// New role for the account.
    pub role: Role,
}

/// Change an account's role (operator endpoint, `X-Admin-Key` auth).
pub async fn set_role(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Path(account_id): Path<AccountId>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.store.set_role(&account_id, body.role)?;

    tracing::info!(
        account_id = %account_id,
        role = ?body.role,
        admin_id = %admin.admin_id,
        "Account role changed"
    );

    Ok(Json(AccountResponse::from(&account)))
}
