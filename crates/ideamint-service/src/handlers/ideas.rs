//! Idea submission and review handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use ideamint_core::{
    Account, Idea, IdeaId, IdeaStatus, LedgerEntry, IDEA_SUBMISSION_COST_COINS,
};
use ideamint_store::{IdeaDecision, Store};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::Pagination;
use crate::notify::TemplateKind;
use crate::state::AppState;

/// Maximum length of an idea title.
const MAX_TITLE_LEN: usize = 200;

/// Maximum length of the problem and solution fields.
const MAX_BODY_LEN: usize = 10_000;

/// Idea response.
#[derive(Debug, Serialize)]
pub struct IdeaResponse {
    /// Idea ID.
    pub idea_id: String,
    /// Owning account ID.
    pub account_id: String,
    /// Category slug.
    pub category: String,
    /// Title.
    pub title: String,
    /// Problem statement.
    pub problem: String,
    /// Proposed solution.
    pub solution: String,
    /// Attachment storage keys.
    pub attachments: Vec<String>,
    /// Lifecycle status.
    pub status: IdeaStatus,
    /// Payout in paise, set on approval.
    pub payout_paise: Option<i64>,
    /// Moderator note or rejection reason.
    pub moderator_note: Option<String>,
    /// Submitted timestamp.
    pub created_at: String,
    /// Last status change.
    pub updated_at: String,
}

impl From<&Idea> for IdeaResponse {
    fn from(idea: &Idea) -> Self {
        Self {
            idea_id: idea.id.to_string(),
            account_id: idea.account_id.to_string(),
            category: idea.category.clone(),
            title: idea.title.clone(),
            problem: idea.problem.clone(),
            solution: idea.solution.clone(),
            attachments: idea.attachments.clone(),
            status: idea.status,
            payout_paise: idea.payout_paise,
            moderator_note: idea.moderator_note.clone(),
            created_at: idea.created_at.to_rfc3339(),
            updated_at: idea.updated_at.to_rfc3339(),
        }
    }
}

/// Idea submission request.
#[derive(Debug, Deserialize)]
pub struct SubmitIdeaRequest {
    /// Category slug.
    pub category: String,
    /// Title.
    pub title: String,
    /// Problem statement.
    pub problem: String,
    /// Proposed solution.
    pub solution: String,
    /// Attachment storage keys.
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Response for a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitIdeaResponse {
    /// The created idea.
    pub idea: IdeaResponse,
    /// Coins debited for the submission.
    pub coins_debited: i64,
    /// Coin balance after the debit.
    pub coin_balance: i64,
}

/// Submit a new idea, debiting the submission cost.
pub async fn submit_idea(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<SubmitIdeaRequest>,
) -> Result<Json<SubmitIdeaResponse>, ApiError> {
    validate_submission(&body)?;

    let idea = Idea::new(
        auth.account_id,
        body.category.trim().to_string(),
        body.title.trim().to_string(),
        body.problem.trim().to_string(),
        body.solution.trim().to_string(),
        body.attachments,
    );

    let cost_entry = LedgerEntry::idea_submission_cost(
        auth.account_id,
        IDEA_SUBMISSION_COST_COINS,
        &idea.id.to_string(),
    );

    let coin_balance = state.store.submit_idea(&idea, &cost_entry)?;

    tracing::info!(
        idea_id = %idea.id,
        account_id = %auth.account_id,
        coin_balance,
        "Idea submitted"
    );

    Ok(Json(SubmitIdeaResponse {
        idea: IdeaResponse::from(&idea),
        coins_debited: IDEA_SUBMISSION_COST_COINS,
        coin_balance,
    }))
}

fn validate_submission(body: &SubmitIdeaRequest) -> Result<(), ApiError> {
    if body.category.trim().is_empty() {
        return Err(ApiError::BadRequest("category must not be empty".into()));
    }
    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".into()));
    }
    if body.title.len() > MAX_TITLE_LEN {
        return Err(ApiError::BadRequest(format!(
            "title exceeds {MAX_TITLE_LEN} characters"
        )));
    }
    if body.problem.trim().is_empty() || body.solution.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "problem and solution must not be empty".into(),
        ));
    }
    if body.problem.len() > MAX_BODY_LEN || body.solution.len() > MAX_BODY_LEN {
        return Err(ApiError::BadRequest(format!(
            "problem and solution are limited to {MAX_BODY_LEN} characters"
        )));
    }
    Ok(())
}

/// List query for the caller's own ideas.
#[derive(Debug, Deserialize)]
pub struct ListIdeasQuery {
    /// Optional status filter (`pending`, `approved`, `rejected`).
    pub status: Option<String>,
    /// Maximum number of items to return.
    pub limit: Option<usize>,
    /// Number of items to skip.
    pub offset: Option<usize>,
}

/// List the current user's ideas, newest first.
pub async fn list_ideas(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListIdeasQuery>,
) -> Result<Json<Vec<IdeaResponse>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<IdeaStatus>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };
    let (limit, offset) = page.bounds();

    let ideas = state
        .store
        .list_ideas_by_account(&auth.account_id, status, limit, offset)?;

    Ok(Json(ideas.iter().map(IdeaResponse::from).collect()))
}

/// List the pending review queue, oldest first (moderators and admins).
pub async fn review_queue(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<IdeaResponse>>, ApiError> {
    require_reviewer(&state, &auth)?;

    let (limit, offset) = page.bounds();
    let ideas = state
        .store
        .list_ideas_by_status(IdeaStatus::Pending, limit, offset)?;

    Ok(Json(ideas.iter().map(IdeaResponse::from).collect()))
}

/// Approval request.
#[derive(Debug, Deserialize)]
pub struct ApproveIdeaRequest {
    /// Payout credited to the owner's wallet, in paise.
    pub payout_paise: i64,
    /// Optional moderator note.
    pub note: Option<String>,
}

/// Approve a pending idea, crediting the payout to the owner's wallet.
pub async fn approve_idea(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(idea_id): Path<IdeaId>,
    Json(body): Json<ApproveIdeaRequest>,
) -> Result<Json<IdeaResponse>, ApiError> {
    require_reviewer(&state, &auth)?;
    reject_self_review(&state, &auth, &idea_id)?;

    let idea = state.store.decide_idea(
        &idea_id,
        auth.account_id,
        IdeaDecision::Approve {
            payout_paise: body.payout_paise,
            note: body.note,
        },
    )?;

    tracing::info!(
        idea_id = %idea.id,
        reviewer = %auth.account_id,
        payout_paise = body.payout_paise,
        "Idea approved"
    );

    state.notifier.notify(
        idea.account_id,
        TemplateKind::IdeaApproved,
        serde_json::json!({
            "idea_id": idea.id.to_string(),
            "title": idea.title,
            "payout_paise": body.payout_paise,
        }),
    );

    Ok(Json(IdeaResponse::from(&idea)))
}

/// Rejection request.
#[derive(Debug, Deserialize)]
pub struct RejectIdeaRequest {
    /// The rejection reason shown to the owner.
    pub reason: String,
}

/// Reject a pending idea with a reason. No balance effect.
pub async fn reject_idea(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(idea_id): Path<IdeaId>,
    Json(body): Json<RejectIdeaRequest>,
) -> Result<Json<IdeaResponse>, ApiError> {
    require_reviewer(&state, &auth)?;
    reject_self_review(&state, &auth, &idea_id)?;

    let idea = state.store.decide_idea(
        &idea_id,
        auth.account_id,
        IdeaDecision::Reject {
            reason: body.reason,
        },
    )?;

    tracing::info!(idea_id = %idea.id, reviewer = %auth.account_id, "Idea rejected");

    state.notifier.notify(
        idea.account_id,
        TemplateKind::IdeaRejected,
        serde_json::json!({
            "idea_id": idea.id.to_string(),
            "title": idea.title,
            "reason": idea.moderator_note,
        }),
    );

    Ok(Json(IdeaResponse::from(&idea)))
}

/// Load the caller's account and require a reviewing role.
fn require_reviewer(state: &AppState, auth: &AuthUser) -> Result<Account, ApiError> {
    let account = state
        .store
        .get_account(&auth.account_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    if !account.role.can_review() {
        return Err(ApiError::Forbidden);
    }

    Ok(account)
}

/// Reviewers may not decide their own submissions.
fn reject_self_review(
    state: &AppState,
    auth: &AuthUser,
    idea_id: &IdeaId,
) -> Result<(), ApiError> {
    let idea = state
        .store
        .get_idea(idea_id)?
        .ok_or_else(|| ApiError::NotFound("Idea not found".into()))?;

    if idea.account_id == auth.account_id {
        return Err(ApiError::Forbidden);
    }

    Ok(())
}
