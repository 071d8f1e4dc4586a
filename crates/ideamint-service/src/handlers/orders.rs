//! Coin purchase handlers.
//!
//! Purchases are a two-step flow: `create_order` opens a checkout against
//! the payment gateway and records the order as `Created`; the gateway's
//! signed confirmation lands on `confirm_order`, which credits the coins
//! exactly once.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use ideamint_core::{pack_price_paise, CoinPack, OrderStatus, PaymentOrder, COIN_PACKS};
use ideamint_store::{ConfirmOutcome, Store};

use crate::auth::AuthUser;
use crate::crypto::verify_confirmation_signature;
use crate::error::ApiError;
use crate::handlers::Pagination;
use crate::notify::TemplateKind;
use crate::state::AppState;

/// Coin pack menu response.
#[derive(Debug, Serialize)]
pub struct CoinPacksResponse {
    /// Available packs.
    pub packs: Vec<CoinPack>,
    /// Gateway key id for the checkout page, when purchases are enabled.
    pub gateway_key_id: Option<String>,
}

/// List the purchasable coin packs.
pub async fn list_packs(State(state): State<Arc<AppState>>) -> Json<CoinPacksResponse> {
    Json(CoinPacksResponse {
        packs: COIN_PACKS.to_vec(),
        gateway_key_id: state.gateway.as_ref().map(|g| g.key_id().to_string()),
    })
}

/// Order response.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// Internal order ID.
    pub order_id: String,
    /// Coins credited on completion.
    pub coin_amount: i64,
    /// Price in paise.
    pub currency_amount_paise: i64,
    /// Order status.
    pub status: OrderStatus,
    /// Gateway order id, used by the checkout page.
    pub external_order_id: String,
    /// Gateway payment id, set on completion.
    pub external_payment_id: Option<String>,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&PaymentOrder> for OrderResponse {
    fn from(order: &PaymentOrder) -> Self {
        Self {
            order_id: order.id.to_string(),
            coin_amount: order.coin_amount,
            currency_amount_paise: order.currency_amount_paise,
            status: order.status,
            external_order_id: order.external_order_id.clone(),
            external_payment_id: order.external_payment_id.clone(),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

/// Create order request.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Coins to purchase; must match a listed pack.
    pub coins: i64,
}

/// Open a checkout for a coin pack.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    // Orders are only accepted for listed packs; arbitrary amounts would
    // let clients set their own price.
    let price_paise = pack_price_paise(body.coins)
        .ok_or_else(|| ApiError::BadRequest(format!("no coin pack with {} coins", body.coins)))?;

    if state.store.get_account(&auth.account_id)?.is_none() {
        return Err(ApiError::NotFound("Account not found".into()));
    }

    let gateway = state
        .gateway
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Payment gateway is not configured".into()))?;

    let receipt = format!("rcpt_{}", uuid::Uuid::new_v4().simple());
    let external_order_id = gateway
        .create_remote_order(price_paise, &receipt)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, account_id = %auth.account_id, "Gateway order failed");
            ApiError::ExternalService("Failed to create payment order".into())
        })?;

    let order = PaymentOrder::new(auth.account_id, body.coins, price_paise, external_order_id);
    state.store.create_order(&order)?;

    tracing::info!(
        order_id = %order.id,
        account_id = %auth.account_id,
        coins = body.coins,
        price_paise,
        "Order created"
    );

    Ok(Json(OrderResponse::from(&order)))
}

/// Payment confirmation callback from the gateway.
#[derive(Debug, Deserialize)]
pub struct ConfirmOrderRequest {
    /// Gateway order id.
    pub external_order_id: String,
    /// Gateway payment id.
    pub external_payment_id: String,
    /// HMAC-SHA256 signature over `"{order_id}|{payment_id}"`.
    pub signature: String,
}

/// Confirmation response.
#[derive(Debug, Serialize)]
pub struct ConfirmOrderResponse {
    /// The order after confirmation.
    pub order: OrderResponse,
    /// Whether this confirmation was a replay of an already completed order.
    pub already_processed: bool,
    /// Coin balance after the credit (first confirmation only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin_balance: Option<i64>,
}

/// Confirm a payment and credit coins exactly once.
///
/// Unauthenticated: the gateway calls this endpoint directly, so the
/// signature is the only credential.
pub async fn confirm_order(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConfirmOrderRequest>,
) -> Result<Json<ConfirmOrderResponse>, ApiError> {
    let secret = state
        .config
        .gateway_secret
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Payment gateway is not configured".into()))?;

    if !verify_confirmation_signature(
        secret,
        &body.external_order_id,
        &body.external_payment_id,
        &body.signature,
    ) {
        tracing::warn!(
            external_order_id = %body.external_order_id,
            "Payment confirmation signature rejected"
        );
        return Err(ApiError::InvalidSignature);
    }

    let outcome = state
        .store
        .confirm_order(&body.external_order_id, &body.external_payment_id)?;

    let response = match outcome {
        ConfirmOutcome::Credited {
            order,
            coin_balance,
        } => {
            tracing::info!(
                order_id = %order.id,
                account_id = %order.account_id,
                coins = order.coin_amount,
                coin_balance,
                "Payment confirmed, coins credited"
            );

            state.notifier.notify(
                order.account_id,
                TemplateKind::PurchaseCompleted,
                serde_json::json!({
                    "order_id": order.id.to_string(),
                    "coins": order.coin_amount,
                    "amount_paise": order.currency_amount_paise,
                }),
            );

            ConfirmOrderResponse {
                order: OrderResponse::from(&order),
                already_processed: false,
                coin_balance: Some(coin_balance),
            }
        }
        ConfirmOutcome::AlreadyProcessed { order } => {
            tracing::info!(
                order_id = %order.id,
                external_order_id = %body.external_order_id,
                "Duplicate payment confirmation ignored"
            );

            ConfirmOrderResponse {
                order: OrderResponse::from(&order),
                already_processed: true,
                coin_balance: None,
            }
        }
    };

    Ok(Json(response))
}

/// List the current user's orders, newest first.
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let (limit, offset) = page.bounds();
    let orders = state
        .store
        .list_orders_by_account(&auth.account_id, limit, offset)?;

    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}
