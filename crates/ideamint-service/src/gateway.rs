//! Payment gateway client.
//!
//! Thin wrapper over the gateway's order API. The service only ever creates
//! remote orders here; confirmation arrives as a signed callback handled in
//! the orders handler. Gateway calls happen outside any storage lock.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout for gateway requests.
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors from the payment gateway client.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request failed.
    #[error("gateway request failed: {0}")]
    Request(String),

    /// The gateway returned a non-success status.
    #[error("gateway returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },
}

/// Client for the external payment gateway.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    secret: String,
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    id: String,
}

impl GatewayClient {
    /// Create a new gateway client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, key_id: &str, secret: &str) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id: key_id.to_string(),
            secret: secret.to_string(),
        })
    }

    /// The public key id, exposed to the checkout page.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Create a remote order for the given amount in paise.
    ///
    /// Returns the gateway's order id.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway rejects it.
    pub async fn create_remote_order(
        &self,
        amount_paise: i64,
        receipt: &str,
    ) -> Result<String, GatewayError> {
        let url = format!("{}/v1/orders", self.base_url);
        let request = CreateOrderRequest {
            amount: amount_paise,
            currency: "INR",
            receipt,
        };

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.secret))
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, "Gateway order creation failed");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: body.chars().take(256).collect(),
            });
        }

        let order: CreateOrderResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        tracing::debug!(external_order_id = %order.id, amount_paise, "Gateway order created");
        Ok(order.id)
    }
}
