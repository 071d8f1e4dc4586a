//! Best-effort notification delivery.
//!
//! Notifications are fired after the triggering ledger mutation commits and
//! never hold it up: delivery runs on a spawned task and failures are only
//! logged. Retries are the notification service's problem, not ours.

use std::time::Duration;

use ideamint_core::AccountId;
use serde::Serialize;

/// Timeout for notification delivery.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Notification template kinds.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// An idea was approved with a payout.
    IdeaApproved,

    /// An idea was rejected with a reason.
    IdeaRejected,

    /// A coin purchase was credited.
    PurchaseCompleted,

    /// A withdrawal request was decided.
    WithdrawalDecided,
}

#[derive(Debug, Serialize)]
struct NotifyPayload {
    account_id: String,
    template: TemplateKind,
    data: serde_json::Value,
}

/// Fire-and-forget notification sender.
pub struct Notifier {
    http: reqwest::Client,
    url: Option<String>,
}

impl Notifier {
    /// Create a notifier. With no URL configured every notify is a logged no-op.
    #[must_use]
    pub fn new(url: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        if url.is_none() {
            tracing::warn!("NOTIFY_URL not configured - notifications will be dropped");
        }

        Self { http, url }
    }

    /// Queue a notification for delivery.
    pub fn notify(&self, account_id: AccountId, template: TemplateKind, data: serde_json::Value) {
        let Some(url) = self.url.clone() else {
            tracing::debug!(account_id = %account_id, ?template, "Notification dropped (no sink)");
            return;
        };

        let http = self.http.clone();
        let payload = NotifyPayload {
            account_id: account_id.to_string(),
            template,
            data,
        };

        tokio::spawn(async move {
            match http.post(&url).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(account_id = %payload.account_id, ?payload.template, "Notification delivered");
                }
                Ok(response) => {
                    tracing::warn!(
                        status = %response.status(),
                        account_id = %payload.account_id,
                        "Notification sink rejected event"
                    );
                }
                Err(e) => {
                    tracing::warn!(error = %e, account_id = %payload.account_id, "Notification delivery failed");
                }
            }
        });
    }
}
