//! Application state.

use std::sync::Arc;

use ideamint_store::RocksStore;

use crate::config::ServiceConfig;
use crate::gateway::GatewayClient;
use crate::notify::Notifier;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Payment gateway client (optional).
    pub gateway: Option<Arc<GatewayClient>>,

    /// Best-effort notification sender.
    pub notifier: Arc<Notifier>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        // Create gateway client if configured
        let gateway = config
            .gateway_base_url
            .as_ref()
            .zip(config.gateway_key_id.as_ref())
            .zip(config.gateway_secret.as_ref())
            .and_then(|((url, key_id), secret)| {
                match GatewayClient::new(url, key_id, secret) {
                    Ok(client) => {
                        tracing::info!(gateway_url = %url, "Payment gateway enabled");
                        Some(Arc::new(client))
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to create gateway client");
                        None
                    }
                }
            });

        if gateway.is_none() {
            tracing::warn!("Payment gateway not configured - coin purchases will not be available");
        }

        let notifier = Arc::new(Notifier::new(config.notify_url.clone()));

        Self {
            store,
            config,
            gateway,
            notifier,
        }
    }

    /// Check if the payment gateway is configured.
    #[must_use]
    pub fn has_gateway(&self) -> bool {
        self.gateway.is_some()
    }
}
