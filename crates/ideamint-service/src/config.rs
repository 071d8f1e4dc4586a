//! Service configuration.

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to the `RocksDB` data directory (default: "/data/ideamint").
    pub data_dir: String,

    /// HS256 secret for bearer token validation.
    pub auth_secret: String,

    /// Payment gateway base URL (optional; purchases disabled without it).
    pub gateway_base_url: Option<String>,

    /// Payment gateway key id, sent with order creation.
    pub gateway_key_id: Option<String>,

    /// Payment gateway shared secret: authenticates order creation and
    /// verifies confirmation signatures.
    pub gateway_secret: Option<String>,

    /// Notification service webhook URL (optional; best-effort).
    pub notify_url: Option<String>,

    /// Admin API key for privileged endpoints (role changes).
    pub admin_api_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/ideamint".into()),
            auth_secret: std::env::var("AUTH_SECRET").unwrap_or_else(|_| {
                tracing::warn!("AUTH_SECRET not set - using an insecure default");
                "insecure-dev-secret".into()
            }),
            gateway_base_url: std::env::var("GATEWAY_BASE_URL").ok(),
            gateway_key_id: std::env::var("GATEWAY_KEY_ID").ok(),
            gateway_secret: std::env::var("GATEWAY_SECRET").ok(),
            notify_url: std::env::var("NOTIFY_URL").ok(),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/ideamint".into(),
            auth_secret: "insecure-dev-secret".into(),
            gateway_base_url: None,
            gateway_key_id: None,
            gateway_secret: None,
            notify_url: None,
            admin_api_key: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
