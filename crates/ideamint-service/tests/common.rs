//! Common test utilities for ideamint integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use tempfile::TempDir;

use ideamint_core::{AccountId, Role};
use ideamint_service::auth::JwtClaims;
use ideamint_service::{create_router, AppState, ServiceConfig};
use ideamint_store::RocksStore;

/// HS256 secret shared with the service under test.
pub const TEST_AUTH_SECRET: &str = "test-auth-secret";

/// Gateway shared secret used to sign payment confirmations.
pub const TEST_GATEWAY_SECRET: &str = "test-gateway-secret";

/// Admin API key for operator endpoints.
pub const TEST_ADMIN_KEY: &str = "test-admin-key";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test account ID for authenticated requests.
    pub test_account_id: AccountId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and no gateway client.
    ///
    /// The gateway secret is still configured so confirmation callbacks can
    /// be verified; only order creation needs a reachable gateway.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a harness whose gateway client points at the given base URL
    /// (typically a wiremock server).
    pub fn with_gateway(gateway_base_url: &str) -> Self {
        Self::build(Some(gateway_base_url.to_string()))
    }

    fn build(gateway_base_url: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            auth_secret: TEST_AUTH_SECRET.into(),
            gateway_base_url,
            gateway_key_id: Some("key_test".into()),
            gateway_secret: Some(TEST_GATEWAY_SECRET.into()),
            notify_url: None,
            admin_api_key: Some(TEST_ADMIN_KEY.into()),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_account_id = AccountId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            test_account_id,
        }
    }

    /// Mint a bearer token for the default test account.
    pub fn auth_header(&self) -> String {
        Self::auth_header_for(self.test_account_id)
    }

    /// Mint a bearer token for an arbitrary account.
    pub fn auth_header_for(account_id: AccountId) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            sub: account_id.to_string(),
            exp: now + 3600,
            iat: now,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_AUTH_SECRET.as_bytes()),
        )
        .expect("Failed to mint test token");

        format!("Bearer {token}")
    }

    /// Register an account through the API and return the response body.
    pub async fn register(
        &self,
        account_id: AccountId,
        name: &str,
        email: &str,
        mobile: &str,
        referral_code: Option<&str>,
    ) -> serde_json::Value {
        let mut body = json!({
            "display_name": name,
            "email": email,
            "mobile": mobile,
        });
        if let Some(code) = referral_code {
            body["referral_code"] = json!(code);
        }

        let response = self
            .server
            .post("/v1/accounts")
            .add_header("authorization", Self::auth_header_for(account_id))
            .json(&body)
            .await;

        response.assert_status_ok();
        response.json()
    }

    /// Register the default test account.
    pub async fn register_default(&self) -> serde_json::Value {
        self.register(
            self.test_account_id,
            "Asha",
            &format!("{}@example.com", self.test_account_id),
            &mobile_for(self.test_account_id),
            None,
        )
        .await
    }

    /// Promote an account through the operator endpoint.
    pub async fn set_role(&self, account_id: AccountId, role: Role) {
        let role = match role {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        };

        self.server
            .post(&format!("/v1/accounts/{account_id}/role"))
            .add_header("x-admin-key", TEST_ADMIN_KEY)
            .json(&json!({ "role": role }))
            .await
            .assert_status_ok();
    }

    /// Register a second account with a reviewing role and return its id.
    pub async fn register_reviewer(&self, role: Role) -> AccountId {
        let reviewer = AccountId::generate();
        self.register(
            reviewer,
            "Meera",
            &format!("{reviewer}@example.com"),
            &mobile_for(reviewer),
            None,
        )
        .await;
        self.set_role(reviewer, role).await;
        reviewer
    }

    /// Sign a payment confirmation the way the gateway would.
    pub fn sign_confirmation(order_id: &str, payment_id: &str) -> String {
        ideamint_service::crypto::hmac_sha256_hex(
            TEST_GATEWAY_SECRET,
            &format!("{order_id}|{payment_id}"),
        )
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a unique ten-digit mobile number from an account id.
pub fn mobile_for(account_id: AccountId) -> String {
    let bytes = account_id.as_bytes();
    format!(
        "9{:03}{:03}{:03}",
        u16::from(bytes[0]) % 1000,
        u16::from(bytes[1]) % 1000,
        u16::from(bytes[2]) % 1000
    )
}
