//! Coin purchase integration tests.

mod common;

use common::TestHarness;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn gateway_harness(external_order_id: &str) -> (TestHarness, MockServer) {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": external_order_id,
        })))
        .mount(&mock_server)
        .await;

    let harness = TestHarness::with_gateway(&mock_server.uri());
    (harness, mock_server)
}

#[tokio::test]
async fn coin_packs_are_listed_publicly() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/coin-packs").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let packs = body["packs"].as_array().unwrap();
    assert_eq!(packs.len(), 3);
    assert_eq!(packs[0]["coins"], 10);
    assert_eq!(packs[0]["price_paise"], 7_900);
    assert_eq!(packs[1]["coins"], 50);
    assert_eq!(packs[1]["price_paise"], 34_900);
    assert_eq!(packs[2]["coins"], 120);
    assert_eq!(packs[2]["price_paise"], 79_900);
}

#[tokio::test]
async fn create_order_opens_gateway_checkout() {
    let (harness, _mock) = gateway_harness("ord_ext_1").await;
    harness.register_default().await;

    let response = harness
        .server
        .post("/v1/orders")
        .add_header("authorization", harness.auth_header())
        .json(&json!({ "coins": 50 }))
        .await;

    response.assert_status_ok();
    let order: serde_json::Value = response.json();
    assert_eq!(order["coin_amount"], 50);
    assert_eq!(order["currency_amount_paise"], 34_900);
    assert_eq!(order["status"], "created");
    assert_eq!(order["external_order_id"], "ord_ext_1");
}

#[tokio::test]
async fn create_order_rejects_unlisted_amounts() {
    let (harness, _mock) = gateway_harness("ord_ext_2").await;
    harness.register_default().await;

    let response = harness
        .server
        .post("/v1/orders")
        .add_header("authorization", harness.auth_header())
        .json(&json!({ "coins": 51 }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn create_order_surfaces_gateway_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let harness = TestHarness::with_gateway(&mock_server.uri());
    harness.register_default().await;

    let response = harness
        .server
        .post("/v1/orders")
        .add_header("authorization", harness.auth_header())
        .json(&json!({ "coins": 10 }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn confirmation_credits_coins_exactly_once() {
    let (harness, _mock) = gateway_harness("ord_ext_3").await;
    harness.register_default().await;

    harness
        .server
        .post("/v1/orders")
        .add_header("authorization", harness.auth_header())
        .json(&json!({ "coins": 50 }))
        .await
        .assert_status_ok();

    let signature = TestHarness::sign_confirmation("ord_ext_3", "pay_1");

    // First confirmation credits
    let response = harness
        .server
        .post("/v1/orders/confirm")
        .json(&json!({
            "external_order_id": "ord_ext_3",
            "external_payment_id": "pay_1",
            "signature": signature,
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["already_processed"], false);
    assert_eq!(body["coin_balance"], 60);
    assert_eq!(body["order"]["status"], "completed");

    // Replay is acknowledged but credits nothing
    let response = harness
        .server
        .post("/v1/orders/confirm")
        .json(&json!({
            "external_order_id": "ord_ext_3",
            "external_payment_id": "pay_1",
            "signature": signature,
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["already_processed"], true);

    let response = harness
        .server
        .get("/v1/accounts/me")
        .add_header("authorization", harness.auth_header())
        .await;
    let me: serde_json::Value = response.json();
    assert_eq!(me["coins"], 60);
}

#[tokio::test]
async fn confirmation_with_bad_signature_is_rejected() {
    let (harness, _mock) = gateway_harness("ord_ext_4").await;
    harness.register_default().await;

    harness
        .server
        .post("/v1/orders")
        .add_header("authorization", harness.auth_header())
        .json(&json!({ "coins": 10 }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/v1/orders/confirm")
        .json(&json!({
            "external_order_id": "ord_ext_4",
            "external_payment_id": "pay_2",
            "signature": "deadbeef",
        }))
        .await;

    response.assert_status_bad_request();

    // Nothing was credited
    let response = harness
        .server
        .get("/v1/accounts/me")
        .add_header("authorization", harness.auth_header())
        .await;
    let me: serde_json::Value = response.json();
    assert_eq!(me["coins"], 10);
}

#[tokio::test]
async fn confirmation_for_unknown_order_is_not_found() {
    let harness = TestHarness::new();

    let signature = TestHarness::sign_confirmation("ord_missing", "pay_3");
    let response = harness
        .server
        .post("/v1/orders/confirm")
        .json(&json!({
            "external_order_id": "ord_missing",
            "external_payment_id": "pay_3",
            "signature": signature,
        }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn orders_are_listed_for_their_owner() {
    let (harness, _mock) = gateway_harness("ord_ext_5").await;
    harness.register_default().await;

    harness
        .server
        .post("/v1/orders")
        .add_header("authorization", harness.auth_header())
        .json(&json!({ "coins": 10 }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/orders")
        .add_header("authorization", harness.auth_header())
        .await;

    response.assert_status_ok();
    let orders: serde_json::Value = response.json();
    assert_eq!(orders.as_array().unwrap().len(), 1);

    // Another account sees an empty list
    let other = ideamint_core::AccountId::generate();
    let response = harness
        .server
        .get("/v1/orders")
        .add_header("authorization", TestHarness::auth_header_for(other))
        .await;

    response.assert_status_ok();
    let orders: serde_json::Value = response.json();
    assert!(orders.as_array().unwrap().is_empty());
}
