//! Voucher and ledger endpoints.

mod common;

use axum::http::StatusCode;
use common::{Client, decimal};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tally_shared::types::{EntityId, TenantId};

fn voucher_body(entity_id: EntityId, amount: &str) -> Value {
    json!({
        "entity_id": entity_id,
        "business_date": "2024-03-05",
        "description": "Petty cash",
        "lines": [
            {"account_code": "1001", "debit": amount, "credit": "0"},
            {"account_code": "6602", "debit": "0", "credit": amount},
        ],
    })
}

async fn create_posted(client: &Client, entity_id: EntityId, amount: &str) -> Value {
    let (status, voucher) = client.post("/vouchers", voucher_body(entity_id, amount)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = voucher["id"].as_str().unwrap();
    let (status, voucher) = client
        .patch(&format!("/vouchers/{id}/status"), json!({"status": "posted"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    voucher
}

#[tokio::test]
async fn test_health() {
    let client = Client::new().await;
    let (status, body) = client.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_requests_need_a_tenant() {
    let client = Client::new().await;
    let response = tower::ServiceExt::oneshot(
        client.app.clone(),
        axum::http::Request::builder()
            .uri("/vouchers")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_draft() {
    let client = Client::new().await;
    let (status, voucher) = client.post("/vouchers", voucher_body(EntityId::new(), "100")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(voucher["status"], "draft");
    assert_eq!(voucher["voucher_no"], "V202403-00001");
    assert_eq!(voucher["period_key"], "2024-03");
    assert_eq!(voucher["lines"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unbalanced_voucher_is_rejected_with_details() {
    let client = Client::new().await;
    let mut body = voucher_body(EntityId::new(), "100");
    body["lines"][1]["credit"] = json!("90");

    let (status, error) = client.post("/vouchers", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["error"], "UNBALANCED_VOUCHER");
    assert_eq!(decimal(&error["details"]["difference"]), dec!(10));

    let (_, page) = client.get("/vouchers").await;
    assert_eq!(page["meta"]["total"], 0);
}

#[tokio::test]
async fn test_posting_updates_balances() {
    let client = Client::new().await;
    create_posted(&client, EntityId::new(), "100").await;

    let (status, balances) = client.get("/ledger/balances").await;
    assert_eq!(status, StatusCode::OK);
    let balance = |code: &str| {
        balances
            .as_array()
            .unwrap()
            .iter()
            .find(|b| b["account_code"] == code)
            .map(|b| decimal(&b["balance"]))
            .unwrap()
    };
    assert_eq!(balance("1001"), dec!(100));
    assert_eq!(balance("6602"), dec!(-100));

    let (status, entries) = client.get("/ledger/entries?account_code=1001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_void_then_post_is_an_invalid_transition() {
    let client = Client::new().await;
    let (_, voucher) = client.post("/vouchers", voucher_body(EntityId::new(), "10")).await;
    let id = voucher["id"].as_str().unwrap();

    let (status, voided) = client
        .post(&format!("/vouchers/{id}/void"), json!({"reason": "duplicate"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voided["status"], "voided");

    let (status, error) = client
        .patch(&format!("/vouchers/{id}/status"), json!({"status": "posted"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"], "INVALID_TRANSITION");
    assert_eq!(error["details"]["status"], "voided");
}

#[tokio::test]
async fn test_red_flush_nets_to_zero() {
    let client = Client::new().await;
    let voucher = create_posted(&client, EntityId::new(), "100").await;
    let id = voucher["id"].as_str().unwrap();

    let (status, outcome) = client
        .post(&format!("/vouchers/{id}/red-flush"), json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(outcome["original"]["status"], "posted");
    assert_eq!(outcome["reversal"]["reverses_voucher_id"], voucher["id"]);
    assert_eq!(outcome["original"]["reversed_by_voucher_id"], outcome["reversal"]["id"]);

    let (_, balances) = client.get("/ledger/balances").await;
    for balance in balances.as_array().unwrap() {
        assert!(decimal(&balance["balance"]).is_zero());
    }

    let (status, error) = client
        .post(&format!("/vouchers/{id}/red-flush"), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"], "ALREADY_REVERSED");
}

#[tokio::test]
async fn test_other_tenants_cannot_see_vouchers() {
    let client = Client::new().await;
    let voucher = create_posted(&client, EntityId::new(), "5").await;
    let id = voucher["id"].as_str().unwrap();

    let stranger = client.as_tenant(TenantId::new());
    let (status, error) = stranger.get(&format!("/vouchers/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "NOT_FOUND");

    let (_, balances) = stranger.get("/ledger/balances").await;
    assert!(balances.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let client = Client::new().await;
    let entity = EntityId::new();
    create_posted(&client, entity, "1").await;
    client.post("/vouchers", voucher_body(entity, "2")).await;

    let (status, page) = client.get("/vouchers?status=draft&per_page=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["meta"]["total"], 1);
    assert_eq!(page["meta"]["per_page"], 10);
    assert_eq!(page["data"][0]["status"], "draft");
}
