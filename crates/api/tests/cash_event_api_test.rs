//! Cash, event and consolidated report endpoints.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{Client, decimal, state};
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tally_api::create_router;
use tally_shared::types::EntityId;

fn cash_row(entity_id: EntityId, external_ref: &str) -> Value {
    json!({
        "entity_id": entity_id,
        "business_date": "2024-03-05",
        "amount": "120.50",
        "direction": "in",
        "account": "cash",
        "external_ref": external_ref,
    })
}

fn settlement(entity_id: EntityId, event_id: &str) -> Value {
    json!({
        "event_type": "store_daily_settlement",
        "event_id": event_id,
        "entity_id": entity_id,
        "occurred_at": "2024-03-15T22:00:00Z",
        "payload": {
            "total_sales": 50000,
            "tax": 2500,
            "payment_breakdown": [{"wechat": 30000}, {"cash": 20000}],
        },
    })
}

#[tokio::test]
async fn test_cash_create_match_unmatch() {
    let client = Client::new().await;
    let mut body = cash_row(EntityId::new(), "POS-1");
    body["generate_voucher"] = json!(true);

    let (status, cash) = client.post("/cash/transactions", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(cash["match_status"], "pending");
    let voucher_id = cash["voucher_id"].as_str().unwrap().to_string();
    let id = cash["id"].as_str().unwrap();

    let (status, matched) = client
        .patch(
            &format!("/cash/transactions/{id}/match"),
            json!({"match_id": "STMT-1"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(matched["match_status"], "matched");

    let (status, unmatched) = client
        .patch(&format!("/cash/transactions/{id}/unmatch"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unmatched["match_status"], "pending");
    assert_eq!(unmatched["voucher_id"], voucher_id.as_str());

    let (status, voucher) = client.get(&format!("/vouchers/{voucher_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voucher["status"], "draft");
    assert_eq!(decimal(&voucher["totals"]["debit"]), dec!(120.50));
}

#[tokio::test]
async fn test_cash_import_report() {
    let client = Client::new().await;
    let entity = EntityId::new();
    client.post("/cash/transactions", cash_row(entity, "R-2")).await;

    let (status, report) = client
        .post(
            "/cash/transactions/import",
            json!({
                "rows": [cash_row(entity, "R-1"), cash_row(entity, "R-2"), cash_row(entity, "R-3")],
                "skip_duplicate": true,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["imported"], 2);
    assert_eq!(report["skipped"], 1);
    assert_eq!(report["failed"], 0);
    assert_eq!(report["rows"][1]["status"], "skipped");

    let (_, page) = client.get("/cash/transactions?match_status=pending").await;
    assert_eq!(page["meta"]["total"], 3);
}

#[tokio::test]
async fn test_event_ingest_is_idempotent() {
    let client = Client::new().await;
    let entity = EntityId::new();

    let (status, first) = client.post("/events", settlement(entity, "evt-1")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["created"], true);
    assert_eq!(decimal(&first["voucher"]["totals"]["debit"]), dec!(50000));
    assert_eq!(first["voucher"]["source"]["kind"], "event");

    let (status, second) = client.post("/events", settlement(entity, "evt-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["created"], false);
    assert_eq!(second["voucher"]["id"], first["voucher"]["id"]);
}

#[tokio::test]
async fn test_unknown_event_type() {
    let client = Client::new().await;
    let mut body = settlement(EntityId::new(), "evt-9");
    body["event_type"] = json!("loyalty_points");

    let (status, error) = client.post("/events", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"], "UNKNOWN_EVENT_TYPE");
    assert_eq!(error["details"]["event_type"], "loyalty_points");

    let (_, types) = client.get("/events/types").await;
    assert!(
        types
            .as_array()
            .unwrap()
            .contains(&json!("store_daily_settlement"))
    );
}

#[tokio::test]
async fn test_consolidated_report() {
    let client = Client::new().await;
    for (n, entity) in (0..3).map(|_| EntityId::new()).enumerate() {
        let mut body = settlement(entity, &format!("evt-{n}"));
        body["auto_post"] = json!(true);
        let (status, outcome) = client.post("/events", body).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(outcome["voucher"]["status"], "posted");
    }

    let (status, summed) = client
        .get("/reports/consolidated?period_key=2024-03&group_by=none")
        .await;
    assert_eq!(status, StatusCode::OK);
    let revenue = summed["totals"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["account_code"] == "6001")
        .unwrap();
    assert_eq!(decimal(&revenue["balance"]), dec!(-142500));

    let (status, page) = client
        .get("/reports/consolidated?period_key=2024-03&limit=2")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["entities"].as_array().unwrap().len(), 2);
    let cursor = page["next_cursor"].as_str().unwrap();

    let (_, rest) = client
        .get(&format!(
            "/reports/consolidated?period_key=2024-03&limit=2&cursor={cursor}"
        ))
        .await;
    assert_eq!(rest["entities"].as_array().unwrap().len(), 1);
    assert!(rest["next_cursor"].is_null());
}

#[tokio::test]
async fn test_consolidated_report_cancelled_on_shutdown() {
    let state = state().await;
    state.shutdown.cancel();
    let client = Client::with_app(create_router(state, Duration::from_secs(30)));

    let (status, body) = client
        .get("/reports/consolidated?period_key=2024-03")
        .await;
    assert_eq!(status.as_u16(), 499);
    assert_eq!(body["error"], "CANCELLED");
    assert!(body.get("entities").is_none());
}
