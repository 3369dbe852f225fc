//! Receipt upload and capture integration tests.

mod common;

use axum::body::Bytes;
use axum::http::StatusCode;
use common::{OWNER, TestHarness};
use serde_json::{Value, json};

#[tokio::test]
async fn uploaded_image_is_served() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/v1/receipts/upload")
        .add_query_param("owner_id", OWNER)
        .add_query_param("file_name", "lumber.jpg")
        .bytes(Bytes::from_static(b"fake-jpeg"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("http://localhost/receipts/contractor-1/"));
    assert!(url.ends_with("-lumber.jpg"));

    let path = url.trim_start_matches("http://localhost");
    let image = harness.server.get(path).await;
    image.assert_status_ok();
    assert_eq!(image.as_bytes().as_ref(), b"fake-jpeg");
}

#[tokio::test]
async fn empty_upload_is_rejected() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/v1/receipts/upload")
        .add_query_param("owner_id", OWNER)
        .add_query_param("file_name", "empty.jpg")
        .bytes(Bytes::new())
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn receipt_does_not_change_totals() {
    let harness = TestHarness::new().await;
    let (job_id, card_id) = harness.create_job_with_card(500.0).await;

    let response = harness
        .server
        .post("/v1/receipts")
        .json(&json!({
            "owner_id": OWNER,
            "card_id": card_id,
            "vendor": "Home Depot",
            "amount": 0.0,
            "receipt_url": "http://localhost/receipts/contractor-1/r.jpg",
            "mirror_to_ledger": true
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let receipt: Value = response.json();
    assert_eq!(receipt["job_id"], job_id);
    assert_eq!(receipt["status"], "submitted");

    let receipts: Vec<Value> = harness
        .server
        .get(&format!("/v1/jobs/{job_id}/receipts"))
        .await
        .json();
    assert_eq!(receipts.len(), 1);

    let report: Value = harness
        .server
        .get(&format!("/v1/jobs/{job_id}"))
        .await
        .json();
    assert_eq!(report["spent_amount"], 0.0);
    assert_eq!(report["available_funds"], 500.0);
    assert_eq!(report["recent_transactions"][0]["transaction_type"], "Receipt");

    let card: Value = harness
        .server
        .get(&format!("/v1/cards/{card_id}"))
        .await
        .json();
    assert_eq!(card["remaining_amount"], 500.0);
}

#[tokio::test]
async fn receipts_listed_by_owner() {
    let harness = TestHarness::new().await;

    harness
        .server
        .post("/v1/receipts")
        .json(&json!({
            "owner_id": OWNER,
            "vendor": "Lowe's",
            "amount": 12.5,
            "receipt_url": "http://localhost/receipts/contractor-1/a.jpg"
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let mine: Vec<Value> = harness
        .server
        .get("/v1/receipts")
        .add_query_param("owner_id", OWNER)
        .await
        .json();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["amount"], 12.5);

    let theirs: Vec<Value> = harness
        .server
        .get("/v1/receipts")
        .add_query_param("owner_id", "someone-else")
        .await
        .json();
    assert!(theirs.is_empty());
}
