//! Common test utilities for `JobVault` integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use axum_test::TestServer;
use serde_json::{Value, json};
use tempfile::TempDir;

use jobvault::api::{AppState, create_router};
use jobvault::config::{AppConfig, database};

/// Owner id used for every request.
pub const OWNER: &str = "contractor-1";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Receipt storage directory (kept alive for test duration).
    pub receipt_dir: TempDir,
}

impl TestHarness {
    /// Create a harness over a fresh in-memory database.
    pub async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    /// Create a harness with a custom configuration. Receipt storage always
    /// points at a fresh temporary directory.
    pub async fn with_config(mut config: AppConfig) -> Self {
        let receipt_dir = TempDir::new().expect("Failed to create temp directory");
        config.receipts.storage_dir = receipt_dir.path().to_string_lossy().to_string();
        config.receipts.public_base_url = "http://localhost/receipts".into();

        let db = database::create_connection("sqlite::memory:")
            .await
            .expect("Failed to open database");
        database::create_tables(&db)
            .await
            .expect("Failed to create tables");

        let router = create_router(AppState::new(db, config));
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            receipt_dir,
        }
    }

    /// Create a job with the given deposit and return its id.
    pub async fn create_job(&self, deposit_amount: f64) -> i64 {
        let response = self
            .server
            .post("/v1/jobs")
            .json(&json!({
                "owner_id": OWNER,
                "customer": { "name": "Jordan Lee", "email": "jordan@example.com" },
                "name": "Kitchen Remodel",
                "address": "12 Elm St",
                "deposit_amount": deposit_amount,
                "vendors": ["Home Depot", "Lowe's"]
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        body["job"]["id"].as_i64().expect("job id")
    }

    /// Create a job, pay its deposit and issue a card for the full amount.
    /// Returns (job id, card id).
    pub async fn create_job_with_card(&self, deposit_amount: f64) -> (i64, i64) {
        let job_id = self.create_job(deposit_amount).await;
        self.server
            .post(&format!("/v1/jobs/{job_id}/deposit-paid"))
            .await
            .assert_status_ok();

        let response = self
            .server
            .post(&format!("/v1/jobs/{job_id}/cards"))
            .json(&json!({
                "amount": deposit_amount,
                "issued_to": "Sam Carter",
                "role": "Lead"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let card: Value = response.json();
        (job_id, card["id"].as_i64().expect("card id"))
    }
}
