//! HTTP API: router, shared state, and error mapping.

pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use handlers::{cards, health, jobs, ledger, payments, receipts};
pub use state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// - `GET /health` - Health check
///
/// ## Jobs
/// - `POST /v1/jobs` - Create a job and request its deposit
/// - `GET /v1/jobs?owner_id=` - List an owner's jobs
/// - `GET /v1/jobs/:id` - Job report
/// - `POST /v1/jobs/:id/deposit-paid` - Mark the deposit paid
///
/// ## Cards
/// - `POST /v1/jobs/:id/cards` / `GET /v1/jobs/:id/cards`
/// - `GET /v1/cards/:id`, `GET /v1/cards/:id/transactions`
///
/// ## Ledger
/// - `POST /v1/jobs/:id/purchases` - Record a purchase
/// - `GET /v1/jobs/:id/transactions`, `GET /v1/transactions`
/// - `GET /v1/vendors`
///
/// ## Receipts
/// - `POST /v1/receipts/upload?owner_id=&file_name=` - Raw image body
/// - `POST /v1/receipts`, `GET /v1/receipts?owner_id=`, `GET /v1/jobs/:id/receipts`
/// - `GET /receipts/*` - Stored images
///
/// ## Payment links
/// - `POST /v1/jobs/:id/payment-links`, `POST /v1/pay/:token`
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors_origins);
    let max_body_bytes = state.config.server.max_body_bytes;
    let request_timeout_seconds = state.config.server.request_timeout_seconds;
    let receipt_files = ServeDir::new(&state.config.receipts.storage_dir);

    let state = Arc::new(state);

    Router::new()
        .route("/health", get(health::health))
        // Jobs
        .route("/v1/jobs", post(jobs::create_job).get(jobs::list_jobs))
        .route("/v1/jobs/:id", get(jobs::get_job))
        .route("/v1/jobs/:id/deposit-paid", post(jobs::mark_deposit_paid))
        // Cards
        .route(
            "/v1/jobs/:id/cards",
            post(cards::issue_card).get(cards::list_job_cards),
        )
        .route("/v1/cards/:id", get(cards::get_card))
        .route("/v1/cards/:id/transactions", get(cards::card_transactions))
        // Ledger
        .route("/v1/jobs/:id/purchases", post(ledger::record_purchase))
        .route("/v1/jobs/:id/transactions", get(ledger::job_transactions))
        .route("/v1/transactions", get(ledger::list_transactions))
        .route("/v1/vendors", get(ledger::list_vendors))
        // Receipts
        .route("/v1/receipts/upload", post(receipts::upload_receipt_image))
        .route(
            "/v1/receipts",
            post(receipts::create_receipt).get(receipts::list_receipts),
        )
        .route("/v1/jobs/:id/receipts", get(receipts::job_receipts))
        // Payment links
        .route("/v1/jobs/:id/payment-links", post(payments::create_link))
        .route("/v1/pay/:token", post(payments::pay))
        .nest_service("/receipts", receipt_files)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
