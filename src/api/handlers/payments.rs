//! Payment link handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::core::payment_link::{self, PaymentRequest};
use crate::entities::{CardModel, JobModel, PaymentLinkModel};

/// Payment link response.
#[derive(Debug, Serialize)]
pub struct PaymentLinkResponse {
    /// The stored link.
    #[serde(flatten)]
    pub link: PaymentLinkModel,
    /// Path the customer posts payment to.
    pub pay_path: String,
}

/// Create a payment link for a job's deposit.
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<(StatusCode, Json<PaymentLinkResponse>), ApiError> {
    let ttl = state.config.payment_links.ttl()?;
    let link = payment_link::create_payment_link(&state.db, job_id, ttl).await?;
    let pay_path = format!("/v1/pay/{}", link.token);

    Ok((StatusCode::CREATED, Json(PaymentLinkResponse { link, pay_path })))
}

/// Result of paying a link.
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    /// The job after the deposit was recorded.
    pub job: JobModel,
    /// The card issued for it.
    pub card: CardModel,
}

/// Pay a job's deposit through its link.
pub async fn pay(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let (job, card) =
        payment_link::process_payment(&state.db, &state.config.cards, &token, req).await?;
    Ok(Json(PaymentResponse { job, card }))
}
