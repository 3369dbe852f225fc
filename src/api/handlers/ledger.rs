//! Purchase and ledger handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::core::job::{self, NewPurchase};
use crate::core::{ledger, vendor};
use crate::entities::{TransactionModel, VendorModel};

/// Record a materials purchase under the configured purchase policy.
pub async fn record_purchase(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
    Json(req): Json<NewPurchase>,
) -> Result<(StatusCode, Json<TransactionModel>), ApiError> {
    let entry = job::record_purchase(
        &state.db,
        state.config.ledger.purchase_policy,
        job_id,
        req,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// A job's ledger, newest first.
pub async fn job_transactions(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<Json<Vec<TransactionModel>>, ApiError> {
    job::get_job_by_id(&state.db, job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {job_id}")))?;

    let entries = ledger::list_by_job(&state.db, job_id).await?;
    Ok(Json(entries))
}

/// The whole ledger, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TransactionModel>>, ApiError> {
    let entries = ledger::list_all(&state.db).await?;
    Ok(Json(entries))
}

/// Known vendors.
pub async fn list_vendors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VendorModel>>, ApiError> {
    let vendors = vendor::list_vendors(&state.db).await?;
    Ok(Json(vendors))
}
