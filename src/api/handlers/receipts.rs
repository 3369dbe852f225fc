//! Receipt handlers.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::core::job;
use crate::core::receipt::{self, NewReceipt};
use crate::entities::ReceiptModel;

/// Upload query parameters.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Contractor the image belongs to.
    pub owner_id: String,
    /// Original file name.
    pub file_name: String,
}

/// Upload response.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Public URL of the stored image.
    pub url: String,
}

/// Store a raw receipt image and return its URL.
pub async fn upload_receipt_image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let url = receipt::upload_image(
        state.receipts.as_ref(),
        &query.owner_id,
        &query.file_name,
        &body,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

/// Record a receipt entry.
pub async fn create_receipt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewReceipt>,
) -> Result<(StatusCode, Json<ReceiptModel>), ApiError> {
    let receipt = receipt::create_receipt_entry(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Owner filter for receipt listing.
#[derive(Debug, Deserialize)]
pub struct ListReceiptsQuery {
    /// Contractor whose receipts to list.
    pub owner_id: String,
}

/// Receipts captured by an owner, newest first.
pub async fn list_receipts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListReceiptsQuery>,
) -> Result<Json<Vec<ReceiptModel>>, ApiError> {
    let receipts = receipt::list_receipts_for_owner(&state.db, &query.owner_id).await?;
    Ok(Json(receipts))
}

/// Receipts captured for a job, newest first.
pub async fn job_receipts(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<Json<Vec<ReceiptModel>>, ApiError> {
    job::get_job_by_id(&state.db, job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {job_id}")))?;

    let receipts = receipt::list_receipts_for_job(&state.db, job_id).await?;
    Ok(Json(receipts))
}
