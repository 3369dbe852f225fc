//! Job lifecycle handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::core::customer::NewCustomer;
use crate::core::job::{self, JobSummary, NewJob};
use crate::core::report::{self, JobReport};
use crate::entities::JobModel;

/// Create job request.
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    /// Contractor creating the job.
    pub owner_id: String,
    /// Customer the work is for; reused if already known.
    pub customer: NewCustomer,
    /// Job name.
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    /// Deposit to request, in dollars.
    pub deposit_amount: f64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Approved vendor names.
    #[serde(default)]
    pub vendors: Vec<String>,
}

/// Create a job and send the deposit request.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobSummary>), ApiError> {
    let new_job = NewJob {
        name: req.name,
        address: req.address,
        deposit_amount: req.deposit_amount,
        start_date: req.start_date,
    };
    let job = job::create_job(
        &state.db,
        &req.owner_id,
        &req.customer,
        &new_job,
        &req.vendors,
    )
    .await?;
    let summary = job::job_summary(&state.db, job.id).await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// Owner filter for job listing.
#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    /// Contractor whose jobs to list.
    pub owner_id: String,
}

/// List an owner's jobs, newest first.
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobModel>>, ApiError> {
    if query.owner_id.trim().is_empty() {
        return Err(ApiError::BadRequest("owner_id is required".into()));
    }
    let jobs = job::list_jobs_for_owner(&state.db, &query.owner_id).await?;
    Ok(Json(jobs))
}

/// Report query parameters.
#[derive(Debug, Deserialize)]
pub struct JobReportQuery {
    /// Number of recent ledger entries (default: 10).
    #[serde(default)]
    pub limit: Option<u64>,
}

/// Get a job report.
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
    Query(query): Query<JobReportQuery>,
) -> Result<Json<JobReport>, ApiError> {
    let report = report::generate_job_report(&state.db, job_id, query.limit).await?;
    Ok(Json(report))
}

/// Mark a job's deposit paid. Repeating the call is harmless.
pub async fn mark_deposit_paid(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<Json<JobSummary>, ApiError> {
    job::mark_deposit_paid(&state.db, job_id).await?;
    let summary = job::job_summary(&state.db, job_id).await?;
    Ok(Json(summary))
}
