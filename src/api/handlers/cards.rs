//! Card handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::core::card::{self, IssueCard};
use crate::core::{job, ledger};
use crate::entities::{CardModel, TransactionModel};

/// Issue a card for a paid job.
pub async fn issue_card(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
    Json(req): Json<IssueCard>,
) -> Result<(StatusCode, Json<CardModel>), ApiError> {
    let card = card::issue_card(&state.db, &state.config.cards, job_id, req).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// List a job's cards.
pub async fn list_job_cards(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<i64>,
) -> Result<Json<Vec<CardModel>>, ApiError> {
    job::get_job_by_id(&state.db, job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {job_id}")))?;

    let cards = card::list_cards_for_job(&state.db, job_id).await?;
    Ok(Json(cards))
}

/// Get one card with its current status.
pub async fn get_card(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<i64>,
) -> Result<Json<CardModel>, ApiError> {
    let card = card::get_card_by_id(&state.db, card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Card not found: {card_id}")))?;
    Ok(Json(card))
}

/// Ledger entries that touched a card.
pub async fn card_transactions(
    State(state): State<Arc<AppState>>,
    Path(card_id): Path<i64>,
) -> Result<Json<Vec<TransactionModel>>, ApiError> {
    card::get_card_by_id(&state.db, card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Card not found: {card_id}")))?;

    let entries = ledger::list_by_card(&state.db, card_id).await?;
    Ok(Json(entries))
}
