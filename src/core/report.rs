//! Job reports.
//!
//! Gathers a job, its customer, vendors, cards and recent ledger activity into
//! one structured value. Formatting helpers render ledger lines for text output.

use crate::{
    core::{card, customer, job, ledger, vendor},
    entities::{card as card_entity, customer as customer_entity, job as job_entity, transaction},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;

/// Number of ledger entries included when no limit is given.
pub const DEFAULT_TRANSACTION_LIMIT: u64 = 10;

/// A card on a report with its usage.
#[derive(Debug, Clone, Serialize)]
pub struct CardUsage {
    /// The card, with its status recomputed for today
    pub card: card_entity::Model,
    /// Share of the initial load already spent (0-100)
    pub usage_percent: f64,
}

/// Everything known about a job at a glance.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    /// The job being reported on
    pub job: job_entity::Model,
    /// Job customer, if the row still exists
    pub customer: Option<customer_entity::Model>,
    /// Approved vendor names
    pub vendors: Vec<String>,
    /// Sum of absolute purchase amounts
    pub spent_amount: f64,
    /// Deposit minus spent
    pub available_funds: f64,
    /// Cards issued for this job, oldest first
    pub cards: Vec<CardUsage>,
    /// Newest ledger entries first
    pub recent_transactions: Vec<transaction::Model>,
}

/// Builds a report for one job.
///
/// # Arguments
/// * `db` - Database connection
/// * `job_id` - Job to report on
/// * `transaction_limit` - Maximum number of recent ledger entries (default 10)
///
/// # Errors
/// Returns [`crate::errors::Error::JobNotFound`] if the job does not exist.
pub async fn generate_job_report(
    db: &DatabaseConnection,
    job_id: i64,
    transaction_limit: Option<u64>,
) -> Result<JobReport> {
    let summary = job::job_summary(db, job_id).await?;
    let customer = customer::get_customer_by_id(db, summary.job.customer_id).await?;
    let vendors = vendor::vendors_for_job(db, job_id)
        .await?
        .into_iter()
        .map(|v| v.name)
        .collect();

    let cards = card::list_cards_for_job(db, job_id)
        .await?
        .into_iter()
        .map(|card| CardUsage {
            usage_percent: card::usage_percent(&card),
            card,
        })
        .collect();

    let recent_transactions = ledger::list_recent_by_job(
        db,
        job_id,
        transaction_limit.unwrap_or(DEFAULT_TRANSACTION_LIMIT),
    )
    .await?;

    Ok(JobReport {
        job: summary.job,
        customer,
        vendors,
        spent_amount: summary.spent_amount,
        available_funds: summary.available_funds,
        cards,
        recent_transactions,
    })
}

/// Formats an amount with its sign, like `+$50.00` or `-$25.50`.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    if amount >= 0.0 {
        format!("+${amount:.2}")
    } else {
        format!("-${:.2}", amount.abs())
    }
}

/// One-line summary of a ledger entry.
///
/// Vendor and description are left out when absent.
#[must_use]
pub fn format_transaction_summary(entry: &transaction::Model) -> String {
    let mut parts = vec![
        entry.timestamp.format("%Y-%m-%d").to_string(),
        format_amount(entry.amount),
        entry.transaction_type.to_string(),
    ];
    if let Some(vendor) = &entry.vendor {
        parts.push(vendor.clone());
    }
    if let Some(description) = &entry.description {
        parts.push(description.clone());
    }
    parts.join(" | ")
}
