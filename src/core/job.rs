//! Job lifecycle business logic.
//!
//! A job moves through `Deposit request sent → Deposit paid → Card issued →
//! Materials purchased`. Each operation here runs in one database transaction
//! that appends its ledger entries and advances the status together, so a
//! failure leaves neither behind.
//!
//! Spent and available funds are derived from the ledger on read.

use crate::{
    config::settings::PurchasePolicy,
    core::{
        card,
        customer::{self, NewCustomer},
        ledger::{self, NewEntry},
        vendor,
    },
    entities::{
        Job, JobStatus, job,
        transaction::{self, TransactionStatus, TransactionType},
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Job fields entered by the contractor.
#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    /// Short job name
    pub name: String,
    /// Job site address
    #[serde(default)]
    pub address: Option<String>,
    /// Deposit to request, in dollars
    pub deposit_amount: f64,
    /// Planned start date
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

/// A purchase made with job funds.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPurchase {
    /// Purchase total in dollars (positive; stored negated)
    pub amount: f64,
    /// Where the materials were bought
    pub vendor: String,
    /// Card used; required under [`PurchasePolicy::DebitCard`]
    #[serde(default)]
    pub card_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub receipt_url: Option<String>,
}

/// A job together with its derived totals.
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    /// The job row
    pub job: job::Model,
    /// Sum of absolute purchase amounts
    pub spent_amount: f64,
    /// `deposit_amount - spent_amount`
    pub available_funds: f64,
}

/// Funds left to spend on a job.
#[must_use]
pub fn available_funds(deposit_amount: f64, spent_amount: f64) -> f64 {
    deposit_amount - spent_amount
}

/// Checks job and customer fields before anything is written.
pub fn validate_new_job(new_customer: &NewCustomer, new_job: &NewJob) -> Result<()> {
    if new_job.name.trim().is_empty() {
        return Err(Error::validation("Job name cannot be empty"));
    }
    customer::validate_customer(new_customer)?;
    if !new_job.deposit_amount.is_finite() || new_job.deposit_amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: new_job.deposit_amount,
        });
    }
    Ok(())
}

/// Finds a job by id.
pub async fn get_job_by_id<C>(conn: &C, job_id: i64) -> Result<Option<job::Model>>
where
    C: ConnectionTrait,
{
    Job::find_by_id(job_id).one(conn).await.map_err(Into::into)
}

/// An owner's jobs, newest first.
pub async fn list_jobs_for_owner(
    db: &DatabaseConnection,
    owner_id: &str,
) -> Result<Vec<job::Model>> {
    Job::find()
        .filter(job::Column::OwnerId.eq(owner_id))
        .order_by_desc(job::Column::CreatedAt)
        .order_by_desc(job::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves a job to `next`, rejecting transitions the lifecycle does not allow.
pub async fn advance_status<C>(conn: &C, job: job::Model, next: JobStatus) -> Result<job::Model>
where
    C: ConnectionTrait,
{
    if !job.status.can_transition_to(next) {
        warn!(job_id = job.id, from = %job.status, to = %next, "Rejected status transition");
        return Err(Error::InvalidTransition {
            from: job.status,
            to: next,
        });
    }
    if job.status == next {
        return Ok(job);
    }

    debug!(job_id = job.id, from = %job.status, to = %next, "Advancing job status");
    let mut active: job::ActiveModel = job.into();
    active.status = Set(next);
    active.updated_at = Set(Utc::now());
    active.update(conn).await.map_err(Into::into)
}

/// Opens a job: customer, vendors, the job row and its deposit `Request` entry.
///
/// The customer is reused when the owner already has one with the same email
/// (or name, without an email). Unknown vendor names are created.
///
/// # Errors
/// - [`Error::Validation`] if the owner, job name or customer name is blank
/// - [`Error::InvalidAmount`] if the deposit is not a positive number
#[instrument(skip(db, new_customer, new_job, vendor_names), fields(job_name = %new_job.name))]
pub async fn create_job(
    db: &DatabaseConnection,
    owner_id: &str,
    new_customer: &NewCustomer,
    new_job: &NewJob,
    vendor_names: &[String],
) -> Result<job::Model> {
    if owner_id.trim().is_empty() {
        return Err(Error::validation("Owner id is required"));
    }
    validate_new_job(new_customer, new_job)?;

    let txn = db.begin().await?;

    let customer = customer::find_or_create_customer(&txn, owner_id, new_customer).await?;

    let mut vendor_ids = Vec::new();
    for name in vendor::normalize_vendor_names(vendor_names) {
        vendor_ids.push(vendor::find_or_create_vendor(&txn, &name).await?.id);
    }

    let now = Utc::now();
    let job = job::ActiveModel {
        owner_id: Set(owner_id.to_string()),
        customer_id: Set(customer.id),
        name: Set(new_job.name.trim().to_string()),
        address: Set(new_job
            .address
            .as_ref()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())),
        deposit_amount: Set(new_job.deposit_amount),
        status: Set(JobStatus::DepositRequestSent),
        start_date: Set(new_job.start_date),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    vendor::link_vendors_to_job(&txn, job.id, &vendor_ids).await?;

    let mut request = NewEntry::new(job.id, TransactionType::Request, job.deposit_amount);
    request.status = TransactionStatus::Pending;
    request.description = Some(format!("Deposit requested from {}", customer.name));
    ledger::append(&txn, request).await?;

    txn.commit().await?;

    info!(job_id = job.id, deposit = job.deposit_amount, "Created job");
    Ok(job)
}

/// Marks the deposit paid inside an existing database transaction.
///
/// The status change is a guarded `UPDATE ... WHERE status = 'Deposit request sent'`;
/// only the caller that wins it appends the `Deposit` entry. Jobs already
/// past that status are returned unchanged.
pub(crate) async fn mark_deposit_paid_in<C>(conn: &C, job_id: i64) -> Result<job::Model>
where
    C: ConnectionTrait,
{
    let result = Job::update_many()
        .col_expr(job::Column::Status, Expr::value(JobStatus::DepositPaid))
        .col_expr(job::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(job::Column::Id.eq(job_id))
        .filter(job::Column::Status.eq(JobStatus::DepositRequestSent))
        .exec(conn)
        .await?;

    let job = get_job_by_id(conn, job_id)
        .await?
        .ok_or(Error::JobNotFound { id: job_id })?;

    if result.rows_affected == 0 {
        debug!(job_id, status = %job.status, "Deposit already marked paid");
        return Ok(job);
    }

    let mut deposit = NewEntry::new(job.id, TransactionType::Deposit, job.deposit_amount);
    deposit.description = Some("Deposit received".to_string());
    ledger::append(conn, deposit).await?;

    Ok(job)
}

/// Records that the customer paid the deposit.
///
/// Idempotent: a second call returns the job without appending another
/// `Deposit` entry.
///
/// # Errors
/// Returns [`Error::JobNotFound`] if the job does not exist.
#[instrument(skip(db))]
pub async fn mark_deposit_paid(db: &DatabaseConnection, job_id: i64) -> Result<job::Model> {
    let txn = db.begin().await?;
    let job = mark_deposit_paid_in(&txn, job_id).await?;
    txn.commit().await?;

    info!(job_id, status = %job.status, "Deposit marked paid");
    Ok(job)
}

fn validate_purchase(policy: PurchasePolicy, purchase: &NewPurchase) -> Result<()> {
    if !purchase.amount.is_finite() || ledger::round_cents(purchase.amount) <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: purchase.amount,
        });
    }
    if purchase.vendor.trim().is_empty() {
        return Err(Error::validation("Vendor cannot be empty"));
    }
    if policy == PurchasePolicy::DebitCard && purchase.card_id.is_none() {
        return Err(Error::validation("A card is required to record a purchase"));
    }
    Ok(())
}

/// Records a materials purchase against a job.
///
/// This is the single place purchases touch aggregates. It appends a
/// `Purchase` entry with the negated amount and moves the job to
/// `Materials purchased`. Under [`PurchasePolicy::DebitCard`] the card is
/// debited in the same database transaction; under
/// [`PurchasePolicy::JobOnly`] no card balance changes. The job's spent total
/// always comes from the ledger.
///
/// # Errors
/// - [`Error::InvalidAmount`] / [`Error::Validation`] for bad input
/// - [`Error::JobNotFound`] / [`Error::CardNotFound`] for unknown ids
/// - [`Error::InvalidTransition`] if the deposit has not been paid
/// - card errors from [`card::apply_purchase`] and [`card::ensure_vendor_approved`]
#[instrument(skip(db, purchase), fields(amount = purchase.amount, vendor = %purchase.vendor))]
pub async fn record_purchase(
    db: &DatabaseConnection,
    policy: PurchasePolicy,
    job_id: i64,
    purchase: NewPurchase,
) -> Result<transaction::Model> {
    validate_purchase(policy, &purchase)?;
    let amount = ledger::round_cents(purchase.amount);

    let txn = db.begin().await?;

    let job = get_job_by_id(&txn, job_id)
        .await?
        .ok_or(Error::JobNotFound { id: job_id })?;
    if !job.status.is_at_least(JobStatus::DepositPaid) {
        warn!(job_id, status = %job.status, "Purchase recorded before deposit was paid");
        return Err(Error::InvalidTransition {
            from: job.status,
            to: JobStatus::MaterialsPurchased,
        });
    }

    if let Some(card_id) = purchase.card_id {
        let card = card::get_card_by_id(&txn, card_id)
            .await?
            .ok_or(Error::CardNotFound { id: card_id })?;
        if card.job_id != job.id {
            return Err(Error::validation(format!(
                "Card {card_id} does not belong to job {job_id}"
            )));
        }
        if policy == PurchasePolicy::DebitCard {
            card::ensure_vendor_approved(&txn, &card, &purchase.vendor).await?;
            card::apply_purchase(&txn, card_id, -amount).await?;
        }
    }

    let mut entry = NewEntry::new(job.id, TransactionType::Purchase, -amount);
    entry.card_id = purchase.card_id;
    entry.vendor = Some(purchase.vendor.trim().to_string());
    entry.description = purchase.description;
    entry.receipt_url = purchase.receipt_url;
    let entry = ledger::append(&txn, entry).await?;

    advance_status(&txn, job, JobStatus::MaterialsPurchased).await?;

    txn.commit().await?;

    info!(job_id, transaction_id = entry.id, "Recorded purchase");
    Ok(entry)
}

/// Sum of absolute purchase amounts for a job.
pub async fn spent_amount<C>(conn: &C, job_id: i64) -> Result<f64>
where
    C: ConnectionTrait,
{
    ledger::spent_amount(conn, job_id).await
}

/// A job with its spent and available funds.
///
/// # Errors
/// Returns [`Error::JobNotFound`] if the job does not exist.
pub async fn job_summary<C>(conn: &C, job_id: i64) -> Result<JobSummary>
where
    C: ConnectionTrait,
{
    let job = get_job_by_id(conn, job_id)
        .await?
        .ok_or(Error::JobNotFound { id: job_id })?;
    let spent_amount = spent_amount(conn, job_id).await?;

    Ok(JobSummary {
        available_funds: available_funds(job.deposit_amount, spent_amount),
        spent_amount,
        job,
    })
}
