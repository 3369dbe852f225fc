//! Transaction ledger - The append-only record of every financial event.
//!
//! This module only inserts and reads; corrections are new entries. Sign
//! rules are enforced per type on every append: purchases are negative,
//! receipts are zero or positive, and every other type is strictly positive.
//!
//! The job's spent amount is derived from this table on read
//! ([`spent_amount`]), so it can never drift from the recorded purchases.

use crate::{
    entities::{
        Transaction,
        transaction::{self, TransactionStatus, TransactionType},
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use tracing::debug;

/// Half a cent: float error allowed when comparing dollar balances.
pub const CENT_TOLERANCE: f64 = 0.005;

/// Rounds a dollar amount to whole cents.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// A ledger entry waiting to be appended.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Job the event belongs to
    pub job_id: i64,
    /// Card involved, if any
    pub card_id: Option<i64>,
    /// Receipt row mirrored by this entry
    pub receipt_id: Option<i64>,
    /// Kind of event
    pub transaction_type: TransactionType,
    /// Signed amount in dollars
    pub amount: f64,
    /// Vendor name or display list
    pub vendor: Option<String>,
    /// Settlement status
    pub status: TransactionStatus,
    /// Free-form description
    pub description: Option<String>,
    /// Receipt image link
    pub receipt_url: Option<String>,
}

impl NewEntry {
    /// Entry of `transaction_type` for `amount` with no optional fields set.
    #[must_use]
    pub const fn new(job_id: i64, transaction_type: TransactionType, amount: f64) -> Self {
        Self {
            job_id,
            card_id: None,
            receipt_id: None,
            transaction_type,
            amount,
            vendor: None,
            status: TransactionStatus::Completed,
            description: None,
            receipt_url: None,
        }
    }
}

/// Checks that `amount` has the sign required for `transaction_type`.
pub fn validate_entry_amount(transaction_type: TransactionType, amount: f64) -> Result<()> {
    let ok = amount.is_finite()
        && match transaction_type {
            TransactionType::Purchase => amount < 0.0,
            TransactionType::Receipt => amount >= 0.0,
            TransactionType::Request | TransactionType::Deposit | TransactionType::CardIssued => {
                amount > 0.0
            }
        };
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

/// Appends one entry to the ledger.
///
/// Generic over the connection so composite operations can append inside
/// their own database transaction.
pub async fn append<C>(conn: &C, entry: NewEntry) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    validate_entry_amount(entry.transaction_type, entry.amount)?;

    debug!(
        job_id = entry.job_id,
        card_id = ?entry.card_id,
        transaction_type = ?entry.transaction_type,
        amount = entry.amount,
        "Appending ledger entry"
    );

    transaction::ActiveModel {
        job_id: Set(entry.job_id),
        card_id: Set(entry.card_id),
        receipt_id: Set(entry.receipt_id),
        timestamp: Set(chrono::Utc::now()),
        transaction_type: Set(entry.transaction_type),
        vendor: Set(entry.vendor),
        amount: Set(entry.amount),
        status: Set(entry.status),
        description: Set(entry.description),
        receipt_url: Set(entry.receipt_url),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(Into::into)
}

/// All entries for a job, newest first.
pub async fn list_by_job<C>(conn: &C, job_id: i64) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::JobId.eq(job_id))
        .order_by_desc(transaction::Column::Timestamp)
        .order_by_desc(transaction::Column::Id)
        .all(conn)
        .await
        .map_err(Into::into)
}

/// The `limit` newest entries for a job. The limit runs in the query.
pub async fn list_recent_by_job<C>(
    conn: &C,
    job_id: i64,
    limit: u64,
) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::JobId.eq(job_id))
        .order_by_desc(transaction::Column::Timestamp)
        .order_by_desc(transaction::Column::Id)
        .limit(limit.min(i64::MAX.unsigned_abs()))
        .all(conn)
        .await
        .map_err(Into::into)
}

/// All entries that reference a card, newest first.
pub async fn list_by_card<C>(conn: &C, card_id: i64) -> Result<Vec<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::CardId.eq(card_id))
        .order_by_desc(transaction::Column::Timestamp)
        .order_by_desc(transaction::Column::Id)
        .all(conn)
        .await
        .map_err(Into::into)
}

/// The whole ledger, newest first.
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .order_by_desc(transaction::Column::Timestamp)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds one entry by id.
pub async fn get_transaction_by_id<C>(
    conn: &C,
    transaction_id: i64,
) -> Result<Option<transaction::Model>>
where
    C: ConnectionTrait,
{
    Transaction::find_by_id(transaction_id)
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Sum of absolute purchase amounts in `entries`, rounded to cents.
#[must_use]
pub fn sum_purchases(entries: &[transaction::Model]) -> f64 {
    round_cents(
        entries
            .iter()
            .filter(|t| t.transaction_type == TransactionType::Purchase)
            .map(|t| t.amount.abs())
            .sum(),
    )
}

/// Total spent on a job: the sum of absolute purchase amounts. Never negative.
pub async fn spent_amount<C>(conn: &C, job_id: i64) -> Result<f64>
where
    C: ConnectionTrait,
{
    let purchases = Transaction::find()
        .filter(transaction::Column::JobId.eq(job_id))
        .filter(transaction::Column::TransactionType.eq(TransactionType::Purchase))
        .all(conn)
        .await?;
    Ok(sum_purchases(&purchases))
}

/// Number of entries of one type recorded for a job.
pub async fn count_by_type<C>(
    conn: &C,
    job_id: i64,
    transaction_type: TransactionType,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    Transaction::find()
        .filter(transaction::Column::JobId.eq(job_id))
        .filter(transaction::Column::TransactionType.eq(transaction_type))
        .count(conn)
        .await
        .map_err(Into::into)
}
