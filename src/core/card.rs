//! Card issuance and balance tracking.
//!
//! A card is loaded once at issuance and then only ever debited. Debits are a
//! single guarded SQL statement:
//! `UPDATE cards SET remaining_amount = MAX(ROUND(remaining_amount + delta, 2), 0) WHERE id = ? AND remaining_amount >= -delta - 0.005`
//! so concurrent purchases can neither lose an update nor overdraw the card.
//! Amounts are whole cents; the half-cent slack absorbs float error.
//!
//! Card status is always recomputed from the balance and expiry date; the
//! stored value is refreshed whenever the balance changes.

use crate::{
    config::settings::CardConfig,
    core::{
        job,
        ledger::{self, NewEntry},
        vendor,
    },
    entities::{
        Card, JobStatus,
        card::{self, CardStatus},
        job as job_entity,
        transaction::TransactionType,
    },
    errors::{Error, Result},
};
use chrono::{Months, NaiveDate, Utc};
use sea_orm::{
    QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func},
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Fields needed to issue a card against a job.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueCard {
    /// Approved vendor names; empty means "the job's vendors"
    #[serde(default)]
    pub vendors: Vec<String>,
    /// Amount to load, in dollars
    pub amount: f64,
    /// Card holder name
    pub issued_to: String,
    /// Card holder role on the job
    #[serde(default)]
    pub role: Option<String>,
}

fn validate_issue(request: &IssueCard) -> Result<()> {
    if !request.amount.is_finite() || ledger::round_cents(request.amount) <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: request.amount,
        });
    }
    if request.issued_to.trim().is_empty() {
        return Err(Error::validation("Card holder name cannot be empty"));
    }
    Ok(())
}

/// `len` pseudo-random decimal digits drawn from a v4 UUID.
fn decorative_digits(len: usize) -> String {
    let mut value = Uuid::new_v4().as_u128();
    (0..len)
        .map(|_| {
            let digit = u8::try_from(value % 10).unwrap_or(0);
            value /= 10;
            char::from(b'0' + digit)
        })
        .collect()
}

/// Status a card should have on `today`, regardless of what is stored.
///
/// Expiry wins over an exhausted balance.
#[must_use]
pub fn effective_status(card: &card::Model, today: NaiveDate) -> CardStatus {
    if card.expiry_date < today {
        CardStatus::Expired
    } else if card.remaining_amount <= 0.0 {
        CardStatus::Used
    } else {
        CardStatus::Active
    }
}

/// Returns `card` with its status recomputed for `today`.
#[must_use]
pub fn with_effective_status(mut card: card::Model, today: NaiveDate) -> card::Model {
    card.status = effective_status(&card, today);
    card
}

/// Share of the initial load that has been spent, as a percentage.
#[must_use]
pub fn usage_percent(card: &card::Model) -> f64 {
    if card.initial_amount == 0.0 {
        return 0.0;
    }

    (card.initial_amount - card.remaining_amount) / card.initial_amount * 100.0
}

/// Whether `vendor` is on an approved list. An empty list approves every vendor.
#[must_use]
pub fn is_vendor_approved(approved: &[String], vendor: &str) -> bool {
    approved.is_empty() || approved.iter().any(|v| v.eq_ignore_ascii_case(vendor.trim()))
}

/// Rejects purchases at vendors missing from the card's approved list.
///
/// A card issued without vendors accepts any vendor.
pub async fn ensure_vendor_approved<C>(conn: &C, card: &card::Model, vendor: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let approved: Vec<String> = vendor::vendors_for_card(conn, card.id)
        .await?
        .into_iter()
        .map(|v| v.name)
        .collect();
    if is_vendor_approved(&approved, vendor) {
        Ok(())
    } else {
        Err(Error::VendorNotApproved {
            card_id: card.id,
            vendor: vendor.trim().to_string(),
        })
    }
}

/// Finds a card by id, with its status recomputed for today.
pub async fn get_card_by_id<C>(conn: &C, card_id: i64) -> Result<Option<card::Model>>
where
    C: ConnectionTrait,
{
    let today = Utc::now().date_naive();
    Ok(Card::find_by_id(card_id)
        .one(conn)
        .await?
        .map(|card| with_effective_status(card, today)))
}

/// Cards issued for a job, oldest first, with recomputed status.
pub async fn list_cards_for_job<C>(conn: &C, job_id: i64) -> Result<Vec<card::Model>>
where
    C: ConnectionTrait,
{
    let today = Utc::now().date_naive();
    Ok(Card::find()
        .filter(card::Column::JobId.eq(job_id))
        .order_by_asc(card::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(|card| with_effective_status(card, today))
        .collect())
}

/// Issues a card inside an existing database transaction.
///
/// The job must have reached `Deposit paid`. A job at exactly `Deposit paid`
/// moves to `Card issued`; later statuses are kept.
pub(crate) async fn issue_card_in<C>(
    conn: &C,
    config: &CardConfig,
    job: job_entity::Model,
    request: &IssueCard,
) -> Result<(job_entity::Model, card::Model)>
where
    C: ConnectionTrait,
{
    validate_issue(request)?;

    if !job.status.is_at_least(JobStatus::DepositPaid) {
        warn!(job_id = job.id, status = %job.status, "Card requested before deposit was paid");
        return Err(Error::InvalidTransition {
            from: job.status,
            to: JobStatus::CardIssued,
        });
    }

    let job = if job.status == JobStatus::DepositPaid {
        job::advance_status(conn, job, JobStatus::CardIssued).await?
    } else {
        job
    };

    let requested = vendor::normalize_vendor_names(&request.vendors);
    let vendors = if requested.is_empty() {
        vendor::vendors_for_job(conn, job.id).await?
    } else {
        let mut found = Vec::with_capacity(requested.len());
        for name in &requested {
            found.push(vendor::find_or_create_vendor(conn, name).await?);
        }
        found
    };
    let vendor_display = vendors
        .iter()
        .map(|v| v.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let vendor_ids: Vec<i64> = vendors.iter().map(|v| v.id).collect();
    let amount = ledger::round_cents(request.amount);

    let now = Utc::now();
    let today = now.date_naive();
    let expiry_date = today
        .checked_add_months(Months::new(config.validity_months))
        .unwrap_or(NaiveDate::MAX);

    let card = card::ActiveModel {
        job_id: Set(job.id),
        card_number: Set(format!("4{}", decorative_digits(15))),
        cvv: Set(decorative_digits(3)),
        billing_zip: Set(decorative_digits(5)),
        expiry_date: Set(expiry_date),
        status: Set(CardStatus::Active),
        initial_amount: Set(amount),
        remaining_amount: Set(amount),
        vendors: Set(vendor_display.clone()),
        issued_to: Set(request.issued_to.trim().to_string()),
        role: Set(request
            .role
            .as_ref()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    vendor::link_vendors_to_card(conn, card.id, &vendor_ids).await?;

    let mut entry = NewEntry::new(job.id, TransactionType::CardIssued, card.initial_amount);
    entry.card_id = Some(card.id);
    entry.vendor = (!vendor_display.is_empty()).then_some(vendor_display);
    entry.description = Some(format!("Card issued to {}", card.issued_to));
    ledger::append(conn, entry).await?;

    Ok((job, card))
}

/// Issues a new card for a job and records it in the ledger.
///
/// # Errors
/// - [`Error::InvalidAmount`] / [`Error::Validation`] for bad input, before any write
/// - [`Error::JobNotFound`] if the job does not exist
/// - [`Error::InvalidTransition`] if the deposit has not been paid
#[instrument(skip(db, config, request), fields(amount = request.amount))]
pub async fn issue_card(
    db: &DatabaseConnection,
    config: &CardConfig,
    job_id: i64,
    request: IssueCard,
) -> Result<card::Model> {
    validate_issue(&request)?;

    let txn = db.begin().await?;
    let job = job::get_job_by_id(&txn, job_id)
        .await?
        .ok_or(Error::JobNotFound { id: job_id })?;
    let (_, card) = issue_card_in(&txn, config, job, &request).await?;
    txn.commit().await?;

    info!(card_id = card.id, job_id, "Issued card");
    Ok(card)
}

/// Applies a purchase of `amount` (zero or negative) to a card's balance.
///
/// The balance change is one guarded `UPDATE`, never a read-then-write, so
/// this is safe to call concurrently. Amounts are rounded to cents and the
/// guard allows half a cent of float error, so a card can always be spent to
/// exactly zero; the stored balance is rounded to cents and never below zero.
/// Afterwards the stored status is refreshed (a card spent down to zero
/// becomes `used`).
///
/// # Errors
/// - [`Error::InvalidAmount`] if `amount` is positive or not finite
/// - [`Error::CardNotFound`] if the card does not exist
/// - [`Error::CardInactive`] if the card is used or expired
/// - [`Error::InsufficientFunds`] if the balance does not cover the purchase
pub async fn apply_purchase<C>(conn: &C, card_id: i64, amount: f64) -> Result<card::Model>
where
    C: ConnectionTrait,
{
    if !amount.is_finite() || amount > 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    let amount = ledger::round_cents(amount);

    let card = get_card_by_id(conn, card_id)
        .await?
        .ok_or(Error::CardNotFound { id: card_id })?;

    if card.status != CardStatus::Active {
        return Err(Error::CardInactive { id: card_id });
    }
    if amount == 0.0 {
        return Ok(card);
    }

    let required = -amount;
    let next_balance = Expr::col(card::Column::RemainingAmount).add(amount);
    let result = Card::update_many()
        .col_expr(
            card::Column::RemainingAmount,
            Expr::case(Expr::expr(next_balance.clone()).lt(0.0), 0.0)
                .finally(Func::round_with_precision(next_balance, 2))
                .into(),
        )
        .col_expr(card::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(card::Column::Id.eq(card_id))
        .filter(card::Column::RemainingAmount.gte(required - ledger::CENT_TOLERANCE))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let current = Card::find_by_id(card_id)
            .one(conn)
            .await?
            .map_or(0.0, |c| c.remaining_amount);
        return Err(Error::InsufficientFunds { current, required });
    }

    let updated = Card::find_by_id(card_id)
        .one(conn)
        .await?
        .ok_or(Error::CardNotFound { id: card_id })?;

    let status = effective_status(&updated, Utc::now().date_naive());
    if status == updated.status {
        return Ok(updated);
    }

    let mut active: card::ActiveModel = updated.into();
    active.status = Set(status);
    active.update(conn).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::ledger;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn request(amount: f64, vendors: &[&str]) -> IssueCard {
        IssueCard {
            vendors: vendors.iter().map(|v| (*v).to_string()).collect(),
            amount,
            issued_to: "Sam Carter".to_string(),
            role: Some("Foreman".to_string()),
        }
    }

    #[tokio::test]
    async fn test_issue_card_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let config = CardConfig::default();

        let result = issue_card(&db, &config, 1, request(0.0, &[])).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: 0.0 }));

        let result = issue_card(&db, &config, 1, request(f64::NAN, &[])).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: _ }));

        let mut blank_holder = request(100.0, &[]);
        blank_holder.issued_to = "  ".to_string();
        let result = issue_card(&db, &config, 1, blank_holder).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_issue_card_job_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = issue_card(&db, &CardConfig::default(), 999, request(100.0, &[])).await;
        assert!(matches!(result.unwrap_err(), Error::JobNotFound { id: 999 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_issue_card_before_deposit_paid_rejected() -> Result<()> {
        let (db, job) = setup_with_job(850.0).await?;

        let result = issue_card(&db, &CardConfig::default(), job.id, request(850.0, &[])).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidTransition {
                from: JobStatus::DepositRequestSent,
                to: JobStatus::CardIssued
            }
        ));
        assert!(list_cards_for_job(&db, job.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_issue_card_integration() -> Result<()> {
        let (db, job) = setup_with_paid_job(850.0).await?;

        let card = issue_card(
            &db,
            &CardConfig::default(),
            job.id,
            request(850.0, &["Home Depot", "Lowe's"]),
        )
        .await?;

        assert_eq!(card.job_id, job.id);
        assert_eq!(card.initial_amount, 850.0);
        assert_eq!(card.remaining_amount, 850.0);
        assert_eq!(card.status, CardStatus::Active);
        assert_eq!(card.card_number.len(), 16);
        assert!(card.card_number.starts_with('4'));
        assert_eq!(card.cvv.len(), 3);
        assert_eq!(card.billing_zip.len(), 5);
        assert!(card.expiry_date > Utc::now().date_naive());
        let approved: Vec<String> = vendor::vendors_for_card(&db, card.id)
            .await?
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(approved, vec!["Home Depot", "Lowe's"]);

        let job = job::get_job_by_id(&db, job.id).await?.unwrap();
        assert_eq!(job.status, JobStatus::CardIssued);

        let entries = ledger::list_by_card(&db, card.id).await?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].transaction_type, TransactionType::CardIssued);
        assert_eq!(entries[0].amount, 850.0);
        assert_eq!(entries[0].vendor.as_deref(), Some("Home Depot, Lowe's"));
        Ok(())
    }

    #[tokio::test]
    async fn test_issue_card_defaults_to_job_vendors() -> Result<()> {
        let (db, job) = setup_with_paid_job(500.0).await?;

        let card = issue_card(&db, &CardConfig::default(), job.id, request(500.0, &[])).await?;

        // setup jobs are created with "Home Depot"
        assert_eq!(card.vendors, "Home Depot");
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_purchase_decrements_balance() -> Result<()> {
        let (db, _job, card) = setup_with_card(850.0).await?;

        let updated = apply_purchase(&db, card.id, -300.0).await?;
        assert_eq!(updated.remaining_amount, card.remaining_amount - 300.0);
        assert_eq!(updated.status, CardStatus::Active);
        assert_eq!(usage_percent(&updated), 300.0 / 850.0 * 100.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_purchase_rejects_positive_amount() -> Result<()> {
        let (db, _job, card) = setup_with_card(100.0).await?;
        let result = apply_purchase(&db, card.id, 10.0).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: 10.0 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_purchase_insufficient_funds() -> Result<()> {
        let (db, _job, card) = setup_with_card(100.0).await?;

        let result = apply_purchase(&db, card.id, -150.0).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InsufficientFunds {
                current: 100.0,
                required: 150.0
            }
        ));

        let unchanged = get_card_by_id(&db, card.id).await?.unwrap();
        assert_eq!(unchanged.remaining_amount, 100.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_card_spent_to_zero_is_used() -> Result<()> {
        let (db, _job, card) = setup_with_card(100.0).await?;

        let updated = apply_purchase(&db, card.id, -100.0).await?;
        assert_eq!(updated.remaining_amount, 0.0);
        assert_eq!(updated.status, CardStatus::Used);
        assert_eq!(usage_percent(&updated), 100.0);

        let result = apply_purchase(&db, card.id, -1.0).await;
        assert!(matches!(result.unwrap_err(), Error::CardInactive { id: _ }));
        Ok(())
    }

    #[tokio::test]
    async fn test_status_recomputed_not_trusted() -> Result<()> {
        let (db, _job, card) = setup_with_card(100.0).await?;

        // A zero balance written without touching the stored status flag
        let mut active: card::ActiveModel = card.clone().into();
        active.remaining_amount = Set(0.0);
        active.update(&db).await?;

        let stored = Card::find_by_id(card.id).one(&db).await?.unwrap();
        assert_eq!(stored.status, CardStatus::Active);

        let reported = get_card_by_id(&db, card.id).await?.unwrap();
        assert_eq!(reported.status, CardStatus::Used);
        Ok(())
    }

    #[tokio::test]
    async fn test_expired_card_rejects_purchases() -> Result<()> {
        let (db, _job, card) = setup_with_card(100.0).await?;

        let mut active: card::ActiveModel = card.clone().into();
        active.expiry_date = Set(NaiveDate::from_ymd_opt(2020, 1, 31).unwrap());
        active.update(&db).await?;

        let reported = get_card_by_id(&db, card.id).await?.unwrap();
        assert_eq!(reported.status, CardStatus::Expired);

        let result = apply_purchase(&db, card.id, -10.0).await;
        assert!(matches!(result.unwrap_err(), Error::CardInactive { id: _ }));
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_purchase_rounds_to_cents() -> Result<()> {
        let (db, _job, card) = setup_with_card(0.3).await?;

        let updated = apply_purchase(&db, card.id, -0.1).await?;
        assert_eq!(updated.remaining_amount, 0.2);
        assert_eq!(updated.status, CardStatus::Active);

        let updated = apply_purchase(&db, card.id, -0.2).await?;
        assert_eq!(updated.remaining_amount, 0.0);
        assert_eq!(updated.status, CardStatus::Used);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_purchase_sub_cent_overdraw_clamps_to_zero() -> Result<()> {
        let (db, _job, card) = setup_with_card(10.0).await?;

        // Rounds to 10.00, within half a cent of the balance
        let updated = apply_purchase(&db, card.id, -10.004).await?;
        assert_eq!(updated.remaining_amount, 0.0);
        assert_eq!(updated.status, CardStatus::Used);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_purchase_one_cent_over_is_rejected() -> Result<()> {
        let (db, _job, card) = setup_with_card(10.0).await?;

        let result = apply_purchase(&db, card.id, -10.01).await;
        assert!(matches!(result.unwrap_err(), Error::InsufficientFunds { .. }));
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_purchases_lose_no_updates() -> Result<()> {
        let (_dir, db) = setup_file_db().await?;
        let job = create_test_job(&db, "Kitchen Remodel", 1000.0).await?;
        job::mark_deposit_paid(&db, job.id).await?;
        let card = issue_card(
            &db,
            &CardConfig::default(),
            job.id,
            request(1000.0, &["Home Depot"]),
        )
        .await?;
        let db = Arc::new(db);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let db = Arc::clone(&db);
            let card_id = card.id;
            handles.push(tokio::spawn(async move {
                apply_purchase(db.as_ref(), card_id, -25.0).await
            }));
        }
        for handle in handles {
            handle.await.unwrap()?;
        }

        let card = get_card_by_id(db.as_ref(), card.id).await?.unwrap();
        assert_eq!(card.remaining_amount, 1000.0 - 20.0 * 25.0);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_purchases_never_overdraw() -> Result<()> {
        let (_dir, db) = setup_file_db().await?;
        let job = create_test_job(&db, "Kitchen Remodel", 100.0).await?;
        job::mark_deposit_paid(&db, job.id).await?;
        let card = issue_card(
            &db,
            &CardConfig::default(),
            job.id,
            request(100.0, &["Home Depot"]),
        )
        .await?;
        let db = Arc::new(db);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = Arc::clone(&db);
            let card_id = card.id;
            handles.push(tokio::spawn(async move {
                apply_purchase(db.as_ref(), card_id, -30.0).await
            }));
        }
        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 3);
        let card = get_card_by_id(db.as_ref(), card.id).await?.unwrap();
        assert_eq!(card.remaining_amount, 10.0);
        Ok(())
    }

    #[test]
    fn test_effective_status() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let mut card = sample_card(50.0, NaiveDate::from_ymd_opt(2027, 6, 1).unwrap());
        assert_eq!(effective_status(&card, today), CardStatus::Active);

        card.remaining_amount = 0.0;
        assert_eq!(effective_status(&card, today), CardStatus::Used);

        card.expiry_date = NaiveDate::from_ymd_opt(2026, 5, 31).unwrap();
        assert_eq!(effective_status(&card, today), CardStatus::Expired);

        // Valid through the expiry day itself
        card.remaining_amount = 10.0;
        card.expiry_date = today;
        assert_eq!(effective_status(&card, today), CardStatus::Active);
    }

    #[test]
    fn test_vendor_approval() {
        let approved = vec!["Home Depot".to_string(), "Lowe's".to_string()];
        assert!(is_vendor_approved(&approved, "home depot"));
        assert!(is_vendor_approved(&approved, " Lowe's "));
        assert!(!is_vendor_approved(&approved, "Amazon"));
        assert!(is_vendor_approved(&[], "Amazon"));
    }

    #[tokio::test]
    async fn test_ensure_vendor_approved_uses_linked_vendors() -> Result<()> {
        let (db, job) = setup_with_paid_job(500.0).await?;
        let card = issue_card(
            &db,
            &CardConfig::default(),
            job.id,
            request(500.0, &["Smith, Jones & Co", "Lowe's"]),
        )
        .await?;
        assert_eq!(card.vendors, "Smith, Jones & Co, Lowe's");

        assert!(ensure_vendor_approved(&db, &card, "smith, jones & co").await.is_ok());
        assert!(ensure_vendor_approved(&db, &card, "Lowe's").await.is_ok());
        assert!(matches!(
            ensure_vendor_approved(&db, &card, "Smith").await,
            Err(Error::VendorNotApproved { card_id: _, vendor: _ })
        ));
        assert!(matches!(
            ensure_vendor_approved(&db, &card, "Jones & Co").await,
            Err(Error::VendorNotApproved { card_id: _, vendor: _ })
        ));
        Ok(())
    }

    #[test]
    fn test_usage_percent_zero_initial() {
        let card = sample_card(0.0, NaiveDate::from_ymd_opt(2027, 6, 1).unwrap());
        assert_eq!(usage_percent(&card), 0.0);
    }

    #[test]
    fn test_decorative_digits() {
        let digits = decorative_digits(15);
        assert_eq!(digits.len(), 15);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }
}
