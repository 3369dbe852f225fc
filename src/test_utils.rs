//! Shared test utilities for `JobVault`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating jobs and cards with sensible defaults.

use crate::{
    config::settings::CardConfig,
    core::{
        card::{self, IssueCard},
        customer::NewCustomer,
        job::{self, NewJob},
    },
    entities,
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ConnectOptions, DatabaseConnection};

/// Owner id used by every test helper.
pub const TEST_OWNER: &str = "contractor-1";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database with a small connection pool.
///
/// Concurrency tests need this: every connection to `sqlite::memory:` opens
/// its own empty database. Keep the returned directory alive for the test.
pub async fn setup_file_db() -> Result<(tempfile::TempDir, DatabaseConnection)> {
    let dir = tempfile::tempdir()?;
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("jobvault.sqlite").display()
    );
    let mut options = ConnectOptions::new(url);
    options.max_connections(8).sqlx_logging(false);
    let db = sea_orm::Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;
    Ok((dir, db))
}

/// A customer with only a name set.
pub fn test_customer(name: &str) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        ..Default::default()
    }
}

/// Creates a job for [`TEST_OWNER`].
///
/// # Defaults
/// * customer: "Jordan Lee"
/// * vendors: "Home Depot"
/// * address and start date: None
pub async fn create_test_job(
    db: &DatabaseConnection,
    name: &str,
    deposit_amount: f64,
) -> Result<entities::job::Model> {
    let new_job = NewJob {
        name: name.to_string(),
        address: None,
        deposit_amount,
        start_date: None,
    };
    job::create_job(
        db,
        TEST_OWNER,
        &test_customer("Jordan Lee"),
        &new_job,
        &["Home Depot".to_string()],
    )
    .await
}

/// Sets up a database with one job awaiting its deposit.
pub async fn setup_with_job(
    deposit_amount: f64,
) -> Result<(DatabaseConnection, entities::job::Model)> {
    let db = setup_test_db().await?;
    let job = create_test_job(&db, "Kitchen Remodel", deposit_amount).await?;
    Ok((db, job))
}

/// Sets up a database with one job whose deposit has been paid.
pub async fn setup_with_paid_job(
    deposit_amount: f64,
) -> Result<(DatabaseConnection, entities::job::Model)> {
    let (db, job) = setup_with_job(deposit_amount).await?;
    let job = job::mark_deposit_paid(&db, job.id).await?;
    Ok((db, job))
}

/// Sets up a paid job with one card loaded with the full deposit.
/// Returns (db, job, card) with the job at `Card issued`.
pub async fn setup_with_card(
    amount: f64,
) -> Result<(
    DatabaseConnection,
    entities::job::Model,
    entities::card::Model,
)> {
    let (db, job) = setup_with_paid_job(amount).await?;
    let request = IssueCard {
        vendors: vec!["Home Depot".to_string()],
        amount,
        issued_to: "Sam Carter".to_string(),
        role: None,
    };
    let card = card::issue_card(&db, &CardConfig::default(), job.id, request).await?;
    let job = job::get_job_by_id(&db, job.id)
        .await?
        .ok_or(Error::JobNotFound { id: job.id })?;
    Ok((db, job, card))
}

/// An unsaved active card with the given balance and expiry.
pub fn sample_card(remaining_amount: f64, expiry_date: NaiveDate) -> entities::card::Model {
    let now = Utc::now();
    entities::card::Model {
        id: 1,
        job_id: 1,
        card_number: "4000000000000000".to_string(),
        cvv: "123".to_string(),
        billing_zip: "94110".to_string(),
        expiry_date,
        status: entities::CardStatus::Active,
        initial_amount: remaining_amount,
        remaining_amount,
        vendors: "Home Depot".to_string(),
        issued_to: "Sam Carter".to_string(),
        role: None,
        created_at: now,
        updated_at: now,
    }
}
