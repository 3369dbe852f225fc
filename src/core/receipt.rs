//! Receipt capture.
//!
//! A receipt is an image reference kept for audit. It never changes a card
//! balance or a job total. Callers that want it in the unified ledger feed
//! set `mirror_to_ledger`, which appends a `Receipt` entry linked back to the
//! receipt row in the same database transaction.

use crate::{
    core::{
        card, job,
        ledger::{self, NewEntry},
    },
    entities::{Receipt, receipt, transaction::TransactionType},
    errors::{Error, Result},
    storage::{self, ReceiptStore},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Status given to newly captured receipts.
pub const SUBMITTED: &str = "submitted";

/// Fields for a receipt entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReceipt {
    /// Opaque id of the contractor capturing the receipt
    pub owner_id: String,
    #[serde(default)]
    pub job_id: Option<i64>,
    #[serde(default)]
    pub card_id: Option<i64>,
    /// Purchase entry this receipt documents
    #[serde(default)]
    pub transaction_id: Option<i64>,
    #[serde(default)]
    pub vendor: String,
    /// Receipt total; 0 for reference-only captures
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    /// URL returned by [`upload_image`]
    pub receipt_url: String,
    /// Also append a `Receipt` entry to the job's ledger
    #[serde(default)]
    pub mirror_to_ledger: bool,
}

/// Stores a receipt image under the owner's namespace and returns its URL.
///
/// # Errors
/// Returns [`Error::Validation`] if the owner, file name or file contents are missing.
pub async fn upload_image(
    store: &dyn ReceiptStore,
    owner_id: &str,
    file_name: &str,
    bytes: &[u8],
) -> Result<String> {
    if owner_id.trim().is_empty() {
        return Err(Error::validation("Owner id is required"));
    }
    if file_name.trim().is_empty() || bytes.is_empty() {
        return Err(Error::validation("A receipt file is required"));
    }

    let key = storage::receipt_key(owner_id, file_name);
    store.put(&key, bytes).await
}

fn validate_receipt(new_receipt: &NewReceipt) -> Result<()> {
    if new_receipt.owner_id.trim().is_empty() {
        return Err(Error::validation("Owner id is required"));
    }
    if new_receipt.receipt_url.trim().is_empty() {
        return Err(Error::validation("Receipt URL is required"));
    }
    if !new_receipt.amount.is_finite() || new_receipt.amount < 0.0 {
        return Err(Error::InvalidAmount {
            amount: new_receipt.amount,
        });
    }
    Ok(())
}

/// Records a receipt, optionally mirrored into the ledger.
///
/// A card or ledger transaction implies its job; every given link must point
/// at the same job. Linked ids must exist. Mirroring needs a job since every ledger entry belongs to one.
///
/// # Errors
/// - [`Error::Validation`] / [`Error::InvalidAmount`] for bad input
/// - [`Error::JobNotFound`], [`Error::CardNotFound`], [`Error::TransactionNotFound`]
///   for unknown links
#[instrument(skip(db, new_receipt), fields(owner_id = %new_receipt.owner_id))]
pub async fn create_receipt_entry(
    db: &DatabaseConnection,
    new_receipt: NewReceipt,
) -> Result<receipt::Model> {
    validate_receipt(&new_receipt)?;

    let txn = db.begin().await?;

    let mut job_id = new_receipt.job_id;
    if let Some(card_id) = new_receipt.card_id {
        let card = card::get_card_by_id(&txn, card_id)
            .await?
            .ok_or(Error::CardNotFound { id: card_id })?;
        if job_id.is_some_and(|id| id != card.job_id) {
            return Err(Error::validation(format!(
                "Card {card_id} does not belong to the given job"
            )));
        }
        job_id = Some(card.job_id);
    }
    if let Some(id) = new_receipt.transaction_id {
        let entry = ledger::get_transaction_by_id(&txn, id)
            .await?
            .ok_or(Error::TransactionNotFound { id })?;
        if job_id.is_some_and(|given| given != entry.job_id) {
            return Err(Error::validation(format!(
                "Transaction {id} does not belong to the given job"
            )));
        }
        job_id = Some(entry.job_id);
    }
    if let Some(id) = job_id {
        job::get_job_by_id(&txn, id)
            .await?
            .ok_or(Error::JobNotFound { id })?;
    }
    if new_receipt.mirror_to_ledger && job_id.is_none() {
        return Err(Error::validation(
            "A job is required to add a receipt to the ledger",
        ));
    }

    let vendor = new_receipt.vendor.trim().to_string();
    let description = new_receipt
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let receipt = receipt::ActiveModel {
        owner_id: Set(new_receipt.owner_id.trim().to_string()),
        job_id: Set(job_id),
        card_id: Set(new_receipt.card_id),
        transaction_id: Set(new_receipt.transaction_id),
        timestamp: Set(chrono::Utc::now()),
        vendor: Set(vendor.clone()),
        amount: Set(new_receipt.amount),
        description: Set(description.clone()),
        receipt_url: Set(new_receipt.receipt_url.trim().to_string()),
        status: Set(SUBMITTED.to_string()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let (true, Some(job_id)) = (new_receipt.mirror_to_ledger, job_id) {
        let mut entry = NewEntry::new(job_id, TransactionType::Receipt, receipt.amount);
        entry.card_id = receipt.card_id;
        entry.receipt_id = Some(receipt.id);
        entry.vendor = (!vendor.is_empty()).then_some(vendor);
        entry.description = description;
        entry.receipt_url = Some(receipt.receipt_url.clone());
        ledger::append(&txn, entry).await?;
    }

    txn.commit().await?;

    info!(receipt_id = receipt.id, job_id = ?receipt.job_id, "Captured receipt");
    Ok(receipt)
}

/// Receipts attached to a job, newest first.
pub async fn list_receipts_for_job(
    db: &DatabaseConnection,
    job_id: i64,
) -> Result<Vec<receipt::Model>> {
    Receipt::find()
        .filter(receipt::Column::JobId.eq(job_id))
        .order_by_desc(receipt::Column::Timestamp)
        .order_by_desc(receipt::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Receipts captured by an owner, newest first.
pub async fn list_receipts_for_owner(
    db: &DatabaseConnection,
    owner_id: &str,
) -> Result<Vec<receipt::Model>> {
    Receipt::find()
        .filter(receipt::Column::OwnerId.eq(owner_id))
        .order_by_desc(receipt::Column::Timestamp)
        .order_by_desc(receipt::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::storage::LocalReceiptStore;
    use crate::test_utils::*;

    fn new_receipt(job_id: Option<i64>, card_id: Option<i64>, amount: f64) -> NewReceipt {
        NewReceipt {
            owner_id: TEST_OWNER.to_string(),
            job_id,
            card_id,
            vendor: "Home Depot".to_string(),
            amount,
            receipt_url: "http://localhost/receipts/owner/r.jpg".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upload_image_validation() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = LocalReceiptStore::new(dir.path(), "http://localhost/receipts");

        let result = upload_image(&store, "", "r.jpg", b"bytes").await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let result = upload_image(&store, "owner-1", "r.jpg", b"").await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let url = upload_image(&store, "owner-1", "r.jpg", b"bytes").await?;
        assert!(url.starts_with("http://localhost/receipts/owner-1/"));
        assert!(url.ends_with("-r.jpg"));
        Ok(())
    }

    #[tokio::test]
    async fn test_zero_amount_receipt_has_no_aggregate_effect() -> Result<()> {
        let (db, job, card) = setup_with_card(400.0).await?;
        let before = job::job_summary(&db, job.id).await?;

        let mut receipt = new_receipt(None, Some(card.id), 0.0);
        receipt.mirror_to_ledger = true;
        let receipt = create_receipt_entry(&db, receipt).await?;
        assert_eq!(receipt.job_id, Some(job.id));
        assert_eq!(receipt.status, SUBMITTED);

        let after = job::job_summary(&db, job.id).await?;
        assert_eq!(after.spent_amount, before.spent_amount);
        assert_eq!(after.available_funds, before.available_funds);
        assert_eq!(after.job.status, before.job.status);

        let card_after = card::get_card_by_id(&db, card.id).await?.unwrap();
        assert_eq!(card_after.remaining_amount, card.remaining_amount);
        assert_eq!(card_after.status, card.status);
        Ok(())
    }

    #[tokio::test]
    async fn test_mirrored_receipt_appears_in_ledger() -> Result<()> {
        let (db, job) = setup_with_job(100.0).await?;

        let mut receipt = new_receipt(Some(job.id), None, 42.5);
        receipt.mirror_to_ledger = true;
        let receipt = create_receipt_entry(&db, receipt).await?;

        let entries = ledger::list_by_job(&db, job.id).await?;
        assert_eq!(entries[0].transaction_type, TransactionType::Receipt);
        assert_eq!(entries[0].receipt_id, Some(receipt.id));
        assert_eq!(entries[0].amount, 42.5);
        assert_eq!(entries[0].receipt_url.as_deref(), Some(receipt.receipt_url.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn test_unmirrored_receipt_stays_out_of_ledger() -> Result<()> {
        let (db, job) = setup_with_job(100.0).await?;

        create_receipt_entry(&db, new_receipt(Some(job.id), None, 0.0)).await?;

        assert_eq!(ledger::list_by_job(&db, job.id).await?.len(), 1);
        assert_eq!(list_receipts_for_job(&db, job.id).await?.len(), 1);
        assert_eq!(list_receipts_for_owner(&db, TEST_OWNER).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_standalone_receipt_without_job() -> Result<()> {
        let db = setup_test_db().await?;

        let receipt = create_receipt_entry(&db, new_receipt(None, None, 0.0)).await?;
        assert_eq!(receipt.job_id, None);

        let mut mirrored = new_receipt(None, None, 0.0);
        mirrored.mirror_to_ledger = true;
        let result = create_receipt_entry(&db, mirrored).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));
        Ok(())
    }

    #[tokio::test]
    async fn test_receipt_validation_and_links() -> Result<()> {
        let (db, job) = setup_with_job(100.0).await?;

        let result = create_receipt_entry(&db, new_receipt(Some(job.id), None, -1.0)).await;
        assert!(matches!(result, Err(Error::InvalidAmount { amount: -1.0 })));

        let mut no_url = new_receipt(Some(job.id), None, 0.0);
        no_url.receipt_url = " ".to_string();
        let result = create_receipt_entry(&db, no_url).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));

        let result = create_receipt_entry(&db, new_receipt(Some(999), None, 0.0)).await;
        assert!(matches!(result, Err(Error::JobNotFound { id: 999 })));

        let result = create_receipt_entry(&db, new_receipt(None, Some(999), 0.0)).await;
        assert!(matches!(result, Err(Error::CardNotFound { id: 999 })));

        let mut bad_link = new_receipt(Some(job.id), None, 0.0);
        bad_link.transaction_id = Some(999);
        let result = create_receipt_entry(&db, bad_link).await;
        assert!(matches!(result, Err(Error::TransactionNotFound { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_receipt_card_must_match_job() -> Result<()> {
        let (db, _job, card) = setup_with_card(100.0).await?;
        let other = create_test_job(&db, "Other", 50.0).await?;

        let result =
            create_receipt_entry(&db, new_receipt(Some(other.id), Some(card.id), 0.0)).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));
        Ok(())
    }

    #[tokio::test]
    async fn test_receipt_transaction_must_match_job() -> Result<()> {
        let (db, job) = setup_with_job(100.0).await?;
        let other = create_test_job(&db, "Other", 50.0).await?;
        let other_entry = ledger::list_by_job(&db, other.id).await?.remove(0);

        let mut cross_job = new_receipt(Some(job.id), None, 0.0);
        cross_job.transaction_id = Some(other_entry.id);
        let result = create_receipt_entry(&db, cross_job).await;
        assert!(matches!(result, Err(Error::Validation { message: _ })));
        assert!(list_receipts_for_job(&db, job.id).await?.is_empty());

        // Without an explicit job the receipt takes the transaction's job
        let mut linked = new_receipt(None, None, 0.0);
        linked.transaction_id = Some(other_entry.id);
        let receipt = create_receipt_entry(&db, linked).await?;
        assert_eq!(receipt.job_id, Some(other.id));
        Ok(())
    }
}
