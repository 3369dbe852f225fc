//! Receipt entity - An uploaded receipt image kept for audit.
//!
//! Receipts have no balance effect. They may point at a job, a card and the
//! purchase they document; any of those links can be absent.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Receipt database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "receipts")]
pub struct Model {
    /// Unique identifier for the receipt
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque id of the contractor who captured it
    pub owner_id: String,
    /// Job the receipt belongs to
    pub job_id: Option<i64>,
    /// Card the purchase was made with
    pub card_id: Option<i64>,
    /// Purchase ledger entry this receipt documents
    pub transaction_id: Option<i64>,
    /// When the receipt was captured
    pub timestamp: DateTimeUtc,
    /// Vendor printed on the receipt
    pub vendor: String,
    /// Receipt total in dollars (0 when captured for reference only)
    pub amount: f64,
    /// Free-form description
    pub description: Option<String>,
    /// Where the image is stored
    pub receipt_url: String,
    /// Review status (e.g., `"submitted"`)
    pub status: String,
}

/// Receipts link to jobs and cards by id only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
