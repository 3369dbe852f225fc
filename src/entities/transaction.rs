//! Transaction entity - One row of the append-only ledger.
//!
//! Every financial event on a job is one of five `transaction_type`s. Purchase
//! rows carry a negative `amount`; all other types are non-negative.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of ledger event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum TransactionType {
    /// Deposit requested from the customer
    #[sea_orm(string_value = "Request")]
    Request,
    /// Deposit received
    #[sea_orm(string_value = "Deposit")]
    Deposit,
    /// Virtual card issued
    #[sea_orm(string_value = "Card Issued")]
    #[serde(rename = "Card Issued")]
    CardIssued,
    /// Materials bought with job funds
    #[sea_orm(string_value = "Purchase")]
    Purchase,
    /// Receipt captured for audit
    #[sea_orm(string_value = "Receipt")]
    Receipt,
}

impl TransactionType {
    /// Display label, identical to the stored value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Request => "Request",
            Self::Deposit => "Deposit",
            Self::CardIssued => "Card Issued",
            Self::Purchase => "Purchase",
            Self::Receipt => "Receipt",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Settlement status of a ledger entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Awaiting the customer (deposit requests)
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Job this entry belongs to
    pub job_id: i64,
    /// Card involved, if any
    pub card_id: Option<i64>,
    /// Receipt row this entry mirrors, for `Receipt` entries
    pub receipt_id: Option<i64>,
    /// When the event happened
    pub timestamp: DateTimeUtc,
    /// Kind of event
    pub transaction_type: TransactionType,
    /// Vendor name, or the approved vendor list for `Card Issued`
    pub vendor: Option<String>,
    /// Signed amount in dollars (negative for purchases)
    pub amount: f64,
    /// Settlement status
    pub status: TransactionStatus,
    /// Free-form description
    pub description: Option<String>,
    /// Link to a stored receipt image
    pub receipt_url: Option<String>,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one job
    #[sea_orm(
        belongs_to = "super::job::Entity",
        from = "Column::JobId",
        to = "super::job::Column::Id"
    )]
    Job,
    /// Optionally belongs to one card
    #[sea_orm(
        belongs_to = "super::card::Entity",
        from = "Column::CardId",
        to = "super::card::Column::Id"
    )]
    Card,
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl Related<super::card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Card.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
