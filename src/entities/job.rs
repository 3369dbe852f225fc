//! Job entity - A unit of contracted work with one customer and one deposit.
//!
//! The job's status is an explicit enum moved forward by the lifecycle
//! operations in [`crate::core::job`]. Spent and available funds are not
//! stored here; they are derived from the ledger on read.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a job.
///
/// Stored as the human-readable label shown to contractors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum JobStatus {
    /// Job created, deposit requested from the customer
    #[sea_orm(string_value = "Deposit request sent")]
    #[serde(rename = "Deposit request sent")]
    DepositRequestSent,
    /// Customer paid the deposit
    #[sea_orm(string_value = "Deposit paid")]
    #[serde(rename = "Deposit paid")]
    DepositPaid,
    /// A virtual card was issued against the deposit
    #[sea_orm(string_value = "Card issued")]
    #[serde(rename = "Card issued")]
    CardIssued,
    /// At least one purchase was recorded
    #[sea_orm(string_value = "Materials purchased")]
    #[serde(rename = "Materials purchased")]
    MaterialsPurchased,
}

impl JobStatus {
    /// Position in the lifecycle, starting at 0.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::DepositRequestSent => 0,
            Self::DepositPaid => 1,
            Self::CardIssued => 2,
            Self::MaterialsPurchased => 3,
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Only forward moves are allowed. `MaterialsPurchased` may repeat since
    /// every purchase re-asserts it.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        next.rank() > self.rank()
            || matches!(
                (self, next),
                (Self::MaterialsPurchased, Self::MaterialsPurchased)
            )
    }

    /// Whether the job has reached `other` (or a later status).
    #[must_use]
    pub const fn is_at_least(self, other: Self) -> bool {
        self.rank() >= other.rank()
    }

    /// Display label, identical to the stored value.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DepositRequestSent => "Deposit request sent",
            Self::DepositPaid => "Deposit paid",
            Self::CardIssued => "Card issued",
            Self::MaterialsPurchased => "Materials purchased",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Job database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    /// Unique identifier for the job
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Opaque id of the contractor who owns this job
    pub owner_id: String,
    /// Customer the work is done for
    pub customer_id: i64,
    /// Short job name (e.g., "Kitchen remodel")
    pub name: String,
    /// Job site address
    pub address: Option<String>,
    /// Materials-only deposit requested from the customer, in dollars
    pub deposit_amount: f64,
    /// Current lifecycle status
    pub status: JobStatus,
    /// Planned start date
    pub start_date: Option<Date>,
    /// When the job was created
    pub created_at: DateTimeUtc,
    /// When the job was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Job and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each job belongs to one customer
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    /// One job has many cards
    #[sea_orm(has_many = "super::card::Entity")]
    Cards,
    /// One job has many ledger entries
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// Join rows linking this job to its approved vendors
    #[sea_orm(has_many = "super::job_vendor::Entity")]
    JobVendors,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::card::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cards.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::job_vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobVendors.def()
    }
}

impl Related<super::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        super::job_vendor::Relation::Vendor.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::job_vendor::Relation::Job.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
