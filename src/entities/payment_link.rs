//! Payment link entity - An opaque token a customer uses to pay a job's deposit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment link status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    /// Can still be paid
    #[sea_orm(string_value = "active")]
    Active,
    /// Payment was processed
    #[sea_orm(string_value = "used")]
    Used,
    /// Passed `expires_at` before being used
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl LinkStatus {
    /// Stored value, for messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Used => "used",
            Self::Expired => "expired",
        }
    }
}

/// Payment link database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_links")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Random opaque token sent to the customer
    #[sea_orm(unique)]
    pub token: String,
    /// Job whose deposit this link collects
    pub job_id: i64,
    /// Current status
    pub status: LinkStatus,
    /// After this instant the link can no longer be used
    pub expires_at: DateTimeUtc,
    /// When the link was created
    pub created_at: DateTimeUtc,
    /// When payment was processed
    pub used_at: Option<DateTimeUtc>,
}

/// Defines relationships between `PaymentLink` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each link belongs to one job
    #[sea_orm(
        belongs_to = "super::job::Entity",
        from = "Column::JobId",
        to = "super::job::Column::Id"
    )]
    Job,
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
