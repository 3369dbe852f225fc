//! Card entity - A virtual spending limit scoped to one job and a vendor list.
//!
//! The card number, CVV and billing zip are decorative strings generated at
//! issuance. They carry no payment-network meaning.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Card status as shown to contractors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    /// Card can be spent against
    #[sea_orm(string_value = "active")]
    Active,
    /// Balance exhausted
    #[sea_orm(string_value = "used")]
    Used,
    /// Past its expiry date
    #[sea_orm(string_value = "expired")]
    Expired,
}

/// Card database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    /// Unique identifier for the card
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Job the card draws on
    pub job_id: i64,
    /// Decorative 16-digit card number
    pub card_number: String,
    /// Decorative 3-digit security code
    pub cvv: String,
    /// Decorative billing zip code
    pub billing_zip: String,
    /// Last day the card may be used
    pub expiry_date: Date,
    /// Stored status, refreshed whenever the balance changes
    pub status: CardStatus,
    /// Amount loaded at issuance, in dollars
    pub initial_amount: f64,
    /// Amount left to spend, in dollars
    pub remaining_amount: f64,
    /// Approved vendor names joined with ", " for display; the approved set
    /// itself lives in `card_vendors` (empty means any vendor)
    pub vendors: String,
    /// Name of the person holding the card
    pub issued_to: String,
    /// Role of the holder on the job (e.g., "Foreman")
    pub role: Option<String>,
    /// When the card was issued
    pub created_at: DateTimeUtc,
    /// When the card was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Card and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each card belongs to one job
    #[sea_orm(
        belongs_to = "super::job::Entity",
        from = "Column::JobId",
        to = "super::job::Column::Id"
    )]
    Job,
    /// One card has many ledger entries
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// Approved vendors through the `card_vendors` join table
    #[sea_orm(has_many = "super::card_vendor::Entity")]
    CardVendors,
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::card_vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CardVendors.def()
    }
}

impl Related<super::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        super::card_vendor::Relation::Vendor.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::card_vendor::Relation::Card.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
