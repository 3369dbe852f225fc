//! Vendor entity - A store where card funds may be spent.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Vendor database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vendors")]
pub struct Model {
    /// Unique identifier for the vendor
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Home Depot"), unique
    #[sea_orm(unique)]
    pub name: String,
    /// When the vendor was first seen
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Vendor and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Join rows linking this vendor to jobs
    #[sea_orm(has_many = "super::job_vendor::Entity")]
    JobVendors,
    /// Join rows linking this vendor to cards
    #[sea_orm(has_many = "super::card_vendor::Entity")]
    CardVendors,
}

impl Related<super::card_vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CardVendors.def()
    }
}

impl Related<super::job_vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JobVendors.def()
    }
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        super::job_vendor::Relation::Job.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::job_vendor::Relation::Vendor.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
