//! Vendor lookup and seeding.
//!
//! Vendor names are unique ignoring ASCII case. Callers refer to vendors by
//! name and the row is created on first use.

use crate::{
    config::settings::VendorConfig,
    entities::{CardVendor, JobVendor, Vendor, card_vendor, job_vendor, vendor},
    errors::Result,
};
use sea_orm::{
    QueryOrder, Set,
    prelude::*,
    sea_query::{Expr, Func},
};
use tracing::{debug, info};

/// Trims and de-duplicates vendor names, dropping blanks. Order is preserved.
#[must_use]
pub fn normalize_vendor_names(names: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() || seen.iter().any(|s| s.eq_ignore_ascii_case(trimmed)) {
            continue;
        }
        seen.push(trimmed.to_string());
    }
    seen
}

/// Finds a vendor by trimmed name, ignoring ASCII case.
pub async fn get_vendor_by_name<C>(conn: &C, name: &str) -> Result<Option<vendor::Model>>
where
    C: ConnectionTrait,
{
    Vendor::find()
        .filter(
            Expr::expr(Func::lower(Expr::col(vendor::Column::Name)))
                .eq(name.trim().to_ascii_lowercase()),
        )
        .order_by_asc(vendor::Column::Id)
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Returns the vendor with this name, creating it if it does not exist yet.
pub async fn find_or_create_vendor<C>(conn: &C, name: &str) -> Result<vendor::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = get_vendor_by_name(conn, name).await? {
        return Ok(existing);
    }

    debug!(vendor = name.trim(), "Creating vendor");
    let vendor = vendor::ActiveModel {
        name: Set(name.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    vendor.insert(conn).await.map_err(Into::into)
}

/// Links `vendor_ids` to a job through the `job_vendors` join table.
pub async fn link_vendors_to_job<C>(conn: &C, job_id: i64, vendor_ids: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    for &vendor_id in vendor_ids {
        job_vendor::ActiveModel {
            job_id: Set(job_id),
            vendor_id: Set(vendor_id),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

/// Links `vendor_ids` to a card through the `card_vendors` join table.
pub async fn link_vendors_to_card<C>(conn: &C, card_id: i64, vendor_ids: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    for &vendor_id in vendor_ids {
        card_vendor::ActiveModel {
            card_id: Set(card_id),
            vendor_id: Set(vendor_id),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn vendors_by_ids<C>(conn: &C, vendor_ids: Vec<i64>) -> Result<Vec<vendor::Model>>
where
    C: ConnectionTrait,
{
    if vendor_ids.is_empty() {
        return Ok(Vec::new());
    }

    Vendor::find()
        .filter(vendor::Column::Id.is_in(vendor_ids))
        .order_by_asc(vendor::Column::Name)
        .all(conn)
        .await
        .map_err(Into::into)
}

/// Vendors approved for a job, ordered by name.
pub async fn vendors_for_job<C>(conn: &C, job_id: i64) -> Result<Vec<vendor::Model>>
where
    C: ConnectionTrait,
{
    let vendor_ids = JobVendor::find()
        .filter(job_vendor::Column::JobId.eq(job_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|link| link.vendor_id)
        .collect();

    vendors_by_ids(conn, vendor_ids).await
}

/// Vendors a card may be used at, ordered by name. Empty means any vendor.
pub async fn vendors_for_card<C>(conn: &C, card_id: i64) -> Result<Vec<vendor::Model>>
where
    C: ConnectionTrait,
{
    let vendor_ids = CardVendor::find()
        .filter(card_vendor::Column::CardId.eq(card_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|link| link.vendor_id)
        .collect();

    vendors_by_ids(conn, vendor_ids).await
}

/// All known vendors, ordered by name.
pub async fn list_vendors(db: &DatabaseConnection) -> Result<Vec<vendor::Model>> {
    Vendor::find()
        .order_by_asc(vendor::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates any configured vendors that are missing.
pub async fn seed_vendors(db: &DatabaseConnection, vendors: &[VendorConfig]) -> Result<usize> {
    let names: Vec<String> = vendors.iter().map(|v| v.name.clone()).collect();
    let mut created = 0;
    for name in normalize_vendor_names(&names) {
        if get_vendor_by_name(db, &name).await?.is_none() {
            find_or_create_vendor(db, &name).await?;
            created += 1;
        }
    }
    info!(created, "Seeded vendors from configuration");
    Ok(created)
}
