//! Payment links - Opaque tokens customers use to pay a job's deposit.
//!
//! Processing a payment marks the deposit paid and issues a card for the job
//! in one database transaction. The link is claimed with a guarded update so
//! a token can be paid at most once.

use crate::{
    config::settings::CardConfig,
    core::{
        card::{self, IssueCard},
        job,
    },
    entities::{
        PaymentLink, card as card_entity, job as job_entity,
        payment_link::{self, LinkStatus},
    },
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Card details supplied when a link is paid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentRequest {
    /// Card holder name
    pub issued_to: String,
    #[serde(default)]
    pub role: Option<String>,
    /// Approved vendors; empty means the job's vendors
    #[serde(default)]
    pub vendors: Vec<String>,
    /// Card load; defaults to the job's deposit
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Creates an active link for a job that expires after `ttl`.
///
/// # Errors
/// - [`Error::Validation`] if `ttl` is not positive or runs past the latest
///   representable time
/// - [`Error::JobNotFound`] if the job does not exist
#[instrument(skip(db))]
pub async fn create_payment_link(
    db: &DatabaseConnection,
    job_id: i64,
    ttl: Duration,
) -> Result<payment_link::Model> {
    if ttl <= Duration::zero() {
        return Err(Error::validation("Payment link lifetime must be positive"));
    }
    job::get_job_by_id(db, job_id)
        .await?
        .ok_or(Error::JobNotFound { id: job_id })?;

    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(ttl)
        .ok_or_else(|| Error::validation("Payment link lifetime is too long"))?;
    let link = payment_link::ActiveModel {
        token: Set(Uuid::new_v4().simple().to_string()),
        job_id: Set(job_id),
        status: Set(LinkStatus::Active),
        expires_at: Set(expires_at),
        created_at: Set(now),
        used_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(job_id, link_id = link.id, expires_at = %link.expires_at, "Created payment link");
    Ok(link)
}

/// Finds a link by token without checking its status.
pub async fn get_link_by_token<C>(conn: &C, token: &str) -> Result<Option<payment_link::Model>>
where
    C: ConnectionTrait,
{
    PaymentLink::find()
        .filter(payment_link::Column::Token.eq(token))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Returns the link if it can still be paid.
///
/// An active link found past its expiry is marked `expired` first.
///
/// # Errors
/// - [`Error::PaymentLinkNotFound`] for unknown tokens
/// - [`Error::PaymentLinkInactive`] for used or expired links
pub async fn resolve_payment_link(
    db: &DatabaseConnection,
    token: &str,
) -> Result<payment_link::Model> {
    let link = get_link_by_token(db, token)
        .await?
        .ok_or(Error::PaymentLinkNotFound)?;

    match link.status {
        LinkStatus::Active if Utc::now() > link.expires_at => {
            warn!(link_id = link.id, "Payment link expired");
            let mut active: payment_link::ActiveModel = link.into();
            active.status = Set(LinkStatus::Expired);
            active.update(db).await?;
            Err(Error::PaymentLinkInactive {
                status: LinkStatus::Expired.as_str().to_string(),
            })
        }
        LinkStatus::Active => Ok(link),
        status => Err(Error::PaymentLinkInactive {
            status: status.as_str().to_string(),
        }),
    }
}

/// Pays a link: marks the deposit paid, issues a card and uses up the link.
///
/// Marking the deposit is idempotent, so a job whose deposit was already
/// recorded does not get a second `Deposit` entry.
///
/// # Errors
/// Link errors from [`resolve_payment_link`], plus any error from issuing the card.
#[instrument(skip(db, cards, token, request))]
pub async fn process_payment(
    db: &DatabaseConnection,
    cards: &CardConfig,
    token: &str,
    request: PaymentRequest,
) -> Result<(job_entity::Model, card_entity::Model)> {
    let link = resolve_payment_link(db, token).await?;

    let txn = db.begin().await?;

    let now = Utc::now();
    let claimed = PaymentLink::update_many()
        .col_expr(payment_link::Column::Status, Expr::value(LinkStatus::Used))
        .col_expr(payment_link::Column::UsedAt, Expr::value(now))
        .filter(payment_link::Column::Id.eq(link.id))
        .filter(payment_link::Column::Status.eq(LinkStatus::Active))
        .exec(&txn)
        .await?;
    if claimed.rows_affected == 0 {
        return Err(Error::PaymentLinkInactive {
            status: LinkStatus::Used.as_str().to_string(),
        });
    }

    let job = job::mark_deposit_paid_in(&txn, link.job_id).await?;
    let issue = IssueCard {
        vendors: request.vendors,
        amount: request.amount.unwrap_or(job.deposit_amount),
        issued_to: request.issued_to,
        role: request.role,
    };
    let (job, card) = card::issue_card_in(&txn, cards, job, &issue).await?;

    txn.commit().await?;

    info!(job_id = job.id, card_id = card.id, "Processed payment link");
    Ok((job, card))
}
