//! Customer lookup-or-create used when a job is opened.

use crate::{
    entities::{Customer, customer},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use serde::Deserialize;

/// Customer fields collected with a new job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCustomer {
    /// Required
    pub name: String,
    /// Used to recognise returning customers
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Checks the fields that must be present before anything is written.
pub fn validate_customer(new_customer: &NewCustomer) -> Result<()> {
    if new_customer.name.trim().is_empty() {
        return Err(Error::validation("Customer name cannot be empty"));
    }
    Ok(())
}

/// Reuses the owner's customer with the same email (or, without an email,
/// the same name), otherwise inserts a new one.
pub async fn find_or_create_customer<C>(
    conn: &C,
    owner_id: &str,
    new_customer: &NewCustomer,
) -> Result<customer::Model>
where
    C: ConnectionTrait,
{
    validate_customer(new_customer)?;

    let name = new_customer.name.trim().to_string();
    let email = non_blank(new_customer.email.as_ref());

    let existing = match &email {
        Some(email) => {
            Customer::find()
                .filter(customer::Column::OwnerId.eq(owner_id))
                .filter(customer::Column::Email.eq(email.as_str()))
                .one(conn)
                .await?
        }
        None => {
            Customer::find()
                .filter(customer::Column::OwnerId.eq(owner_id))
                .filter(customer::Column::Name.eq(name.as_str()))
                .one(conn)
                .await?
        }
    };
    if let Some(existing) = existing {
        return Ok(existing);
    }

    let now = chrono::Utc::now();
    customer::ActiveModel {
        owner_id: Set(owner_id.to_string()),
        name: Set(name),
        email: Set(email),
        phone: Set(non_blank(new_customer.phone.as_ref())),
        address: Set(non_blank(new_customer.address.as_ref())),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(Into::into)
}

/// Finds a customer by id.
pub async fn get_customer_by_id<C>(conn: &C, customer_id: i64) -> Result<Option<customer::Model>>
where
    C: ConnectionTrait,
{
    Customer::find_by_id(customer_id)
        .one(conn)
        .await
        .map_err(Into::into)
}
