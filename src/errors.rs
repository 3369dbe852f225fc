//! Unified error type for the lifecycle, card, ledger and receipt operations.
//!
//! Every caller-facing failure is a variant here so the HTTP layer can map it
//! to a status code without inspecting strings.

use crate::entities::job::JobStatus;
use thiserror::Error;

/// Errors produced by `JobVault` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// The underlying store rejected a query or write
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure (receipt storage, config)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required field is missing or malformed
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// An amount is zero, negative, or not a finite number where that is not allowed
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// No job with this id
    #[error("Job not found: {id}")]
    JobNotFound {
        /// Job id
        id: i64,
    },

    /// No card with this id
    #[error("Card not found: {id}")]
    CardNotFound {
        /// Card id
        id: i64,
    },

    /// No customer with this id
    #[error("Customer not found: {id}")]
    CustomerNotFound {
        /// Customer id
        id: i64,
    },

    /// No ledger entry with this id
    #[error("Transaction not found: {id}")]
    TransactionNotFound {
        /// Transaction id
        id: i64,
    },

    /// The card does not hold enough to cover the purchase
    #[error("Insufficient funds: card has ${current:.2}, purchase needs ${required:.2}")]
    InsufficientFunds {
        /// Remaining card balance
        current: f64,
        /// Purchase amount
        required: f64,
    },

    /// A job status change that the lifecycle does not allow
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: JobStatus,
        /// Requested status
        to: JobStatus,
    },

    /// The card is used or expired
    #[error("Card {id} is not active")]
    CardInactive {
        /// Card id
        id: i64,
    },

    /// Purchase vendor is not on the card's approved list
    #[error("Vendor '{vendor}' is not approved for card {card_id}")]
    VendorNotApproved {
        /// Card id
        card_id: i64,
        /// Rejected vendor name
        vendor: String,
    },

    /// No payment link with this token
    #[error("Payment link not found")]
    PaymentLinkNotFound,

    /// The payment link was already used or has expired
    #[error("Payment link is {status}")]
    PaymentLinkInactive {
        /// Current link status
        status: String,
    },
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
