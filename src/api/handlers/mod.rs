//! API handlers.

pub mod cards;
pub mod health;
pub mod jobs;
pub mod ledger;
pub mod payments;
pub mod receipts;
