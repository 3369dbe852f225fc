//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod card;
pub mod card_vendor;
pub mod customer;
pub mod job;
pub mod job_vendor;
pub mod payment_link;
pub mod receipt;
pub mod transaction;
pub mod vendor;

// Re-export specific types to avoid conflicts
pub use card::{CardStatus, Column as CardColumn, Entity as Card, Model as CardModel};
pub use card_vendor::{
    Column as CardVendorColumn, Entity as CardVendor, Model as CardVendorModel,
};
pub use customer::{Column as CustomerColumn, Entity as Customer, Model as CustomerModel};
pub use job::{Column as JobColumn, Entity as Job, JobStatus, Model as JobModel};
pub use job_vendor::{Column as JobVendorColumn, Entity as JobVendor, Model as JobVendorModel};
pub use payment_link::{
    Column as PaymentLinkColumn, Entity as PaymentLink, LinkStatus, Model as PaymentLinkModel,
};
pub use receipt::{Column as ReceiptColumn, Entity as Receipt, Model as ReceiptModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
    TransactionStatus, TransactionType,
};
pub use vendor::{Column as VendorColumn, Entity as Vendor, Model as VendorModel};
