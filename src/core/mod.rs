/// Virtual cards: issuance, balances and status
pub mod card;
/// Customer lookup and creation
pub mod customer;
/// Job lifecycle, deposits and purchases
pub mod job;
/// Append-only transaction ledger
pub mod ledger;
/// Deposit payment links
pub mod payment_link;
/// Receipt capture and image upload
pub mod receipt;
/// Job reports and ledger formatting
pub mod report;
/// Vendor registry and job vendor lists
pub mod vendor;
