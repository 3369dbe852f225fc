/// Database connection and table creation
pub mod database;

/// Application settings from config.toml
pub mod settings;

pub use settings::{AppConfig, PurchasePolicy};
