//! Application settings loaded from `config.toml`.
//!
//! Every section is optional; a missing file yields the defaults. The
//! `[[vendors]]` list seeds the approved-vendor table on startup.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming an alternate config file.
pub const CONFIG_PATH_ENV: &str = "JOBVAULT_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Ledger side-effect policy
    pub ledger: LedgerConfig,
    /// Card issuance settings
    pub cards: CardConfig,
    /// Payment link settings
    pub payment_links: PaymentLinkConfig,
    /// Receipt image storage
    pub receipts: ReceiptConfig,
    /// Vendors to create on startup
    pub vendors: Vec<VendorConfig>,
}

/// `[server]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind
    pub listen_addr: String,
    /// Allowed CORS origins ("*" for any)
    pub cors_origins: Vec<String>,
    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
    /// Per-request timeout
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".to_string(),
            cors_origins: vec!["*".to_string()],
            max_body_bytes: 10 * 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

/// What a recorded purchase does besides appending to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchasePolicy {
    /// Purchases must name a card of the job and debit its balance
    #[default]
    DebitCard,
    /// Purchases only hit the ledger; cards are left untouched
    JobOnly,
}

/// `[ledger]`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Side effect applied by purchases
    pub purchase_policy: PurchasePolicy,
}

/// `[cards]`
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    /// Months from issuance until a card expires
    pub validity_months: u32,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self { validity_months: 12 }
    }
}

/// `[payment_links]`
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PaymentLinkConfig {
    /// Hours a new link stays payable
    pub ttl_hours: i64,
}

impl Default for PaymentLinkConfig {
    fn default() -> Self {
        Self { ttl_hours: 72 }
    }
}

impl PaymentLinkConfig {
    /// Link lifetime as a duration.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `ttl_hours` is not positive or does not
    /// fit in a duration.
    pub fn ttl(&self) -> Result<chrono::Duration> {
        chrono::Duration::try_hours(self.ttl_hours)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| Error::Config {
                message: format!(
                    "payment_links.ttl_hours is out of range: {}",
                    self.ttl_hours
                ),
            })
    }
}

/// `[receipts]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReceiptConfig {
    /// Directory receipt images are written to
    pub storage_dir: String,
    /// URL prefix under which `storage_dir` is served
    pub public_base_url: String,
}

impl Default for ReceiptConfig {
    fn default() -> Self {
        Self {
            storage_dir: "data/receipts".to_string(),
            public_base_url: "http://127.0.0.1:3000/receipts".to_string(),
        }
    }
}

/// Configuration for a single approved vendor
#[derive(Debug, Clone, Deserialize)]
pub struct VendorConfig {
    /// Vendor display name
    pub name: String,
}

/// Parses configuration from TOML text.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML is malformed or a value has the wrong type.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.payment_links.ttl()?;
    Ok(config)
}

/// Loads configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or does not parse.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.as_ref().display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from `$JOBVAULT_CONFIG` or `./config.toml`.
///
/// A missing file is not an error; defaults are used instead.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        tracing::debug!(%path, "Loading configuration");
        load_config(&path)
    } else {
        tracing::info!(%path, "No config file found, using defaults");
        Ok(AppConfig::default())
    }
}
