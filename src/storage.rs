//! Receipt image storage.
//!
//! [`ReceiptStore`] is the seam to whatever object storage holds receipt
//! images. [`LocalReceiptStore`] writes to a directory that the HTTP service
//! serves under `/receipts`.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// Stores receipt images and hands back a retrievable URL.
#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Writes `bytes` under `key` and returns the public URL.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String>;
}

/// Replaces everything but ASCII alphanumerics, `.`, `-` and `_` with `_`.
fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    // No hidden files or parent-directory segments
    cleaned.trim_start_matches('.').to_string()
}

/// Per-owner storage key: `<owner>/<uuid>-<file name>`.
#[must_use]
pub fn receipt_key(owner_id: &str, file_name: &str) -> String {
    format!(
        "{}/{}-{}",
        sanitize_segment(owner_id),
        Uuid::new_v4().simple(),
        sanitize_segment(file_name)
    )
}

/// Receipt store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalReceiptStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalReceiptStore {
    /// Store rooted at `root`, serving files under `public_base_url`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Directory images are written to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ReceiptStore for LocalReceiptStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String> {
        if key.split('/').any(|segment| segment.is_empty() || segment == "..") {
            return Err(Error::validation(format!("Invalid storage key: {key}")));
        }

        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Stored receipt image");

        Ok(format!("{}/{key}", self.public_base_url))
    }
}
