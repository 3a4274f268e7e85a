//! Blob store facade: the capability set the vault engine programs against
//!
//! Keys are flat paths under fixed namespaces (`encrypted/`, `metadata/`).
//! Missing keys surface as `VaultError::NotFound` from `get`/`info`;
//! `delete` is idempotent; `list` returns keys in sorted order. The store
//! assumes per-key atomicity from the backend and nothing across keys.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use opendal::Operator;
use sha2::{Digest, Sha256};
use tracing::debug;

use strongroom_core::config::BackendKind;
use strongroom_core::error::VaultResult;

/// Size and modification time of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Backend-agnostic key/value object store for vault blobs.
#[derive(Debug, Clone)]
pub struct BlobStore {
    op: Operator,
    backend: BackendKind,
}

impl BlobStore {
    pub fn new(op: Operator, backend: BackendKind) -> Self {
        Self { op, backend }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Store a blob under `key`, overwriting any previous object.
    ///
    /// On the S3 backend a SHA-256 content hash rides along as user
    /// metadata so operators can audit object integrity out-of-band,
    /// without fetching blob bodies. This sits under the wrapper's own
    /// integrity digest, it does not replace it.
    pub async fn put(&self, key: &str, bytes: Vec<u8>) -> VaultResult<()> {
        debug!(key, size = bytes.len(), "put blob");
        if self.backend == BackendKind::S3 {
            let content_sha256 = hex::encode(Sha256::digest(&bytes));
            self.op
                .write_with(key, bytes)
                .user_metadata([("content-sha256".to_string(), content_sha256)])
                .await?;
        } else {
            self.op.write(key, bytes).await?;
        }
        Ok(())
    }

    /// Fetch a blob's bytes. `NotFound` when the key doesn't exist.
    pub async fn get(&self, key: &str) -> VaultResult<Vec<u8>> {
        let buf = self.op.read(key).await?;
        Ok(buf.to_vec())
    }

    /// Remove a blob. Idempotent: deleting a missing key succeeds.
    pub async fn delete(&self, key: &str) -> VaultResult<()> {
        debug!(key, "delete blob");
        self.op.delete(key).await?;
        Ok(())
    }

    /// All object keys under `prefix`, sorted. Directory placeholders are
    /// skipped (the fs backend lists them, object stores don't).
    pub async fn list(&self, prefix: &str) -> VaultResult<Vec<String>> {
        let entries = self.op.list(prefix).await?;
        let mut keys: Vec<String> = entries
            .into_iter()
            .map(|entry| entry.path().to_string())
            .filter(|path| !path.ends_with('/'))
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Size and last-modified time for a blob. `NotFound` when absent.
    /// Backends that don't track modification times report `None`.
    pub async fn info(&self, key: &str) -> VaultResult<BlobInfo> {
        let meta = self.op.stat(key).await?;
        Ok(BlobInfo {
            size: meta.content_length(),
            last_modified: meta
                .last_modified()
                .map(|ts| DateTime::<Utc>::from(SystemTime::from(ts))),
        })
    }

    /// Round-trip health check against a throwaway probe key.
    pub async fn health_check(&self) -> bool {
        crate::health::is_healthy(&self.op).await
    }
}
