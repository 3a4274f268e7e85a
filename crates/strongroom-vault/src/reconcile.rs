//! Reconciliation sweep: converge the two blob namespaces
//!
//! Ciphertext and metadata blobs are written as a non-atomic pair, so a
//! crash between the writes leaves a genuine orphan. The sweep
//! cross-references the `encrypted/` and `metadata/` listings (it never
//! reads blob contents) and removes identifiers present on one side only.
//! A minimum-age grace window keeps it safe to run concurrently with
//! uploads: a record mid-creation looks exactly like an orphan, and only
//! age tells them apart.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use strongroom_core::error::{VaultError, VaultResult};
use strongroom_core::record::{self, CIPHERTEXT_PREFIX, METADATA_PREFIX};
use strongroom_storage::BlobStore;

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SweepReport {
    /// Ids with a ciphertext blob but no metadata blob.
    pub orphaned_ciphertext: BTreeSet<String>,
    /// Ids with a metadata blob but no ciphertext blob.
    pub orphaned_metadata: BTreeSet<String>,
    /// Ids whose orphaned blob was removed (or had already vanished) this
    /// sweep.
    pub removed: BTreeSet<String>,
    /// Orphans left alone because they are younger than the grace window,
    /// possibly uploads still in flight. The next sweep reconsiders them.
    pub deferred: BTreeSet<String>,
    /// Keys whose stat or delete failed; the sweep continued past them.
    pub failures: Vec<String>,
}

enum OrphanOutcome {
    Removed,
    Deferred,
}

/// Cross-references the two blob namespaces and deletes aged orphans.
#[derive(Clone)]
pub struct Reconciler {
    store: BlobStore,
    grace: Duration,
}

impl Reconciler {
    pub fn new(store: BlobStore, grace_secs: u64) -> Self {
        Self {
            store,
            grace: Duration::seconds(grace_secs as i64),
        }
    }

    /// One full sweep. A listing failure on either namespace aborts;
    /// per-orphan failures are collected and the sweep continues.
    pub async fn sweep(&self) -> VaultResult<SweepReport> {
        let ciphertext_ids = self
            .ids_under(CIPHERTEXT_PREFIX, record::id_from_ciphertext_key)
            .await?;
        let metadata_ids = self
            .ids_under(METADATA_PREFIX, record::id_from_metadata_key)
            .await?;

        let mut report = SweepReport {
            orphaned_ciphertext: ciphertext_ids.difference(&metadata_ids).cloned().collect(),
            orphaned_metadata: metadata_ids.difference(&ciphertext_ids).cloned().collect(),
            ..Default::default()
        };

        let candidates: Vec<(String, String)> = report
            .orphaned_ciphertext
            .iter()
            .map(|id| (id.clone(), record::ciphertext_key(id)))
            .chain(
                report
                    .orphaned_metadata
                    .iter()
                    .map(|id| (id.clone(), record::metadata_key(id))),
            )
            .collect();

        let now = Utc::now();
        for (id, key) in candidates {
            match self.remove_orphan(&key, now).await {
                Ok(OrphanOutcome::Removed) => {
                    report.removed.insert(id);
                }
                Ok(OrphanOutcome::Deferred) => {
                    report.deferred.insert(id);
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "orphan removal failed, continuing sweep");
                    report.failures.push(key);
                }
            }
        }

        info!(
            orphaned_ciphertext = report.orphaned_ciphertext.len(),
            orphaned_metadata = report.orphaned_metadata.len(),
            removed = report.removed.len(),
            deferred = report.deferred.len(),
            failures = report.failures.len(),
            "sweep complete"
        );
        Ok(report)
    }

    async fn ids_under(
        &self,
        prefix: &str,
        extract: fn(&str) -> Option<&str>,
    ) -> VaultResult<BTreeSet<String>> {
        let keys = self
            .store
            .list(prefix)
            .await
            .map_err(|e| VaultError::Reconciliation(format!("listing {prefix}: {e}")))?;
        Ok(keys
            .iter()
            .filter_map(|key| extract(key))
            .map(String::from)
            .collect())
    }

    /// Delete one orphaned blob, unless it is too young to judge. A key
    /// that vanished between listing and now counts as removed: someone
    /// else finished the job.
    async fn remove_orphan(&self, key: &str, now: DateTime<Utc>) -> VaultResult<OrphanOutcome> {
        match self.store.info(key).await {
            Ok(info) => {
                if let Some(modified) = info.last_modified {
                    if now.signed_duration_since(modified) < self.grace {
                        debug!(key, "orphan younger than grace window, deferring");
                        return Ok(OrphanOutcome::Deferred);
                    }
                }
                // No modification time from this backend: nothing proves
                // the orphan is fresh, treat it as eligible.
            }
            Err(VaultError::NotFound(_)) => return Ok(OrphanOutcome::Removed),
            Err(e) => return Err(e),
        }

        self.store.delete(key).await?;
        Ok(OrphanOutcome::Removed)
    }
}
