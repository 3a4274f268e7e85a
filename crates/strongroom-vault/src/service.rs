//! Vault service: async orchestration of crypto core + blob store
//!
//! Every operation is stateless and independent per invocation; the only
//! shared resource is the store handle. Key derivation is CPU-bound by
//! design; it runs on the blocking pool behind a semaphore so that one
//! expensive derivation cannot stall unrelated opens and creates.

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use strongroom_core::config::CryptoConfig;
use strongroom_core::error::{VaultError, VaultResult};
use strongroom_core::record::{self, Wrapper, METADATA_PREFIX};
use strongroom_storage::BlobStore;

use crate::wrapper::{create_wrapper, open_wrapper, SealedObject};

/// A decrypted record: the wrapper and the recovered plaintext.
pub struct Unsealed {
    pub wrapper: Wrapper,
    pub plaintext: Vec<u8>,
}

/// The vault engine. Cheap to clone; clones share the store handle and the
/// KDF concurrency bound.
#[derive(Clone)]
pub struct Vault {
    store: BlobStore,
    iterations: u32,
    kdf_permits: Arc<Semaphore>,
}

impl Vault {
    pub fn new(store: BlobStore, crypto: &CryptoConfig) -> Self {
        Self {
            store,
            iterations: crypto.iterations,
            kdf_permits: Arc::new(Semaphore::new(crypto.effective_kdf_concurrency())),
        }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Encrypt and persist a new record.
    ///
    /// The two writes are not atomic as a pair. Ciphertext goes first and
    /// metadata last, so a metadata blob's presence implies a complete
    /// record; a crash between the writes leaves an orphaned ciphertext
    /// that the reconciliation sweep collects once it ages past the grace
    /// window.
    pub async fn upload(
        &self,
        plaintext: Vec<u8>,
        password: SecretString,
        filename: String,
    ) -> VaultResult<Wrapper> {
        let iterations = self.iterations;
        let SealedObject { wrapper, ciphertext } = self
            .run_crypto(move || create_wrapper(&plaintext, &password, &filename, iterations))
            .await?;

        self.store
            .put(&record::ciphertext_key(&wrapper.id), ciphertext)
            .await?;
        self.store
            .put(&record::metadata_key(&wrapper.id), wrapper.to_bytes()?)
            .await?;

        info!(id = %wrapper.id, size = wrapper.original_size, "record sealed");
        Ok(wrapper)
    }

    /// Fetch and decrypt a record.
    pub async fn download(&self, id: &str, password: SecretString) -> VaultResult<Unsealed> {
        let wrapper = self.read_wrapper(id).await?;
        let ciphertext = self.store.get(&record::ciphertext_key(id)).await?;

        let opened = wrapper.clone();
        let plaintext = self
            .run_crypto(move || open_wrapper(&opened, &ciphertext, &password))
            .await?;

        Ok(Unsealed { wrapper, plaintext })
    }

    /// Metadata-only fetch, the cheap audit path; bulk ciphertext is never
    /// touched. A metadata blob that no longer parses, or that holds a
    /// record for some other id, is a corrupted record and surfaces as an
    /// integrity failure, not a validation error.
    pub async fn read_wrapper(&self, id: &str) -> VaultResult<Wrapper> {
        record::validate_id(id)?;
        let bytes = self.store.get(&record::metadata_key(id)).await?;
        let wrapper = Wrapper::from_bytes(&bytes).map_err(|_| {
            warn!(id, "metadata blob failed to parse, treating as corrupted");
            VaultError::Integrity
        })?;
        if wrapper.id != id {
            warn!(id, recorded = %wrapper.id, "metadata blob holds a foreign record");
            return Err(VaultError::Integrity);
        }
        Ok(wrapper)
    }

    /// Remove a record. Metadata goes first: once it is gone the record no
    /// longer exists to readers, and a crash mid-way leaves only an
    /// orphaned ciphertext for the sweep. Idempotent.
    pub async fn delete(&self, id: &str) -> VaultResult<()> {
        record::validate_id(id)?;
        self.store.delete(&record::metadata_key(id)).await?;
        self.store.delete(&record::ciphertext_key(id)).await?;
        info!(id, "record deleted");
        Ok(())
    }

    /// Ids of complete records: everything in the metadata namespace.
    pub async fn list(&self) -> VaultResult<Vec<String>> {
        let keys = self.store.list(METADATA_PREFIX).await?;
        Ok(keys
            .iter()
            .filter_map(|key| record::id_from_metadata_key(key))
            .map(String::from)
            .collect())
    }

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }

    /// Run an expensive crypto closure on the blocking pool. The semaphore
    /// bounds concurrent derivations; the permit is held until the blocking
    /// task finishes.
    async fn run_crypto<T, F>(&self, f: F) -> VaultResult<T>
    where
        T: Send + 'static,
        F: FnOnce() -> VaultResult<T> + Send + 'static,
    {
        let _permit = self
            .kdf_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| VaultError::Other(anyhow::anyhow!("KDF worker pool closed")))?;
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| VaultError::Other(anyhow::anyhow!("crypto task failed: {e}")))?
    }
}
