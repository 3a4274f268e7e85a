//! The wrapper record: wire format, blob key layout, identifiers
//!
//! A wrapper is the logical vault record describing one encrypted object.
//! It is serialized as JSON into the metadata blob (`metadata/<id>.json`);
//! the raw ciphertext lives separately at `encrypted/<id>`. Byte fields are
//! lowercase hex on the wire.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{VaultError, VaultResult};

/// Wrapper format version written into every record.
pub const FORMAT_VERSION: &str = "1.0.0";

/// Cipher algorithm name recorded in wrapper metadata.
pub const ALGORITHM: &str = "aes-256-gcm";

/// Default PBKDF2 iteration count for new records.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Blob namespace for raw ciphertext objects.
pub const CIPHERTEXT_PREFIX: &str = "encrypted/";

/// Blob namespace for wrapper metadata objects.
pub const METADATA_PREFIX: &str = "metadata/";

const METADATA_SUFFIX: &str = ".json";

/// KDF salt length in bytes.
pub const SALT_SIZE: usize = 32;

/// AES-GCM nonce length in bytes (128-bit, explicit per record).
pub const NONCE_SIZE: usize = 16;

/// AES-GCM authentication tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// Integrity digest length in bytes (SHA-512).
pub const DIGEST_SIZE: usize = 64;

/// Cipher parameters recorded alongside the ciphertext. None of these are
/// secret; all are required to decrypt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherMetadata {
    #[serde(with = "hex::serde")]
    pub salt: [u8; SALT_SIZE],
    #[serde(with = "hex::serde")]
    pub iv: [u8; NONCE_SIZE],
    #[serde(with = "hex::serde")]
    pub tag: [u8; TAG_SIZE],
    pub algorithm: String,
    pub iterations: u32,
}

/// The vault record for one encrypted object. Immutable once assembled:
/// a changed file is a new wrapper with a new identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wrapper {
    pub id: String,
    /// Original filename, opaque to the vault.
    pub filename: String,
    /// Plaintext length in bytes.
    pub original_size: u64,
    /// Ciphertext length in bytes.
    pub encrypted_size: u64,
    /// Creation time, epoch milliseconds.
    pub timestamp: u64,
    pub version: String,
    pub metadata: CipherMetadata,
    /// SHA-512 over the ciphertext bytes and the canonical serialization of
    /// every other wrapper field.
    #[serde(with = "hex::serde")]
    pub integrity: [u8; DIGEST_SIZE],
}

/// The wrapper fields covered by the integrity digest: everything except
/// the digest itself, in declaration order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IntegrityPayload<'a> {
    id: &'a str,
    filename: &'a str,
    original_size: u64,
    encrypted_size: u64,
    timestamp: u64,
    version: &'a str,
    metadata: &'a CipherMetadata,
}

impl Wrapper {
    /// Canonical bytes the integrity digest covers alongside the
    /// ciphertext. Recomputed from parsed fields, so formatting of the
    /// stored JSON doesn't matter; field values do.
    pub fn integrity_payload(&self) -> VaultResult<Vec<u8>> {
        serde_json::to_vec(&IntegrityPayload {
            id: &self.id,
            filename: &self.filename,
            original_size: self.original_size,
            encrypted_size: self.encrypted_size,
            timestamp: self.timestamp,
            version: &self.version,
            metadata: &self.metadata,
        })
        .map_err(|e| VaultError::Validation(format!("wrapper encode: {e}")))
    }

    /// Serialize to the metadata blob's JSON bytes.
    pub fn to_bytes(&self) -> VaultResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| VaultError::Validation(format!("wrapper encode: {e}")))
    }

    /// Deserialize from metadata blob bytes.
    pub fn from_bytes(data: &[u8]) -> VaultResult<Self> {
        serde_json::from_slice(data)
            .map_err(|e| VaultError::Validation(format!("wrapper decode: {e}")))
    }
}

/// Generate a fresh record identifier: 128 random bits, rendered as 32 hex
/// characters. Assigned once at creation, never reused.
pub fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Identifiers are hex/hyphen strings; anything else (path separators in
/// particular) is rejected before it can reach a storage key.
pub fn validate_id(id: &str) -> VaultResult<()> {
    if id.is_empty() {
        return Err(VaultError::Validation("empty identifier".into()));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(VaultError::Validation(format!(
            "identifier contains invalid characters: {id:?}"
        )));
    }
    Ok(())
}

/// Storage key of the ciphertext blob for `id`.
pub fn ciphertext_key(id: &str) -> String {
    format!("{CIPHERTEXT_PREFIX}{id}")
}

/// Storage key of the metadata blob for `id`.
pub fn metadata_key(id: &str) -> String {
    format!("{METADATA_PREFIX}{id}{METADATA_SUFFIX}")
}

/// Extract the record id from a ciphertext blob key, if it is one.
pub fn id_from_ciphertext_key(key: &str) -> Option<&str> {
    let id = key.strip_prefix(CIPHERTEXT_PREFIX)?;
    (!id.is_empty() && !id.contains('/')).then_some(id)
}

/// Extract the record id from a metadata blob key, if it is one.
pub fn id_from_metadata_key(key: &str) -> Option<&str> {
    let id = key
        .strip_prefix(METADATA_PREFIX)?
        .strip_suffix(METADATA_SUFFIX)?;
    (!id.is_empty() && !id.contains('/')).then_some(id)
}

/// Current time as epoch milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
