use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{VaultError, VaultResult};
use crate::record::DEFAULT_ITERATIONS;

/// Top-level vault configuration (loaded from strongroom.toml, overridden
/// by the environment via [`VaultConfig::from_env`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub storage: StorageConfig,
    pub crypto: CryptoConfig,
    pub reconcile: ReconcileConfig,
}

/// Storage backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local filesystem under `local_root`.
    #[default]
    Local,
    /// S3-compatible object storage.
    S3,
    /// In-memory store, for tests.
    Memory,
}

impl FromStr for BackendKind {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" | "fs" => Ok(Self::Local),
            "s3" | "remote" => Ok(Self::S3),
            "memory" => Ok(Self::Memory),
            other => Err(VaultError::Validation(format!(
                "unknown storage backend: {other:?} (expected local, s3, or memory)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// Root directory for the local backend
    pub local_root: PathBuf,
    /// S3-compatible endpoint
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// Bucket name
    pub bucket: String,
    /// Enforce HTTPS for S3 connections (warn/error on HTTP endpoints)
    pub enforce_tls: bool,
    /// Per-operation timeout in seconds
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            local_root: PathBuf::from("~/.local/share/strongroom"),
            endpoint: "http://localhost:9000".into(),
            region: "us-east-1".into(),
            bucket: "strongroom".into(),
            enforce_tls: false,
            timeout_secs: 30,
        }
    }
}

/// Key-derivation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2 iteration count for new records (default: 100000)
    pub iterations: u32,
    /// Concurrent key derivations allowed on the blocking pool
    /// (0 = available parallelism)
    pub kdf_concurrency: usize,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            kdf_concurrency: 0,
        }
    }
}

impl CryptoConfig {
    /// Effective KDF concurrency bound.
    pub fn effective_kdf_concurrency(&self) -> usize {
        if self.kdf_concurrency > 0 {
            return self.kdf_concurrency;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    }
}

/// Reconciliation sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Minimum age in seconds before a listed orphan is eligible for
    /// deletion; younger orphans may be uploads still in flight.
    pub grace_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self { grace_secs: 300 }
    }
}

/// S3 credentials, read from the environment only and never serialized
/// into config files.
#[derive(Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

impl S3Credentials {
    pub fn from_env() -> VaultResult<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> VaultResult<Self> {
        let access_key_id = get("VAULT_S3_ACCESS_KEY_ID")
            .or_else(|| get("AWS_ACCESS_KEY_ID"))
            .ok_or_else(|| {
                VaultError::Validation(
                    "S3 credentials not set: export VAULT_S3_ACCESS_KEY_ID or AWS_ACCESS_KEY_ID"
                        .into(),
                )
            })?;
        let secret_access_key = get("VAULT_S3_SECRET_ACCESS_KEY")
            .or_else(|| get("AWS_SECRET_ACCESS_KEY"))
            .ok_or_else(|| {
                VaultError::Validation(
                    "VAULT_S3_SECRET_ACCESS_KEY or AWS_SECRET_ACCESS_KEY not set".into(),
                )
            })?;
        Ok(Self {
            access_key_id,
            secret_access_key,
        })
    }
}

impl VaultConfig {
    /// Parse a TOML config document.
    pub fn from_toml(s: &str) -> VaultResult<Self> {
        let cfg: Self =
            toml::from_str(s).map_err(|e| VaultError::Validation(format!("config parse: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build a config from environment variables over defaults.
    pub fn from_env() -> VaultResult<Self> {
        Self::default().overridden_from_lookup(|k| std::env::var(k).ok())
    }

    /// Apply environment overrides to `self`. The lookup indirection keeps
    /// this testable without mutating process-wide state.
    pub fn overridden_from_lookup(
        mut self,
        get: impl Fn(&str) -> Option<String>,
    ) -> VaultResult<Self> {
        if let Some(v) = get("VAULT_STORAGE_BACKEND") {
            self.storage.backend = v.parse()?;
        }
        if let Some(v) = get("VAULT_LOCAL_ROOT") {
            self.storage.local_root = PathBuf::from(v);
        }
        if let Some(v) = get("VAULT_S3_ENDPOINT") {
            self.storage.endpoint = v;
        }
        if let Some(v) = get("VAULT_S3_REGION") {
            self.storage.region = v;
        }
        if let Some(v) = get("VAULT_S3_BUCKET") {
            self.storage.bucket = v;
        }
        if let Some(v) = get("VAULT_ENFORCE_TLS") {
            self.storage.enforce_tls = parse_var("VAULT_ENFORCE_TLS", &v)?;
        }
        if let Some(v) = get("VAULT_STORAGE_TIMEOUT_SECS") {
            self.storage.timeout_secs = parse_var("VAULT_STORAGE_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("VAULT_PBKDF2_ITERATIONS") {
            self.crypto.iterations = parse_var("VAULT_PBKDF2_ITERATIONS", &v)?;
        }
        if let Some(v) = get("VAULT_KDF_CONCURRENCY") {
            self.crypto.kdf_concurrency = parse_var("VAULT_KDF_CONCURRENCY", &v)?;
        }
        if let Some(v) = get("VAULT_SWEEP_GRACE_SECS") {
            self.reconcile.grace_secs = parse_var("VAULT_SWEEP_GRACE_SECS", &v)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject configs that would weaken the vault. A zero iteration count
    /// is an error; a lowered one is allowed but logged loudly.
    pub fn validate(&self) -> VaultResult<()> {
        if self.crypto.iterations == 0 {
            return Err(VaultError::Validation(
                "PBKDF2 iteration count must be non-zero".into(),
            ));
        }
        if self.crypto.iterations < DEFAULT_ITERATIONS {
            tracing::warn!(
                iterations = self.crypto.iterations,
                default = DEFAULT_ITERATIONS,
                "PBKDF2 iteration count below default; new records will be weaker"
            );
        }
        if self.storage.timeout_secs == 0 {
            return Err(VaultError::Validation(
                "storage timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> VaultResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| VaultError::Validation(format!("{name}: {e}")))
}
