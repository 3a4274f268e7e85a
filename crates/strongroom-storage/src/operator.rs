//! OpenDAL Operator factory for the vault storage backends

use std::time::Duration;

use anyhow::{Context, Result};
use opendal::Operator;

use strongroom_core::config::{BackendKind, S3Credentials, StorageConfig};

/// Build an OpenDAL Operator for the configured backend.
///
/// S3 uses path-style addressing (default in opendal 0.55), which is what
/// MinIO/SeaweedFS-style endpoints require, and asks the backend for SSE-S3
/// encryption at rest: defense-in-depth under the vault's own cipher, not
/// a replacement for it.
///
/// If `enforce_tls` is set and the endpoint uses HTTP, this returns an
/// error; otherwise a warning is logged for non-HTTPS endpoints.
pub fn build_operator(cfg: &StorageConfig, creds: Option<&S3Credentials>) -> Result<Operator> {
    let op = match cfg.backend {
        BackendKind::Local => {
            let root = cfg.local_root.to_string_lossy();
            let builder = opendal::services::Fs::default().root(&root);
            Operator::new(builder)
                .context("creating OpenDAL fs operator")?
                .finish()
        }
        BackendKind::S3 => {
            if cfg.endpoint.starts_with("http://") {
                if cfg.enforce_tls {
                    anyhow::bail!(
                        "S3 endpoint uses plaintext HTTP ({}), but enforce_tls is enabled. \
                         Use an HTTPS endpoint or set storage.enforce_tls = false for local development.",
                        cfg.endpoint
                    );
                }
                tracing::warn!(
                    endpoint = %cfg.endpoint,
                    "S3 endpoint uses plaintext HTTP — credentials are transmitted unencrypted. \
                     Set storage.enforce_tls = true and use HTTPS in production."
                );
            }
            let creds = creds.context("S3 backend selected but no credentials provided")?;
            let builder = opendal::services::S3::default()
                .endpoint(&cfg.endpoint)
                .region(&cfg.region)
                .bucket(&cfg.bucket)
                .access_key_id(&creds.access_key_id)
                .secret_access_key(&creds.secret_access_key)
                .server_side_encryption_with_s3_key();
            Operator::new(builder)
                .context("creating OpenDAL S3 operator")?
                .finish()
        }
        BackendKind::Memory => Operator::new(opendal::services::Memory::default())
            .context("creating OpenDAL memory operator")?
            .finish(),
    };

    Ok(apply_layers(op, cfg.timeout_secs))
}

/// Logging, bounded timeouts, and retries, in that order. Retrying writes
/// is safe here: every vault put targets a globally unique key with
/// full-object semantics, so a replay cannot create a divergent duplicate.
fn apply_layers(op: Operator, timeout_secs: u64) -> Operator {
    op.layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::TimeoutLayer::new()
                .with_timeout(Duration::from_secs(timeout_secs)),
        )
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(5)
                .with_jitter(),
        )
}
