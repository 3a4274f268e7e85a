//! Storage health check: round-trip write/read/delete of a throwaway key

use anyhow::Result;
use opendal::Operator;

const PROBE_PREFIX: &str = "health/";
const PROBE_BODY: &[u8] = b"strongroom-health-probe";

/// Verify the backend can actually store data: write a probe blob under a
/// throwaway key, read it back, compare, delete it. A listing-only check
/// would miss write-permission and quota failures.
pub async fn check_health(op: &Operator) -> Result<()> {
    let key = format!("{PROBE_PREFIX}probe-{}", uuid::Uuid::new_v4().simple());

    op.write(&key, PROBE_BODY.to_vec())
        .await
        .map_err(|e| anyhow::anyhow!("health probe write failed: {e}"))?;

    let read_back = op
        .read(&key)
        .await
        .map_err(|e| anyhow::anyhow!("health probe read failed: {e}"))?;
    if read_back.to_vec() != PROBE_BODY {
        // Clean up best-effort before reporting.
        let _ = op.delete(&key).await;
        anyhow::bail!("health probe read back different bytes");
    }

    op.delete(&key)
        .await
        .map_err(|e| anyhow::anyhow!("health probe delete failed: {e}"))?;
    Ok(())
}

/// Returns true if storage passes the round trip, false otherwise
/// (non-panicking).
pub async fn is_healthy(op: &Operator) -> bool {
    match check_health(op).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("storage health check failed: {e}");
            false
        }
    }
}
