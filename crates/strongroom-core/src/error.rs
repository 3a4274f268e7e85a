use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

/// Whether a storage failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// Timeout, connectivity loss, throttling. Safe for the caller to retry.
    Transient,
    /// Permission denied, missing bucket, invalid config. Retrying won't help.
    Permanent,
}

#[derive(Debug, Error)]
pub enum VaultError {
    /// Malformed input, rejected before any crypto runs.
    #[error("invalid input: {0}")]
    Validation(String),

    /// No blob exists for the requested key.
    #[error("not found: {0}")]
    NotFound(String),

    /// Integrity digest mismatch. Logged distinctly for audit; untrusted
    /// callers see the same message as `Authentication`.
    #[error("integrity check failed")]
    Integrity,

    /// AEAD tag mismatch: wrong password or tamper, indistinguishable on
    /// purpose.
    #[error("decryption failed")]
    Authentication,

    /// Backend I/O failure.
    #[error("storage error ({kind:?}): {message}")]
    Storage {
        kind: StorageErrorKind,
        message: String,
    },

    /// Listing or delete failure during a reconciliation sweep.
    #[error("reconciliation error: {0}")]
    Reconciliation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VaultError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Storage {
            kind: StorageErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Storage {
            kind: StorageErrorKind::Permanent,
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage {
                kind: StorageErrorKind::Transient,
                ..
            }
        )
    }

    /// Message safe to hand to untrusted callers. Integrity and
    /// authentication failures collapse to one string so the response
    /// carries no decryption oracle; storage details stay server-side.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid request",
            Self::NotFound(_) => "not found",
            Self::Integrity | Self::Authentication => "decryption failed",
            Self::Storage { .. } | Self::Reconciliation(_) | Self::Io(_) | Self::Other(_) => {
                "internal storage error"
            }
        }
    }
}

impl From<opendal::Error> for VaultError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            opendal::ErrorKind::PermissionDenied
            | opendal::ErrorKind::ConfigInvalid
            | opendal::ErrorKind::Unsupported => Self::permanent(err.to_string()),
            opendal::ErrorKind::RateLimited => Self::transient(err.to_string()),
            _ if err.is_temporary() => Self::transient(err.to_string()),
            _ => Self::permanent(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_and_authentication_share_public_message() {
        assert_eq!(
            VaultError::Integrity.public_message(),
            VaultError::Authentication.public_message()
        );
    }

    #[test]
    fn test_internal_messages_stay_distinct() {
        assert_ne!(
            VaultError::Integrity.to_string(),
            VaultError::Authentication.to_string()
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(VaultError::transient("timeout").is_retryable());
        assert!(!VaultError::permanent("no such bucket").is_retryable());
        assert!(!VaultError::Authentication.is_retryable());
    }

    #[test]
    fn test_opendal_not_found_maps_to_not_found() {
        let err = opendal::Error::new(opendal::ErrorKind::NotFound, "no such key");
        assert!(matches!(VaultError::from(err), VaultError::NotFound(_)));
    }

    #[test]
    fn test_opendal_permission_denied_is_permanent() {
        let err = opendal::Error::new(opendal::ErrorKind::PermissionDenied, "denied");
        let mapped = VaultError::from(err);
        assert!(matches!(
            mapped,
            VaultError::Storage {
                kind: StorageErrorKind::Permanent,
                ..
            }
        ));
    }

    #[test]
    fn test_opendal_rate_limited_is_transient() {
        let err = opendal::Error::new(opendal::ErrorKind::RateLimited, "slow down");
        assert!(VaultError::from(err).is_retryable());
    }
}
