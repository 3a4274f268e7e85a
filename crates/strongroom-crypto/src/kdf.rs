//! Key derivation: PBKDF2-HMAC-SHA512 password → record key

use pbkdf2::pbkdf2_hmac;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha512;
use zeroize::Zeroize;

use strongroom_core::error::{VaultError, VaultResult};

use crate::{KEY_SIZE, SALT_SIZE};

/// A 256-bit record key derived from a password via PBKDF2-HMAC-SHA512.
///
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 256-bit key from a password and a per-record salt.
///
/// Deterministic: the same password and salt always yield the same key.
/// The iteration count is the brute-force deterrent; callers pass the
/// configured count verbatim and a zero count is rejected outright rather
/// than silently weakened. Password content never causes failure.
pub fn derive_key(
    password: &SecretString,
    salt: &[u8; SALT_SIZE],
    iterations: u32,
) -> VaultResult<DerivedKey> {
    if iterations == 0 {
        return Err(VaultError::Validation(
            "PBKDF2 iteration count must be non-zero".into(),
        ));
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha512>(
        password.expose_secret().as_bytes(),
        salt,
        iterations,
        &mut key,
    );
    Ok(DerivedKey::from_bytes(key))
}
