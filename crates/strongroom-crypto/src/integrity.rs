//! Independent integrity layer: SHA-512 over (ciphertext, metadata)
//!
//! This runs before any decryption attempt. The AEAD tag only covers the
//! ciphertext; this digest also covers the metadata envelope (salt, nonce,
//! tag, version fields), so envelope tampering is caught without spending a
//! key-derivation cycle.

use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use crate::DIGEST_SIZE;

/// Compute the integrity digest over the exact ciphertext bytes followed by
/// the exact serialized metadata bytes.
pub fn digest(ciphertext: &[u8], metadata: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut hasher = Sha512::new();
    hasher.update(ciphertext);
    hasher.update(metadata);

    let mut out = [0u8; DIGEST_SIZE];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Constant-time digest check; does not short-circuit on the first
/// mismatching byte.
pub fn verify(ciphertext: &[u8], metadata: &[u8], expected: &[u8; DIGEST_SIZE]) -> bool {
    let actual = digest(ciphertext, metadata);
    actual.as_slice().ct_eq(expected.as_slice()).into()
}
