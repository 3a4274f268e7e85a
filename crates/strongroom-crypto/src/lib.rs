//! strongroom-crypto: the vault's cryptographic core
//!
//! Three independent layers, composed by the wrapper builder:
//! ```text
//! password + salt ── PBKDF2-HMAC-SHA512 (100k iterations) ──► 256-bit key
//! plaintext + key ── AES-256-GCM (explicit 16-byte nonce,
//!                     fixed format AAD) ──► ciphertext + tag
//! ciphertext + metadata ── SHA-512 ──► integrity digest
//! ```
//!
//! The integrity digest is deliberately independent of the GCM tag: it
//! covers the metadata envelope and lets the open path reject tampered
//! records before a key-derivation cycle is spent.

pub mod cipher;
pub mod integrity;
pub mod kdf;
pub mod password;

pub use cipher::{decrypt, encrypt, EncryptedPayload};
pub use integrity::{digest, verify};
pub use kdf::{derive_key, DerivedKey};
pub use password::{generate_password, PASSWORD_CHARSET};

pub use strongroom_core::record::{DIGEST_SIZE, NONCE_SIZE, SALT_SIZE, TAG_SIZE};

/// Size of a derived cipher key in bytes (256-bit)
pub const KEY_SIZE: usize = 32;

/// Associated data binding every ciphertext to this application and format
/// version; ciphertexts cannot be replayed into a different context.
pub const FORMAT_AAD: &[u8] = b"strongroom.vault.v1";
