//! AES-256-GCM encryption/decryption with explicit 16-byte nonces
//!
//! The nonce is generated fresh per encryption call and passed explicitly
//! into both encrypt and decrypt; nothing is ever derived implicitly from
//! the password. Nonce reuse under one key breaks GCM entirely, so the
//! wrapper record carries the nonce and the builder never caches keys
//! across records.
//!
//! Wire shape: ciphertext, nonce, and tag travel as three separate wrapper
//! fields. The 16-byte GCM tag is split off the AEAD output on encrypt and
//! re-joined on decrypt. AAD is the fixed format constant [`crate::FORMAT_AAD`].

use aes_gcm::{
    aead::{generic_array::typenum::U16, Aead, KeyInit, Payload},
    aes::Aes256,
    AesGcm, Nonce,
};
use rand::RngCore;

use strongroom_core::error::{VaultError, VaultResult};

use crate::kdf::DerivedKey;
use crate::{FORMAT_AAD, NONCE_SIZE, TAG_SIZE};

/// AES-256-GCM parameterized with the wrapper format's 16-byte nonce.
type RecordCipher = AesGcm<Aes256, U16>;

/// Output of a single encryption call.
#[derive(Debug, Clone)]
pub struct EncryptedPayload {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
    pub tag: [u8; TAG_SIZE],
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey) -> VaultResult<EncryptedPayload> {
    let cipher = RecordCipher::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::<U16>::from_slice(&nonce_bytes);

    let mut sealed = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: FORMAT_AAD,
            },
        )
        .map_err(|_| VaultError::Other(anyhow::anyhow!("AEAD encryption failed")))?;

    // GCM appends the tag; the wrapper format carries it as its own field.
    let tag_vec = sealed.split_off(sealed.len() - TAG_SIZE);
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&tag_vec);

    Ok(EncryptedPayload {
        ciphertext: sealed,
        nonce: nonce_bytes,
        tag,
    })
}

/// Decrypt a record's ciphertext.
///
/// Every failure is the single opaque [`VaultError::Authentication`]:
/// wrong key, flipped ciphertext bit, and mismatched AAD are
/// indistinguishable to the caller, denying an attacker an oracle.
pub fn decrypt(
    ciphertext: &[u8],
    key: &DerivedKey,
    nonce: &[u8; NONCE_SIZE],
    tag: &[u8; TAG_SIZE],
) -> VaultResult<Vec<u8>> {
    let cipher = RecordCipher::new(key.as_bytes().into());
    let nonce = Nonce::<U16>::from_slice(nonce);

    let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_SIZE);
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: &sealed,
                aad: FORMAT_AAD,
            },
        )
        .map_err(|_| VaultError::Authentication)
}
