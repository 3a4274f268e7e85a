//! Wrapper builder: assemble and open vault records
//!
//! `create_wrapper` is the only place identifiers, salts, and nonces are
//! born; all three are fresh per call, which is what makes concurrent
//! creates independent by construction. `open_wrapper` verifies the
//! integrity digest before deriving a key: a tampered record is rejected
//! without spending a PBKDF2 cycle, and envelope tampering is caught even
//! though the AEAD tag never covers the envelope.

use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use strongroom_core::error::{VaultError, VaultResult};
use strongroom_core::record::{
    self, CipherMetadata, Wrapper, ALGORITHM, DIGEST_SIZE, FORMAT_VERSION, SALT_SIZE,
};
use strongroom_crypto::{cipher, integrity, kdf};

/// Minimum accepted password length for new records.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A freshly built record: the wrapper plus the ciphertext bytes destined
/// for the `encrypted/` namespace.
#[derive(Debug, Clone)]
pub struct SealedObject {
    pub wrapper: Wrapper,
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` under `password` into an immutable wrapper record.
pub fn create_wrapper(
    plaintext: &[u8],
    password: &SecretString,
    filename: &str,
    iterations: u32,
) -> VaultResult<SealedObject> {
    if password.expose_secret().len() < MIN_PASSWORD_LEN {
        return Err(VaultError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let id = record::new_record_id();
    let mut salt = [0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);

    let key = kdf::derive_key(password, &salt, iterations)?;
    let payload = cipher::encrypt(plaintext, &key)?;

    let mut wrapper = Wrapper {
        id,
        filename: filename.to_string(),
        original_size: plaintext.len() as u64,
        encrypted_size: payload.ciphertext.len() as u64,
        timestamp: record::now_millis(),
        version: FORMAT_VERSION.to_string(),
        metadata: CipherMetadata {
            salt,
            iv: payload.nonce,
            tag: payload.tag,
            algorithm: ALGORITHM.to_string(),
            iterations,
        },
        integrity: [0u8; DIGEST_SIZE],
    };
    wrapper.integrity = integrity::digest(&payload.ciphertext, &wrapper.integrity_payload()?);

    Ok(SealedObject {
        wrapper,
        ciphertext: payload.ciphertext,
    })
}

/// Decrypt a record.
///
/// Order matters: the integrity digest is checked first (mismatch →
/// [`VaultError::Integrity`], no key derivation, no decrypt attempt), then
/// the key is derived with the wrapper's recorded salt and iteration count
/// and the AEAD opened (failure → [`VaultError::Authentication`], covering
/// wrong password and any tamper that also recomputed the digest).
pub fn open_wrapper(
    wrapper: &Wrapper,
    ciphertext: &[u8],
    password: &SecretString,
) -> VaultResult<Vec<u8>> {
    record::validate_id(&wrapper.id)?;

    let envelope = wrapper.integrity_payload()?;
    if !integrity::verify(ciphertext, &envelope, &wrapper.integrity) {
        warn!(id = %wrapper.id, "integrity digest mismatch, rejecting before decrypt");
        return Err(VaultError::Integrity);
    }

    // Post-integrity: a mismatch here is a format problem, not tampering.
    if wrapper.metadata.algorithm != ALGORITHM {
        return Err(VaultError::Validation(format!(
            "unsupported cipher algorithm: {:?}",
            wrapper.metadata.algorithm
        )));
    }

    let key = kdf::derive_key(password, &wrapper.metadata.salt, wrapper.metadata.iterations)?;
    cipher::decrypt(ciphertext, &key, &wrapper.metadata.iv, &wrapper.metadata.tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Production default is 100k; tests trade iterations for speed.
    const TEST_ITERATIONS: u32 = 1_000;

    fn password() -> SecretString {
        SecretString::from("CorrectHorseBattery1")
    }

    fn seal(plaintext: &[u8]) -> SealedObject {
        create_wrapper(plaintext, &password(), "report.pdf", TEST_ITERATIONS).unwrap()
    }

    #[test]
    fn test_create_open_roundtrip() {
        let sealed = seal(b"the vault holds this");
        let plaintext = open_wrapper(&sealed.wrapper, &sealed.ciphertext, &password()).unwrap();
        assert_eq!(plaintext, b"the vault holds this");
    }

    #[test]
    fn test_roundtrip_empty_plaintext() {
        let sealed = seal(b"");
        assert_eq!(sealed.wrapper.original_size, 0);
        let plaintext = open_wrapper(&sealed.wrapper, &sealed.ciphertext, &password()).unwrap();
        assert!(plaintext.is_empty());
    }

    #[test]
    fn test_wrapper_fields() {
        let sealed = seal(b"0123456789");
        let w = &sealed.wrapper;
        assert_eq!(w.original_size, 10);
        assert_eq!(w.encrypted_size, sealed.ciphertext.len() as u64);
        assert_eq!(w.version, FORMAT_VERSION);
        assert_eq!(w.filename, "report.pdf");
        assert_eq!(w.metadata.algorithm, ALGORITHM);
        assert_eq!(w.metadata.iterations, TEST_ITERATIONS);
        assert!(w.timestamp > 0);
    }

    #[test]
    fn test_wrong_password_is_authentication_error() {
        let sealed = seal(b"secret");
        let result = open_wrapper(
            &sealed.wrapper,
            &sealed.ciphertext,
            &SecretString::from("wrong-password"),
        );
        assert!(matches!(result, Err(VaultError::Authentication)));
    }

    #[test]
    fn test_short_password_rejected_on_create() {
        let result = create_wrapper(b"data", &SecretString::from("short"), "f", TEST_ITERATIONS);
        assert!(matches!(result, Err(VaultError::Validation(_))));
    }

    #[test]
    fn test_short_wrong_password_on_open_is_still_authentication() {
        // Open imposes no length policy; any wrong password must look the
        // same from the outside.
        let sealed = seal(b"secret");
        let result = open_wrapper(&sealed.wrapper, &sealed.ciphertext, &SecretString::from("x"));
        assert!(matches!(result, Err(VaultError::Authentication)));
    }

    #[test]
    fn test_ciphertext_bit_flip_is_integrity_error() {
        let sealed = seal(b"tamper with me");
        let mut ciphertext = sealed.ciphertext.clone();
        ciphertext[0] ^= 0x01;

        let result = open_wrapper(&sealed.wrapper, &ciphertext, &password());
        assert!(matches!(result, Err(VaultError::Integrity)));
    }

    #[test]
    fn test_metadata_field_flips_are_integrity_errors() {
        let sealed = seal(b"tamper with me");

        let mut w = sealed.wrapper.clone();
        w.metadata.salt[0] ^= 0x01;
        assert!(matches!(
            open_wrapper(&w, &sealed.ciphertext, &password()),
            Err(VaultError::Integrity)
        ));

        let mut w = sealed.wrapper.clone();
        w.metadata.iv[15] ^= 0x80;
        assert!(matches!(
            open_wrapper(&w, &sealed.ciphertext, &password()),
            Err(VaultError::Integrity)
        ));

        let mut w = sealed.wrapper.clone();
        w.metadata.tag[7] ^= 0x10;
        assert!(matches!(
            open_wrapper(&w, &sealed.ciphertext, &password()),
            Err(VaultError::Integrity)
        ));

        let mut w = sealed.wrapper.clone();
        w.filename = "renamed.pdf".into();
        assert!(matches!(
            open_wrapper(&w, &sealed.ciphertext, &password()),
            Err(VaultError::Integrity)
        ));

        let mut w = sealed.wrapper.clone();
        w.timestamp ^= 1;
        assert!(matches!(
            open_wrapper(&w, &sealed.ciphertext, &password()),
            Err(VaultError::Integrity)
        ));

        let mut w = sealed.wrapper;
        w.metadata.iterations -= 1;
        assert!(matches!(
            open_wrapper(&w, &sealed.ciphertext, &password()),
            Err(VaultError::Integrity)
        ));
    }

    #[test]
    fn test_recomputed_digest_after_tamper_fails_authentication() {
        // An attacker who flips ciphertext AND recomputes the digest gets
        // past the integrity layer but not the AEAD tag.
        let sealed = seal(b"belt and braces");
        let mut ciphertext = sealed.ciphertext.clone();
        ciphertext[0] ^= 0x01;

        let mut w = sealed.wrapper;
        w.integrity =
            strongroom_crypto::integrity::digest(&ciphertext, &w.integrity_payload().unwrap());

        let result = open_wrapper(&w, &ciphertext, &password());
        assert!(matches!(result, Err(VaultError::Authentication)));
    }

    #[test]
    fn test_freshness_identical_inputs_diverge() {
        let s1 = seal(b"identical plaintext");
        let s2 = seal(b"identical plaintext");

        assert_ne!(s1.wrapper.id, s2.wrapper.id);
        assert_ne!(s1.wrapper.metadata.salt, s2.wrapper.metadata.salt);
        assert_ne!(s1.wrapper.metadata.iv, s2.wrapper.metadata.iv);
        assert_ne!(s1.ciphertext, s2.ciphertext);
    }

    #[test]
    fn test_open_survives_wrapper_serde_roundtrip() {
        // What the service actually does: wrapper travels through JSON.
        let sealed = seal(b"via the wire");
        let restored = Wrapper::from_bytes(&sealed.wrapper.to_bytes().unwrap()).unwrap();
        let plaintext = open_wrapper(&restored, &sealed.ciphertext, &password()).unwrap();
        assert_eq!(plaintext, b"via the wire");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(16))]

            #[test]
            fn prop_roundtrip(plaintext in proptest::collection::vec(any::<u8>(), 0..2048),
                              password in "[a-zA-Z0-9]{8,24}") {
                let password = SecretString::from(password);
                let sealed =
                    create_wrapper(&plaintext, &password, "prop.bin", TEST_ITERATIONS).unwrap();
                let opened = open_wrapper(&sealed.wrapper, &sealed.ciphertext, &password).unwrap();
                prop_assert_eq!(opened, plaintext);
            }

            #[test]
            fn prop_wrong_password_fails(plaintext in proptest::collection::vec(any::<u8>(), 0..256),
                                         password in "[a-z]{8,16}",
                                         wrong in "[A-Z]{8,16}") {
                let sealed = create_wrapper(
                    &plaintext,
                    &SecretString::from(password),
                    "prop.bin",
                    TEST_ITERATIONS,
                )
                .unwrap();
                let result =
                    open_wrapper(&sealed.wrapper, &sealed.ciphertext, &SecretString::from(wrong));
                prop_assert!(matches!(result, Err(VaultError::Authentication)));
            }
        }
    }
}
