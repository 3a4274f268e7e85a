//! Secure password generation from a fixed alphanumeric+symbol charset

use rand::Rng;

use strongroom_core::error::{VaultError, VaultResult};

/// Character pool for generated passwords.
pub const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";

/// Generate a password of `length` characters drawn uniformly from
/// [`PASSWORD_CHARSET`] with a cryptographically secure RNG.
pub fn generate_password(length: usize) -> VaultResult<String> {
    if length == 0 {
        return Err(VaultError::Validation(
            "password length must be non-zero".into(),
        ));
    }

    let mut rng = rand::thread_rng();
    let password = (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..PASSWORD_CHARSET.len());
            PASSWORD_CHARSET[idx] as char
        })
        .collect();
    Ok(password)
}
