//! Password hashing.
//!
//! Argon2id with a per-password random salt, stored as a PHC string. The
//! cleartext password exists only transiently in request handling; nothing
//! below this module ever sees it.

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

use crate::error::AuthError;

/// Hashes a password into a PHC string.
///
/// # Errors
///
/// Returns [`AuthError::Internal`] when salt generation or hashing fails;
/// both indicate a broken environment rather than bad input.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| AuthError::internal(format!("salt generation failed: {e}")))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AuthError::internal(format!("salt encoding failed: {e}")))?;

    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::internal(format!("password hashing failed: {e}")))?
        .to_string();
    Ok(phc)
}

/// Verifies a password against a stored PHC string.
///
/// An unparseable stored hash verifies as `false` rather than erroring;
/// a corrupt record must not turn into a 500 on the login path.
#[must_use]
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("Abcdef1!").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "Abcdef1!"));
        assert!(!verify_password(&hash, "Abcdef1?"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("Abcdef1!").unwrap();
        let second = hash_password("Abcdef1!").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_garbage_stored_hash_fails_closed() {
        assert!(!verify_password("not-a-phc-string", "anything"));
        assert!(!verify_password("", "anything"));
    }
}
