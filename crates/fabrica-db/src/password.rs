//! # Password Storage
//!
//! New passwords are stored as Argon2 PHC strings. Rows created by the
//! legacy system hold the plaintext password and still verify by exact
//! comparison.
//!
//! ```text
//!   stored value                         verify(candidate)
//!   ──────────────────────────────────   ───────────────────────────────
//!   $argon2id$v=19$m=19456,t=2,p=1$...   Argon2 check
//!   secreto                              candidate == "secreto"
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};

use crate::error::{DbError, DbResult};

const PHC_PREFIX: &str = "$argon2";

/// Hash a password for storage.
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Check a candidate password against a stored value.
pub fn verify_password(candidate: &str, stored: &str) -> bool {
    if !is_hashed(stored) {
        return candidate == stored;
    }

    let parsed_hash = match PasswordHash::new(stored) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Whether the stored value is an Argon2 hash rather than legacy plaintext.
pub fn is_hashed(stored: &str) -> bool {
    stored.starts_with(PHC_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secreto").unwrap();
        assert!(is_hashed(&hash));
        assert_ne!(hash, "secreto");
        assert!(verify_password("secreto", &hash));
        assert!(!verify_password("Secreto", &hash));
        assert!(!verify_password("", &hash));
    }

    #[test]
    fn test_legacy_plaintext() {
        assert!(verify_password("1234", "1234"));
        assert!(!verify_password("1234 ", "1234"));
        assert!(!verify_password("", "1234"));
    }

    #[test]
    fn test_corrupt_hash_never_verifies() {
        assert!(!verify_password("x", "$argon2id$garbage"));
    }
}
