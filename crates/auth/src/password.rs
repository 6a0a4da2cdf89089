//! Argon2 password hashing.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

const MIN_LEN: usize = 8;
const MAX_LEN: usize = 128;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must be between 8 and 128 characters")]
    Length,

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// PHC-formatted argon2 hash as stored in `users.password_hash`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    pub fn from_plain(password: &str) -> Result<Self, PasswordError> {
        let len = password.chars().count();
        if !(MIN_LEN..=MAX_LEN).contains(&len) {
            return Err(PasswordError::Length);
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;

        Ok(Self(hash.to_string()))
    }

    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// A stored hash that fails to parse never verifies.
    pub fn verify(&self, password: &str) -> bool {
        match PasswordHash::new(&self.0) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("stored password hash is not valid PHC: {e}");
                false
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_only_the_hashed_password() {
        let hash = HashedPassword::from_plain("correct horse").unwrap();
        assert!(hash.verify("correct horse"));
        assert!(!hash.verify("wrong horse"));
    }

    #[test]
    fn salts_each_hash() {
        let a = HashedPassword::from_plain("same-password").unwrap();
        let b = HashedPassword::from_plain("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_short_passwords() {
        assert_eq!(HashedPassword::from_plain("short"), Err(PasswordError::Length));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!HashedPassword::from_hash("not-a-phc-string").verify("anything"));
    }
}
