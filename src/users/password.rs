//! Password hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::users::error::UserError;

/// One-way password hashing used when storing credentials.
pub trait PasswordService: Send + Sync {
    fn encrypt(&self, password: &str) -> Result<String, UserError>;

    fn verify(&self, password: &str, encrypted: &str) -> bool;
}

/// Salted Argon2id hashes in PHC string format.
#[derive(Debug, Default, Clone)]
pub struct Argon2PasswordService {
    argon2: Argon2<'static>,
}

impl Argon2PasswordService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordService for Argon2PasswordService {
    fn encrypt(&self, password: &str) -> Result<String, UserError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::Password(e.to_string()))
    }

    fn verify(&self, password: &str, encrypted: &str) -> bool {
        PasswordHash::new(encrypted)
            .map(|parsed| self.argon2.verify_password(password.as_bytes(), &parsed).is_ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let service = Argon2PasswordService::new();
        let hash = service.encrypt("secret").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("secret"));
        assert!(service.verify("secret", &hash));
        assert!(!service.verify("wrong", &hash));
        assert!(!service.verify("secret", "not-a-hash"));
    }

    #[test]
    fn test_salted() {
        let service = Argon2PasswordService::new();
        assert_ne!(service.encrypt("same").unwrap(), service.encrypt("same").unwrap());
    }
}
