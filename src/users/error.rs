//! User domain errors.

use thiserror::Error;
use uuid::Uuid;

/// Errors produced by user operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFoundById(Uuid),

    #[error("User not found: {0}")]
    NotFoundByEmail(String),

    #[error("User with this email already exists: {0}")]
    AlreadyExists(String),

    /// First failing field, as `<field>: <reason>`.
    #[error("{0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    Password(String),
}

impl UserError {
    pub fn validation(field: &str, reason: &str) -> Self {
        Self::Validation(format!("{field}: {reason}"))
    }
}
