use thiserror::Error;

use crate::contract::model::UserId;
use crate::domain::repo::RepoError;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("User not found: {id}")]
    NotFound { id: UserId },

    #[error("User with email '{email}' already exists")]
    DuplicateEmail { email: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },
}

impl DomainError {
    pub fn not_found(id: UserId) -> Self {
        Self::NotFound { id }
    }

    pub fn duplicate_email(email: impl Into<String>) -> Self {
        Self::DuplicateEmail {
            email: email.into(),
        }
    }

    pub fn empty_name() -> Self {
        Self::validation("name", "name is required")
    }

    pub fn empty_email() -> Self {
        Self::validation("email", "email is required")
    }

    pub fn invalid_id(id: UserId) -> Self {
        Self::validation("id", format!("user id must be positive (got {id})"))
    }

    pub fn name_too_long(len: usize, max: usize) -> Self {
        Self::validation(
            "name",
            format!("name too long: {len} bytes (max: {max})"),
        )
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<RepoError> for DomainError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound { id } => Self::not_found(id),
        }
    }
}
