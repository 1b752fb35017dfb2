use thiserror::Error;

use crate::contract::model::UserId;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsersInfoError {
    #[error("User not found: {id}")]
    NotFound { id: UserId },

    #[error("User with email '{email}' already exists")]
    Conflict { email: String },

    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },
}

impl UsersInfoError {
    pub fn not_found(id: UserId) -> Self {
        Self::NotFound { id }
    }

    pub fn conflict(email: impl Into<String>) -> Self {
        Self::Conflict {
            email: email.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<crate::domain::error::DomainError> for UsersInfoError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            NotFound { id } => Self::not_found(id),
            DuplicateEmail { email } => Self::conflict(email),
            Validation { field, message } => Self::validation(field, message),
        }
    }
}
