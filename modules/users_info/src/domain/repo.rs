use thiserror::Error;

use crate::contract::model::{User, UserId};

/// Failures reported by a record store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[error("record {id} not found")]
    NotFound { id: UserId },
}

/// Port for the domain layer: storage operations the domain needs.
///
/// Every call is a single atomic step; implementations own identifier allocation.
pub trait UsersRepository: Send + Sync {
    /// Assign the next identifier to `user`, write it back into `user.id` and store it.
    ///
    /// Identifiers are `max ever issued + 1` and never reused after a delete.
    fn create(&self, user: &mut User) -> Result<(), RepoError>;
    /// Load a user by id.
    fn get_by_id(&self, id: UserId) -> Result<User, RepoError>;
    /// Find the user holding exactly this email, if any. Absence is not an error.
    fn get_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    /// Replace the stored record at `user.id`.
    fn update(&self, user: &User) -> Result<(), RepoError>;
    /// Remove the record at `id`.
    fn delete(&self, id: UserId) -> Result<(), RepoError>;
    /// All live records; empty when the store is empty.
    fn list(&self) -> Result<Vec<User>, RepoError>;
}
