use async_trait::async_trait;

use crate::contract::{
    error::UsersInfoError,
    model::{NewUser, User, UserId, UserUpdate},
};

/// Public API trait for the users_info module that other modules can use
#[async_trait]
pub trait UsersInfoApi: Send + Sync {
    /// Get a user by ID
    async fn get_user(&self, id: UserId) -> Result<User, UsersInfoError>;

    /// List all live users
    async fn list_users(&self) -> Result<Vec<User>, UsersInfoError>;

    /// Create a new user
    async fn create_user(&self, new_user: NewUser) -> Result<User, UsersInfoError>;

    /// Replace name and email of an existing user
    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, UsersInfoError>;

    /// Delete a user by ID
    async fn delete_user(&self, id: UserId) -> Result<(), UsersInfoError>;
}
