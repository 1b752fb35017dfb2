use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::UsersInfoApi,
    error::UsersInfoError,
    model::{NewUser, User, UserId, UserUpdate},
};
use crate::domain::service::Service;

/// Local implementation of the UsersInfoApi trait that delegates to the domain service
pub struct UsersInfoLocalClient {
    service: Arc<Service>,
}

impl UsersInfoLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl UsersInfoApi for UsersInfoLocalClient {
    async fn get_user(&self, id: UserId) -> Result<User, UsersInfoError> {
        self.service.get_user(id).map_err(Into::into)
    }

    async fn list_users(&self) -> Result<Vec<User>, UsersInfoError> {
        self.service.list_users().map_err(Into::into)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, UsersInfoError> {
        self.service.create_user(new_user).map_err(Into::into)
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, UsersInfoError> {
        self.service.update_user(id, update).map_err(Into::into)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), UsersInfoError> {
        self.service.delete_user(id).map_err(Into::into)
    }
}
