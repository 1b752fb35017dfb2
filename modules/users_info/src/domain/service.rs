use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use crate::contract::model::{NewUser, User, UserId, UserUpdate};
use crate::domain::error::DomainError;
use crate::domain::repo::UsersRepository;

/// Domain service with business rules for user management.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    // Held across "check email, then write" so the two store calls act as one step.
    write_gate: Arc<Mutex<()>>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Upper bound on `name` length in bytes; `None` leaves it uncapped.
    pub max_name_length: Option<usize>,
}

impl Service {
    /// Create a service over an injected store.
    pub fn new(repo: Arc<dyn UsersRepository>, config: ServiceConfig) -> Self {
        Self {
            repo,
            write_gate: Arc::new(Mutex::new(())),
            config,
        }
    }

    #[instrument(
        name = "users_info.service.create_user",
        skip(self),
        fields(email = %new_user.email, name = %new_user.name)
    )]
    pub fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");
        let _gate = self.write_gate.lock();

        // Uniqueness is checked before field validation
        if self.repo.get_by_email(&new_user.email)?.is_some() {
            return Err(DomainError::duplicate_email(new_user.email));
        }

        self.validate_fields(&new_user.name, &new_user.email)?;

        let now = Utc::now();
        let mut user = User {
            id: 0,
            name: new_user.name,
            email: new_user.email,
            created_at: now,
            updated_at: now,
        };

        self.repo.create(&mut user)?;

        info!("Successfully created user with id={}", user.id);
        Ok(user)
    }

    #[instrument(name = "users_info.service.get_user", skip(self), fields(user_id = id))]
    pub fn get_user(&self, id: UserId) -> Result<User, DomainError> {
        debug!("Getting user by id");

        if id <= 0 {
            return Err(DomainError::invalid_id(id));
        }

        let user = self.repo.get_by_id(id)?;
        debug!("Successfully retrieved user");
        Ok(user)
    }

    #[instrument(
        name = "users_info.service.update_user",
        skip(self),
        fields(user_id = id, email = %update.email)
    )]
    pub fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, DomainError> {
        info!("Updating user");
        let _gate = self.write_gate.lock();

        let mut current = self.get_user(id)?;

        // Keeping one's own email is not a conflict
        if let Some(holder) = self.repo.get_by_email(&update.email)? {
            if holder.id != id {
                return Err(DomainError::duplicate_email(update.email));
            }
        }

        self.validate_fields(&update.name, &update.email)?;

        current.name = update.name;
        current.email = update.email;
        // Never move updated_at backwards, even if the wall clock does
        current.updated_at = Utc::now().max(current.updated_at);

        self.repo.update(&current)?;

        info!("Successfully updated user");
        Ok(current)
    }

    #[instrument(name = "users_info.service.delete_user", skip(self), fields(user_id = id))]
    pub fn delete_user(&self, id: UserId) -> Result<(), DomainError> {
        info!("Deleting user");
        let _gate = self.write_gate.lock();

        self.get_user(id)?;
        self.repo.delete(id)?;

        info!("Successfully deleted user");
        Ok(())
    }

    #[instrument(name = "users_info.service.list_users", skip(self))]
    pub fn list_users(&self) -> Result<Vec<User>, DomainError> {
        debug!("Listing users");
        let users = self.repo.list()?;
        debug!("Successfully listed {} users", users.len());
        Ok(users)
    }

    // --- validation helpers ---

    fn validate_fields(&self, name: &str, email: &str) -> Result<(), DomainError> {
        self.validate_name(name)?;
        Self::validate_email(email)?;
        Ok(())
    }

    fn validate_name(&self, name: &str) -> Result<(), DomainError> {
        if name.is_empty() {
            return Err(DomainError::empty_name());
        }
        if let Some(max) = self.config.max_name_length {
            if name.len() > max {
                return Err(DomainError::name_too_long(name.len(), max));
            }
        }
        Ok(())
    }

    fn validate_email(email: &str) -> Result<(), DomainError> {
        if email.is_empty() {
            return Err(DomainError::empty_email());
        }
        Ok(())
    }
}
