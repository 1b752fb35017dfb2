use std::collections::HashMap;

use parking_lot::RwLock;

use crate::contract::model::{User, UserId};
use crate::domain::repo::{RepoError, UsersRepository};

#[derive(Default)]
struct Records {
    users: HashMap<UserId, User>,
    // Highest id ever issued; survives deletes so ids are never reused.
    last_id: UserId,
}

/// In-memory record store guarded by a single reader/writer lock.
///
/// Reads share the lock; `create`, `update` and `delete` take it exclusively.
/// Records are handed out as owned clones.
#[derive(Default)]
pub struct MemoryUsersRepository {
    records: RwLock<Records>,
}

impl MemoryUsersRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsersRepository for MemoryUsersRepository {
    fn create(&self, user: &mut User) -> Result<(), RepoError> {
        let mut records = self.records.write();
        records.last_id += 1;
        user.id = records.last_id;
        records.users.insert(user.id, user.clone());
        Ok(())
    }

    fn get_by_id(&self, id: UserId) -> Result<User, RepoError> {
        self.records
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound { id })
    }

    fn get_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let records = self.records.read();
        Ok(records
            .users
            .values()
            .filter(|u| u.email == email)
            .min_by_key(|u| u.id)
            .cloned())
    }

    fn update(&self, user: &User) -> Result<(), RepoError> {
        let mut records = self.records.write();
        match records.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(RepoError::NotFound { id: user.id }),
        }
    }

    fn delete(&self, id: UserId) -> Result<(), RepoError> {
        self.records
            .write()
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound { id })
    }

    fn list(&self) -> Result<Vec<User>, RepoError> {
        let mut users: Vec<User> = self.records.read().users.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: &str, email: &str) -> User {
        let now = Utc::now();
        User {
            id: 0,
            name: name.to_string(),
            email: email.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn create_assigns_increasing_ids_in_place() {
        let repo = MemoryUsersRepository::new();
        let mut a = user("a", "a@x.com");
        let mut b = user("b", "b@x.com");
        repo.create(&mut a).unwrap();
        repo.create(&mut b).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(repo.get_by_id(2).unwrap(), b);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let repo = MemoryUsersRepository::new();
        let mut a = user("a", "a@x.com");
        let mut b = user("b", "b@x.com");
        repo.create(&mut a).unwrap();
        repo.create(&mut b).unwrap();
        repo.delete(b.id).unwrap();

        let mut c = user("c", "c@x.com");
        repo.create(&mut c).unwrap();
        assert_eq!(c.id, 3);
    }

    #[test]
    fn missing_ids_report_not_found() {
        let repo = MemoryUsersRepository::new();
        assert_eq!(repo.get_by_id(7), Err(RepoError::NotFound { id: 7 }));
        assert_eq!(repo.delete(7), Err(RepoError::NotFound { id: 7 }));

        let mut ghost = user("ghost", "g@x.com");
        ghost.id = 7;
        assert_eq!(repo.update(&ghost), Err(RepoError::NotFound { id: 7 }));
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn get_by_email_is_exact_and_absence_is_not_an_error() {
        let repo = MemoryUsersRepository::new();
        let mut a = user("a", "a@x.com");
        repo.create(&mut a).unwrap();

        assert_eq!(repo.get_by_email("a@x.com").unwrap().map(|u| u.id), Some(1));
        assert_eq!(repo.get_by_email("A@x.com").unwrap(), None);
        assert_eq!(repo.get_by_email("").unwrap(), None);
    }

    #[test]
    fn update_replaces_the_stored_record() {
        let repo = MemoryUsersRepository::new();
        let mut a = user("a", "a@x.com");
        repo.create(&mut a).unwrap();

        a.name = "alpha".to_string();
        a.email = "alpha@x.com".to_string();
        repo.update(&a).unwrap();

        let stored = repo.get_by_id(a.id).unwrap();
        assert_eq!(stored.name, "alpha");
        assert_eq!(repo.get_by_email("a@x.com").unwrap(), None);
        assert_eq!(repo.get_by_email("alpha@x.com").unwrap(), Some(stored));
    }

    #[test]
    fn list_returns_only_live_records() {
        let repo = MemoryUsersRepository::new();
        for (n, e) in [("a", "a@x.com"), ("b", "b@x.com"), ("c", "c@x.com")] {
            repo.create(&mut user(n, e)).unwrap();
        }
        repo.delete(2).unwrap();

        let ids: Vec<UserId> = repo.list().unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
