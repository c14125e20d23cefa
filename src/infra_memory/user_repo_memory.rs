use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::sync::Mutex;

/// In-process user store for development and tests.
pub struct MemoryUserRepo {
    users: DashMap<UserId, User>,
    next_id: Mutex<i64>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        MemoryUserRepo {
            users: DashMap::new(),
            next_id: Mutex::new(1),
        }
    }

    fn find(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users
            .iter()
            .find(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
    }
}

impl Default for MemoryUserRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        // held across the uniqueness check and the insert
        let mut next_id = self
            .next_id
            .lock()
            .map_err(|e| AuthError::InternalError(e.to_string()))?;

        if self
            .find(|u| u.email == user.email || u.name == user.name)
            .is_some()
        {
            return Err(AuthError::UserExists);
        }

        let created = User {
            id: UserId(*next_id),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
        };
        *next_id += 1;
        self.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(&user_id).map(|entry| entry.value().clone()))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        Ok(self.find(|u| u.email == email))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<User>, AuthError> {
        Ok(self.find(|u| u.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_in_order() {
        let repo = MemoryUserRepo::new();
        let a = repo.create(new_user("a", "a@example.com")).await.unwrap();
        let b = repo.create(new_user("b", "b@example.com")).await.unwrap();
        assert_eq!(a.id, UserId(1));
        assert_eq!(b.id, UserId(2));
        assert_eq!(repo.get(UserId(2)).await.unwrap().unwrap().name, "b");
        assert!(repo.get(UserId(3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicates_are_refused() {
        let repo = MemoryUserRepo::new();
        repo.create(new_user("a", "a@example.com")).await.unwrap();
        assert!(matches!(
            repo.create(new_user("a", "other@example.com")).await,
            Err(AuthError::UserExists)
        ));
        assert!(matches!(
            repo.create(new_user("other", "a@example.com")).await,
            Err(AuthError::UserExists)
        ));
        assert!(repo.get_by_email("a@example.com").await.unwrap().is_some());
        assert!(repo.get_by_name("other").await.unwrap().is_none());
    }
}
