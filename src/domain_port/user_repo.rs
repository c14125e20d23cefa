use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `AuthError::UserExists` when the name or email is taken.
    async fn create(&self, user: NewUser) -> Result<User, AuthError>;

    async fn get(&self, user_id: UserId) -> Result<Option<User>, AuthError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn get_by_name(&self, name: &str) -> Result<Option<User>, AuthError>;
}
