use super::{TokenError, TokenPair};
use crate::domain_model::*;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("signup validation failed")]
    Validation(SignupViolations),
    #[error("user already exists")]
    UserExists,
    #[error("user not found")]
    UserNotFound,
    #[error("identity claim missing or malformed")]
    InvalidIdentity,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Per-field signup rejections, reported together.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignupViolations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
}

impl SignupViolations {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.pass.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
    /// Remaining lifetime of the presented access token, `HH:MM:SS`.
    pub session: String,
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AccountService: Send + Sync {
    async fn signup(&self, request: SignupInput) -> Result<TokenPair, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<TokenPair, AuthError>;
    async fn refresh(&self, credential: &Credential) -> Result<TokenPair, AuthError>;
    async fn logout(&self, credential: &Credential) -> Result<(), AuthError>;
    async fn profile(&self, credential: &Credential) -> Result<Profile, AuthError>;
    /// Look up the user a credential acts for. Never falls back to a default identity.
    async fn resolve_identity(&self, credential: &Credential) -> Result<User, AuthError>;
}
