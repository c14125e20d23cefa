use crate::domain_model::*;
use crate::domain_port::StoreError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("wrong token type: expected {expected}, got {actual}")]
    WrongTokenType {
        expected: TokenType,
        actual: TokenType,
    },
    #[error("refresh token reuse detected")]
    ReuseDetected,
    #[error("token revoked")]
    Revoked,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl TokenError {
    /// `true` for failures caused by the presented token rather than by infrastructure.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, TokenError::Store(_) | TokenError::Internal(_))
    }
}

impl From<StoreError> for TokenError {
    fn from(error: StoreError) -> Self {
        TokenError::Store(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct EncodedToken {
    pub token: String,
    pub jti: TokenId,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

pub trait TokenCodec: Send + Sync {
    /// Sign a fresh token: new `jti`, `nbf` = now, `exp` = now + `lifetime`.
    fn encode(
        &self,
        token_type: TokenType,
        subject: &Subject,
        lifetime: Duration,
    ) -> Result<EncodedToken, TokenError>;

    fn decode(&self, token: &str) -> Result<Credential, TokenError>;
}

#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    async fn issue(&self, subject: &Subject) -> Result<TokenPair, TokenError>;

    /// Redeem a refresh credential for a new pair. A second redemption revokes the family.
    async fn rotate(&self, refresh: &Credential) -> Result<TokenPair, TokenError>;

    /// Revoke the credential and every token reachable through its links.
    /// Returns the number of ids blacklisted.
    async fn revoke(&self, credential: &Credential) -> Result<usize, TokenError>;

    async fn verify(&self, token: &str) -> Result<Credential, TokenError>;
}
