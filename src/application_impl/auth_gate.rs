use crate::application_port::*;
use crate::domain_model::*;
use std::sync::Arc;
use tracing::{error, warn};

pub const BEARER_SCHEME: &str = "Bearer";

/// Why a bearer credential was refused. Only ever logged; clients see one generic message.
#[derive(Debug, thiserror::Error)]
pub enum AuthRejection {
    #[error("missing bearer token")]
    MissingToken,
    #[error("expected authentication scheme 'Bearer'")]
    InvalidScheme,
    #[error("wrong token type: expected {expected}, got {actual}")]
    WrongTokenType {
        expected: TokenType,
        actual: TokenType,
    },
    #[error("invalid bearer token: {0}")]
    InvalidToken(TokenError),
    #[error("token store unavailable: {0}")]
    Unavailable(String),
}

impl From<TokenError> for AuthRejection {
    fn from(error: TokenError) -> Self {
        if error.is_rejection() {
            AuthRejection::InvalidToken(error)
        } else {
            AuthRejection::Unavailable(error.to_string())
        }
    }
}

/// Request-time check in front of protected operations.
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<dyn TokenService>,
    expected: TokenType,
}

impl AuthGate {
    pub fn new(tokens: Arc<dyn TokenService>, expected: TokenType) -> Self {
        Self { tokens, expected }
    }

    pub fn access(tokens: Arc<dyn TokenService>) -> Self {
        Self::new(tokens, TokenType::Access)
    }

    pub fn refresh(tokens: Arc<dyn TokenService>) -> Self {
        Self::new(tokens, TokenType::Refresh)
    }

    /// Validate the raw `Authorization` header value.
    pub async fn authenticate(
        &self,
        authorization: Option<&str>,
    ) -> Result<Credential, AuthRejection> {
        let result = self.check(authorization).await;
        match &result {
            Err(rejection @ AuthRejection::Unavailable(_)) => {
                error!(expected = %self.expected, %rejection, "bearer check failed");
            }
            Err(rejection) => {
                warn!(expected = %self.expected, %rejection, "bearer credential rejected");
            }
            Ok(_) => {}
        }
        result
    }

    async fn check(&self, authorization: Option<&str>) -> Result<Credential, AuthRejection> {
        let token = bearer_token(authorization.ok_or(AuthRejection::MissingToken)?)?;

        let credential = self.tokens.verify(token).await?;

        if credential.token_type() != self.expected {
            return Err(AuthRejection::WrongTokenType {
                expected: self.expected,
                actual: credential.token_type(),
            });
        }
        Ok(credential)
    }
}

/// Split `Bearer <token>`. Auth schemes are case-insensitive (RFC 7235), so `bearer` is accepted.
pub fn bearer_token(header: &str) -> Result<&str, AuthRejection> {
    let header = header.trim();
    if header.is_empty() {
        return Err(AuthRejection::MissingToken);
    }
    let (scheme, token) = match header.split_once(' ') {
        Some((scheme, token)) => (scheme, token.trim()),
        None => (header, ""),
    };
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthRejection::InvalidScheme);
    }
    if token.is_empty() {
        return Err(AuthRejection::MissingToken);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{DEFAULT_ALGORITHM, JwtCodec, TokenConfig, TokenManager};
    use crate::domain_port::*;
    use crate::infra_memory::memory_token_stores;

    fn tokens_with(stores: TokenStores) -> Arc<dyn TokenService> {
        let cfg = TokenConfig::new(Some("test-secret"), DEFAULT_ALGORITHM, 60, 600).unwrap();
        Arc::new(TokenManager::new(&cfg, Arc::new(JwtCodec::new(&cfg)), stores))
    }

    fn tokens() -> Arc<dyn TokenService> {
        tokens_with(memory_token_stores())
    }

    struct UnreachableRevocations;

    #[async_trait::async_trait]
    impl RevocationStore for UnreachableRevocations {
        async fn put(&self, _jti: &TokenId, _ttl_secs: u64) -> Result<(), StoreError> {
            Err(StoreError::Cache("connection refused".to_string()))
        }

        async fn put_many(&self, _jtis: &[TokenId], _ttl_secs: u64) -> Result<(), StoreError> {
            Err(StoreError::Cache("connection refused".to_string()))
        }

        async fn exists(&self, _jti: &TokenId) -> Result<bool, StoreError> {
            Err(StoreError::Cache("connection refused".to_string()))
        }
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token("Bearer abc").unwrap(), "abc");
        assert_eq!(bearer_token("bearer  abc ").unwrap(), "abc");
        assert_eq!(bearer_token("BEARER abc").unwrap(), "abc");
        assert!(matches!(bearer_token(""), Err(AuthRejection::MissingToken)));
        assert!(matches!(bearer_token("Bearer"), Err(AuthRejection::MissingToken)));
        assert!(matches!(bearer_token("Bearer   "), Err(AuthRejection::MissingToken)));
        assert!(matches!(bearer_token("Basic abc"), Err(AuthRejection::InvalidScheme)));
        assert!(matches!(bearer_token("abc"), Err(AuthRejection::InvalidScheme)));
    }

    #[tokio::test]
    async fn access_gate_accepts_access_tokens() {
        let tokens = tokens();
        let pair = tokens.issue(&Subject::new().with("user_id", 1)).await.unwrap();
        let gate = AuthGate::access(tokens);

        let credential = gate
            .authenticate(Some(&format!("Bearer {}", pair.access)))
            .await
            .unwrap();
        assert_eq!(credential.token_type(), TokenType::Access);
        assert_eq!(credential.get("user_id"), Some(&SubjectValue::Int(1)));
    }

    #[tokio::test]
    async fn gates_reject_the_other_token_type() {
        let tokens = tokens();
        let pair = tokens.issue(&Subject::new().with("user_id", 1)).await.unwrap();

        let access_gate = AuthGate::access(tokens.clone());
        assert!(matches!(
            access_gate
                .authenticate(Some(&format!("Bearer {}", pair.refresh)))
                .await,
            Err(AuthRejection::WrongTokenType { .. })
        ));

        let refresh_gate = AuthGate::refresh(tokens);
        assert!(matches!(
            refresh_gate
                .authenticate(Some(&format!("Bearer {}", pair.access)))
                .await,
            Err(AuthRejection::WrongTokenType { .. })
        ));
        assert!(
            refresh_gate
                .authenticate(Some(&format!("Bearer {}", pair.refresh)))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn missing_and_foreign_credentials_are_rejected() {
        let gate = AuthGate::access(tokens());
        assert!(matches!(
            gate.authenticate(None).await,
            Err(AuthRejection::MissingToken)
        ));
        assert!(matches!(
            gate.authenticate(Some("Basic dXNlcjpwYXNz")).await,
            Err(AuthRejection::InvalidScheme)
        ));
        assert!(matches!(
            gate.authenticate(Some("Bearer nonsense")).await,
            Err(AuthRejection::InvalidToken(TokenError::Malformed))
        ));
    }

    #[tokio::test]
    async fn revoked_tokens_are_rejected() {
        let tokens = tokens();
        let pair = tokens.issue(&Subject::new().with("user_id", 1)).await.unwrap();
        let gate = AuthGate::access(tokens.clone());
        let header = format!("Bearer {}", pair.access);

        let credential = gate.authenticate(Some(&header)).await.unwrap();
        tokens.revoke(&credential).await.unwrap();

        assert!(matches!(
            gate.authenticate(Some(&header)).await,
            Err(AuthRejection::InvalidToken(TokenError::Revoked))
        ));
    }

    #[tokio::test]
    async fn store_outage_is_not_an_acceptance() {
        let stores = TokenStores {
            revocations: Arc::new(UnreachableRevocations),
            ..memory_token_stores()
        };
        let tokens = tokens_with(stores);
        let pair = tokens.issue(&Subject::new().with("user_id", 1)).await.unwrap();
        let gate = AuthGate::access(tokens);

        assert!(matches!(
            gate.authenticate(Some(&format!("Bearer {}", pair.access))).await,
            Err(AuthRejection::Unavailable(_))
        ));
    }
}
