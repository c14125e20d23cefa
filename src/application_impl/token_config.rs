use jsonwebtoken::Algorithm;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Symmetric algorithms a deployment may sign with. Everything else, `none` included, is refused.
pub const ALLOWED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

pub const DEFAULT_ALGORITHM: &str = "HS256";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("signing secret is not configured")]
    MissingSecret,
    #[error("unsupported signing algorithm {0:?}, use one of HS256, HS384, HS512")]
    UnsupportedAlgorithm(String),
    #[error("invalid token lifetime: {0}")]
    InvalidLifetime(String),
}

#[derive(Clone)]
pub struct TokenConfig {
    pub signing_key: Vec<u8>,
    pub algorithm: Algorithm,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenConfig {
    pub fn new(
        secret: Option<&str>,
        algorithm: &str,
        access_ttl_secs: u64,
        refresh_ttl_secs: u64,
    ) -> Result<Self, ConfigError> {
        let secret = secret
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingSecret)?;
        let algorithm = parse_algorithm(algorithm)?;
        if access_ttl_secs == 0 {
            return Err(ConfigError::InvalidLifetime(
                "access token lifetime must be positive".to_string(),
            ));
        }
        if refresh_ttl_secs == 0 {
            return Err(ConfigError::InvalidLifetime(
                "refresh token lifetime must be positive".to_string(),
            ));
        }

        Ok(Self {
            signing_key: secret.as_bytes().to_vec(),
            algorithm,
            access_ttl: Duration::from_secs(access_ttl_secs),
            refresh_ttl: Duration::from_secs(refresh_ttl_secs),
        })
    }

    /// TTL of every link, blacklist and reuse entry: the longest token lifetime.
    pub fn cache_ttl_secs(&self) -> u64 {
        self.refresh_ttl.max(self.access_ttl).as_secs()
    }
}

pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    let algorithm = Algorithm::from_str(name)
        .map_err(|_| ConfigError::UnsupportedAlgorithm(name.to_string()))?;
    if ALLOWED_ALGORITHMS.contains(&algorithm) {
        Ok(algorithm)
    } else {
        Err(ConfigError::UnsupportedAlgorithm(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_required() {
        assert!(matches!(
            TokenConfig::new(None, DEFAULT_ALGORITHM, 60, 600),
            Err(ConfigError::MissingSecret)
        ));
        assert!(matches!(
            TokenConfig::new(Some("  "), DEFAULT_ALGORITHM, 60, 600),
            Err(ConfigError::MissingSecret)
        ));
    }

    #[test]
    fn only_hmac_algorithms_are_allowed() {
        assert_eq!(parse_algorithm("HS256").unwrap(), Algorithm::HS256);
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
        for name in ["none", "RS256", "ES256", "EdDSA", "hs256", ""] {
            assert!(
                matches!(parse_algorithm(name), Err(ConfigError::UnsupportedAlgorithm(_))),
                "{name} should be refused"
            );
        }
    }

    #[test]
    fn lifetimes_must_be_positive() {
        assert!(matches!(
            TokenConfig::new(Some("secret"), DEFAULT_ALGORITHM, 0, 600),
            Err(ConfigError::InvalidLifetime(_))
        ));
        assert!(matches!(
            TokenConfig::new(Some("secret"), DEFAULT_ALGORITHM, 60, 0),
            Err(ConfigError::InvalidLifetime(_))
        ));
    }

    #[test]
    fn cache_ttl_covers_the_longest_lifetime() {
        let cfg = TokenConfig::new(Some("secret"), DEFAULT_ALGORITHM, 60, 600).unwrap();
        assert_eq!(cfg.cache_ttl_secs(), 600);
        let cfg = TokenConfig::new(Some("secret"), DEFAULT_ALGORITHM, 900, 600).unwrap();
        assert_eq!(cfg.cache_ttl_secs(), 900);
    }

    #[test]
    fn debug_output_hides_the_secret() {
        let cfg = TokenConfig::new(Some("hunter2"), DEFAULT_ALGORITHM, 60, 600).unwrap();
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }
}
