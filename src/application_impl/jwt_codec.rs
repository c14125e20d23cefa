use super::TokenConfig;
use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::time::Duration;

/// HMAC-signed JWT codec. Only the configured algorithm verifies.
pub struct JwtCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    pub fn new(cfg: &TokenConfig) -> Self {
        let mut validation = Validation::new(cfg.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf"]);

        JwtCodec {
            algorithm: cfg.algorithm,
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            validation,
        }
    }
}

fn classify(error: jsonwebtoken::errors::Error) -> TokenError {
    match error.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::ImmatureSignature => TokenError::NotYetValid,
        _ => TokenError::Malformed,
    }
}

impl TokenCodec for JwtCodec {
    fn encode(
        &self,
        token_type: TokenType,
        subject: &Subject,
        lifetime: Duration,
    ) -> Result<EncodedToken, TokenError> {
        let nbf = Utc::now().timestamp();
        let lifetime = i64::try_from(lifetime.as_secs())
            .map_err(|e| TokenError::Internal(format!("lifetime out of range: {e}")))?;
        let exp = nbf + lifetime;
        let expires_at = DateTime::<Utc>::from_timestamp(exp, 0)
            .ok_or_else(|| TokenError::Internal(format!("expiry out of range: {exp}")))?;

        let credential = Credential::new(
            subject.clone(),
            token_type,
            nbf,
            exp,
            TokenId::generate(),
        );
        let token = encode(&Header::new(self.algorithm), &credential, &self.encoding_key)
            .map_err(|e| TokenError::Internal(e.to_string()))?;

        Ok(EncodedToken {
            token,
            jti: credential.id().clone(),
            expires_at,
        })
    }

    fn decode(&self, token: &str) -> Result<Credential, TokenError> {
        let data =
            decode::<Credential>(token, &self.decoding_key, &self.validation).map_err(classify)?;
        let credential = data.claims;

        // the library accepts exp == now; a token is only valid while now < exp
        if Utc::now().timestamp() >= credential.expires_at() {
            return Err(TokenError::Expired);
        }
        Ok(credential)
    }
}
