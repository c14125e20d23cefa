use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

/// Subject claim carrying the acting user's id.
pub const USER_ID_CLAIM: &str = "user_id";

const PASSWORD_SPECIALS: &str = r"@_!#$%^&*()<>?/\|}{~:";
const MIN_PASSWORD_LEN: usize = 8;

pub struct Argon2PasswordHasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::InternalError(e.to_string()))?
            .to_string();
        Ok(hash)
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {e}")))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(_) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::InternalError(format!("verify error: {e}"))),
        }
    }
}

/// At least 8 characters with an upper case letter, a lower case letter, a digit and a special.
pub fn check_password_complexity(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(char::is_uppercase)
        && password.chars().any(char::is_lowercase)
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

pub fn is_valid_username(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn format_session(remaining_secs: i64) -> String {
    let secs = remaining_secs.max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

pub struct RealAccountService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenService>,
}

impl RealAccountService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            tokens,
        }
    }

    async fn validate_signup(&self, request: &SignupInput) -> Result<(), AuthError> {
        let mut violations = SignupViolations::default();

        if self.user_repo.get_by_email(&request.email).await?.is_some() {
            violations.email = Some(
                "This email address is already in use. Please choose another one.".to_string(),
            );
        }
        if self.user_repo.get_by_name(&request.name).await?.is_some() {
            violations.name =
                Some("This username is already taken. Please pick a different one.".to_string());
        }
        if !check_password_complexity(&request.password) {
            violations.pass =
                Some("The password does not meet the complexity requirements.".to_string());
        }
        if !is_valid_username(&request.name) {
            violations.name = Some(
                "Invalid username. Please use only letters, numbers, and underscores.".to_string(),
            );
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(AuthError::Validation(violations))
        }
    }

    fn subject_for(user: &User) -> Subject {
        Subject::new().with(USER_ID_CLAIM, user.id.0)
    }
}

#[async_trait::async_trait]
impl AccountService for RealAccountService {
    async fn signup(&self, request: SignupInput) -> Result<TokenPair, AuthError> {
        self.validate_signup(&request).await?;

        let SignupInput {
            name,
            email,
            password,
        } = request;
        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let user = self
            .user_repo
            .create(NewUser {
                name,
                email,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, "user signed up");
        Ok(self.tokens.issue(&Self::subject_for(&user)).await?)
    }

    async fn login(&self, request: LoginInput) -> Result<TokenPair, AuthError> {
        let LoginInput { email, password } = request;

        let user = self
            .user_repo
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let ok = self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(self.tokens.issue(&Self::subject_for(&user)).await?)
    }

    async fn refresh(&self, credential: &Credential) -> Result<TokenPair, AuthError> {
        Ok(self.tokens.rotate(credential).await?)
    }

    async fn logout(&self, credential: &Credential) -> Result<(), AuthError> {
        self.tokens.revoke(credential).await?;
        Ok(())
    }

    async fn profile(&self, credential: &Credential) -> Result<Profile, AuthError> {
        let user = self.resolve_identity(credential).await?;
        let remaining = credential.expires_at() - Utc::now().timestamp();
        Ok(Profile {
            name: user.name,
            email: user.email,
            session: format_session(remaining),
        })
    }

    async fn resolve_identity(&self, credential: &Credential) -> Result<User, AuthError> {
        let user_id = match credential.get(USER_ID_CLAIM) {
            Some(SubjectValue::Int(id)) => UserId(*id),
            _ => {
                error!(subject = %credential.subject(), "credential carries no usable user id");
                return Err(AuthError::InvalidIdentity);
            }
        };

        match self.user_repo.get(user_id).await? {
            Some(user) => Ok(user),
            None => {
                error!(%user_id, "user not found");
                Err(AuthError::UserNotFound)
            }
        }
    }
}
