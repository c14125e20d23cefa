use crate::api::v1::handler::ApiResponse;
use crate::application_impl::AuthRejection;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, error) = if let Some(code) = err.find::<ApiErrorCode>() {
        (code.status(), ApiError::from(code))
    } else if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            ApiError::new("NotFound", "Not found"),
        )
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ApiError::new("BadRequest", e.to_string()),
        )
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ApiError::new("MethodNotAllowed", "Method not allowed"),
        )
    } else {
        error!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("InternalError", "Internal error"),
        )
    };

    let json = warp::reply::json(&ApiResponse::<()>::err(error));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<SignupViolations>,
}

impl ApiError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            errors: None,
        }
    }
}

impl From<&ApiErrorCode> for ApiError {
    fn from(code: &ApiErrorCode) -> Self {
        let errors = match code {
            ApiErrorCode::ValidationFailed(violations) => Some(violations.clone()),
            _ => None,
        };
        ApiError {
            code: code.name(),
            message: code.to_string(),
            errors,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ApiErrorCode {
    #[error("Invalid email address or password.")]
    InvalidCredentials,
    #[error("Invalid or expired bearer token.")]
    InvalidToken,
    #[error("Signup validation failed.")]
    ValidationFailed(SignupViolations),
    #[error("Account already exists.")]
    UserExists,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidCredentials => "InvalidCredentials",
            ApiErrorCode::InvalidToken => "InvalidToken",
            ApiErrorCode::ValidationFailed(_) => "ValidationFailed",
            ApiErrorCode::UserExists => "UserExists",
            ApiErrorCode::InternalError => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidCredentials | ApiErrorCode::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiErrorCode::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorCode::UserExists => StatusCode::CONFLICT,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthRejection> for ApiErrorCode {
    fn from(rejection: AuthRejection) -> Self {
        match rejection {
            AuthRejection::Unavailable(e) => ApiErrorCode::internal(e),
            _ => ApiErrorCode::InvalidToken,
        }
    }
}

impl From<TokenError> for ApiErrorCode {
    fn from(error: TokenError) -> Self {
        if error.is_rejection() {
            ApiErrorCode::InvalidToken
        } else {
            ApiErrorCode::internal(error)
        }
    }
}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::Validation(violations) => ApiErrorCode::ValidationFailed(violations),
            AuthError::UserExists => ApiErrorCode::UserExists,
            AuthError::UserNotFound | AuthError::InvalidIdentity => ApiErrorCode::InvalidToken,
            AuthError::Token(e) => ApiErrorCode::from(e),
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}
