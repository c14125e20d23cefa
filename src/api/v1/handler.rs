use super::error::*;
use crate::application_port::*;
use crate::domain_model::Credential;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub async fn signup(
    body: SignupRequest,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let signup_input = SignupInput {
        name: body.name,
        email: body.email,
        password: body.password,
    };
    let tokens = account_service
        .signup(signup_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(tokens)))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    body: LoginRequest,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let login_input = LoginInput {
        email: body.email,
        password: body.password,
    };
    let tokens = account_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(tokens)))
}

pub async fn refresh(
    credential: Credential,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let tokens = account_service
        .refresh(&credential)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(tokens)))
}

pub async fn logout(
    credential: Credential,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    account_service
        .logout(&credential)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn profile(
    credential: Credential,
    account_service: Arc<dyn AccountService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let profile = account_service
        .profile(&credential)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(profile)))
}
