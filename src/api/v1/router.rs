use super::error::*;
use super::handler;
use crate::application_impl::AuthGate;
use crate::domain_model::Credential;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let signup = warp::post()
        .and(warp::path("users"))
        .and(warp::path("signup"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.account_service.clone()))
        .and_then(handler::signup);

    let login = warp::post()
        .and(warp::path("users"))
        .and(warp::path("login"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.account_service.clone()))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path("users"))
        .and(warp::path("refresh"))
        .and(warp::path::end())
        .and(with_credential(server.refresh_gate.clone()))
        .and(with(server.account_service.clone()))
        .and_then(handler::refresh);

    let logout = warp::post()
        .and(warp::path("users"))
        .and(warp::path("logout"))
        .and(warp::path::end())
        .and(with_credential(server.access_gate.clone()))
        .and(with(server.account_service.clone()))
        .and_then(handler::logout);

    let profile = warp::get()
        .and(warp::path("users"))
        .and(warp::path::end())
        .and(with_credential(server.access_gate.clone()))
        .and(with(server.account_service.clone()))
        .and_then(handler::profile);

    signup.or(login).or(refresh).or(logout).or(profile)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_credential(
    gate: Arc<AuthGate>,
) -> impl Filter<Extract = (Credential,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(http::header::AUTHORIZATION.as_str()).and_then(
        move |authorization: Option<String>| {
            let gate = gate.clone();
            async move {
                gate.authenticate(authorization.as_deref())
                    .await
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)
            }
        },
    )
}
