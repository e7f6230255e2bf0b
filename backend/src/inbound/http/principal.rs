//! Bearer-token authentication for handlers.
//!
//! [`Principal`] implements [`FromRequest`], so handlers declare an
//! authenticated caller simply by taking it as an argument. Extraction
//! reads the `Authorization: Bearer` header and verifies the access token
//! against the configured [`TokenService`].

use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use super::error::ApiError;
use super::state::HttpState;
use crate::domain::{DomainError, Principal};

const BEARER_PREFIX: &str = "Bearer ";

fn bearer_token(req: &HttpRequest) -> Result<String, DomainError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| DomainError::unauthorized("Missing token"))?;
    let value = header
        .to_str()
        .map_err(|_| DomainError::unauthorized("Invalid token"))?;
    let token = value
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| DomainError::unauthorized("Invalid token"))?
        .trim();
    if token.is_empty() {
        return Err(DomainError::unauthorized("Missing token"));
    }
    Ok(token.to_owned())
}

impl FromRequest for Principal {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let token = token.map_err(ApiError::from)?;
            let state = state
                .ok_or_else(|| ApiError::from(DomainError::internal("http state not configured")))?;
            state
                .tokens()
                .verify_access(&token)
                .await
                .map_err(|_| ApiError::from(DomainError::unauthorized("Invalid token")))
        })
    }
}
