use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Basic};

use crate::error::AppError;

/// Caller identity taken from the `Authorization: Basic ...` header.
///
/// Only the username is used. The password is not checked here; whatever
/// sits in front of the proxy is trusted to have authenticated the caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let credentials = parts
            .headers
            .typed_get::<Authorization<Basic>>()
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser {
            username: credentials.username().to_string(),
        })
    }
}
