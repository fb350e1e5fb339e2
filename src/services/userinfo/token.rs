//! Bearer token location and the collaborators used to resolve it.
use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::error::OidcError;
use super::request::UserinfoRequest;
use super::ticket::Ticket;

const BEARER_PREFIX: &str = "Bearer ";

/// Failure of the token store itself (not an invalid token).
#[derive(Debug, Error)]
pub enum TokenFormatError {
    #[error("token backend unavailable: {0}")]
    Unavailable(String),
}

/// Exchanges an access token string for the ticket it represents.
///
/// Returns:
/// - `Ok(Some(ticket))` => the token is authentic (expiry is checked by the caller)
/// - `Ok(None)`         => the token is unknown, malformed or forged
/// - `Err(_)`           => backend failure, aborts the request
#[async_trait]
pub trait AccessTokenFormat: Send + Sync {
    async fn deserialize_access_token(
        &self,
        token: &str,
        request: &UserinfoRequest,
    ) -> Result<Option<Ticket>, TokenFormatError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Find the bearer token: explicit `access_token` parameter first, then
/// `Authorization: Bearer <token>`.
pub fn locate(request: &UserinfoRequest, headers: &HeaderMap) -> Result<String, OidcError> {
    if let Some(token) = request.access_token() {
        return Ok(token.to_string());
    }

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            OidcError::invalid_request(
                "A malformed userinfo request has been received: \
                 an access token must be sent in the 'Authorization' header \
                 or as the 'access_token' parameter.",
            )
        })?;

    let token = strip_bearer(authorization).ok_or_else(|| {
        OidcError::invalid_request(
            "A malformed userinfo request has been received: \
             the 'Authorization' header must use the 'Bearer' scheme.",
        )
    })?;

    let token = token.trim();
    if token.is_empty() {
        return Err(OidcError::invalid_request(
            "A malformed userinfo request has been received: \
             the bearer token was missing from the 'Authorization' header.",
        ));
    }

    Ok(token.to_string())
}

fn strip_bearer(value: &str) -> Option<&str> {
    let prefix = value.get(..BEARER_PREFIX.len())?;
    prefix
        .eq_ignore_ascii_case(BEARER_PREFIX)
        .then(|| &value[BEARER_PREFIX.len()..])
}
