//! Protocol and pipeline errors for the userinfo endpoint.
//!
//! - `OidcError` is an OpenID Connect error triple. It is never fatal: the pipeline
//!   turns it into an error payload and sends it in the same request/response cycle.
//! - `PipelineError` is fatal. It aborts the pipeline without sending anything and is
//!   surfaced to the transport as an internal error.
use axum::http::StatusCode;
use thiserror::Error;

use super::token::TokenFormatError;

pub mod codes {
    pub const INVALID_REQUEST: &str = "invalid_request";
    pub const INVALID_GRANT: &str = "invalid_grant";
    pub const SERVER_ERROR: &str = "server_error";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {}", .description.as_deref().unwrap_or("(no description)"))]
pub struct OidcError {
    pub code: String,
    pub description: Option<String>,
    pub uri: Option<String>,
}

impl OidcError {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: Some(description.into()),
            uri: None,
        }
    }

    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self::new(codes::INVALID_REQUEST, description)
    }

    pub fn invalid_grant(description: impl Into<String>) -> Self {
        Self::new(codes::INVALID_GRANT, description)
    }

    pub fn server_error(description: impl Into<String>) -> Self {
        Self::new(codes::SERVER_ERROR, description)
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Transport status for this error.
    ///
    /// Authentication failures stay 400: a 401 here would be picked up by the host's
    /// own challenge handling and rewritten upstream.
    pub fn status(&self) -> StatusCode {
        if self.code == codes::SERVER_ERROR {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("access token deserialization failed: {0}")]
    TokenFormat(#[from] TokenFormatError),

    #[error("a userinfo response was already sent for this request")]
    AlreadySent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_maps_to_500_and_everything_else_to_400() {
        assert_eq!(
            OidcError::server_error("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            OidcError::invalid_grant("Invalid token.").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            OidcError::new("custom_error", "from a hook").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn display_includes_code_and_description() {
        let err = OidcError::invalid_grant("Expired token.");
        assert_eq!(err.to_string(), "invalid_grant: Expired token.");
    }
}
