use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::OidcError;

/// Wire body of a userinfo response: either the claim set or an error triple.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UserinfoPayload {
    Claims(Map<String, Value>),
    Error(ErrorPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserinfoResponse {
    status: StatusCode,
    payload: UserinfoPayload,
}

impl UserinfoResponse {
    pub fn claims(claims: Map<String, Value>) -> Self {
        Self {
            status: StatusCode::OK,
            payload: UserinfoPayload::Claims(claims),
        }
    }

    pub fn error(err: &OidcError) -> Self {
        Self {
            status: err.status(),
            payload: UserinfoPayload::Error(ErrorPayload {
                error: err.code.clone(),
                error_description: err.description.clone(),
                error_uri: err.uri.clone(),
            }),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn payload(&self) -> &UserinfoPayload {
        &self.payload
    }

    pub fn into_parts(self) -> (StatusCode, UserinfoPayload) {
        (self.status, self.payload)
    }

    pub fn error_code(&self) -> Option<&str> {
        match &self.payload {
            UserinfoPayload::Error(e) => Some(e.error.as_str()),
            UserinfoPayload::Claims(_) => None,
        }
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        match &self.payload {
            UserinfoPayload::Claims(claims) => claims.get(name),
            UserinfoPayload::Error(_) => None,
        }
    }
}

impl From<OidcError> for UserinfoResponse {
    fn from(err: OidcError) -> Self {
        Self::error(&err)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_body_omits_absent_fields() {
        let response = UserinfoResponse::from(OidcError {
            code: "invalid_request".to_string(),
            description: None,
            uri: None,
        });

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(response.payload()).unwrap(),
            json!({ "error": "invalid_request" })
        );
    }

    #[test]
    fn error_body_carries_the_full_triple() {
        let err = OidcError::server_error("The mandatory 'sub' claim was missing.")
            .with_uri("https://example.com/errors/sub");
        let response = UserinfoResponse::error(&err);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.error_code(), Some("server_error"));
        assert_eq!(
            serde_json::to_value(response.payload()).unwrap(),
            json!({
                "error": "server_error",
                "error_description": "The mandatory 'sub' claim was missing.",
                "error_uri": "https://example.com/errors/sub",
            })
        );
    }

    #[test]
    fn claims_body_is_the_flat_mapping() {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), json!("alice"));
        let response = UserinfoResponse::claims(claims);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.error_code(), None);
        assert_eq!(response.claim("sub"), Some(&json!("alice")));
        assert_eq!(
            serde_json::to_value(response.payload()).unwrap(),
            json!({ "sub": "alice" })
        );
    }
}
