/*
 * Responsibility
 * - transport request (method / headers / query / body) → 正規化された UserinfoRequest
 * - GET は query string、POST は application/x-www-form-urlencoded の body から読む
 * - それ以外の method / content-type は invalid_request
 */
use std::collections::{BTreeMap, HashMap};

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, header};

use super::error::OidcError;

/// Property key used to tag the message type of a normalized request.
pub const MESSAGE_TYPE_PROPERTY: &str = "message_type";
pub const USERINFO_MESSAGE_TYPE: &str = "userinfo";

pub const ACCESS_TOKEN_PARAMETER: &str = "access_token";

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Raw inbound request as the transport hands it over.
#[derive(Debug, Clone, Default)]
pub struct TransportRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub query: Option<String>,
    pub body: Bytes,
}

/// Normalized userinfo request.
///
/// Parameters are fixed once extracted; only the property bag can change afterwards.
/// When a key appears more than once, the first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserinfoRequest {
    parameters: BTreeMap<String, String>,
    properties: HashMap<String, String>,
}

impl UserinfoRequest {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut parameters = BTreeMap::new();
        for (key, value) in pairs {
            parameters.entry(key.into()).or_insert_with(|| value.into());
        }

        Self {
            parameters,
            properties: HashMap::new(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Explicit `access_token` parameter, if present and non-empty.
    pub fn access_token(&self) -> Option<&str> {
        self.parameter(ACCESS_TOKEN_PARAMETER)
            .filter(|token| !token.is_empty())
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn message_type(&self) -> Option<&str> {
        self.property(MESSAGE_TYPE_PROPERTY)
    }
}

/// Build a `UserinfoRequest` from the transport, tagged as a userinfo message.
pub fn extract(transport: &TransportRequest) -> Result<UserinfoRequest, OidcError> {
    let mut request = if transport.method == Method::GET {
        let query = transport.query.as_deref().unwrap_or_default();
        parse_urlencoded(query.as_bytes())
    } else if transport.method == Method::POST {
        let content_type = transport.headers.get(header::CONTENT_TYPE).ok_or_else(|| {
            OidcError::invalid_request(
                "A malformed userinfo request has been received: \
                 the mandatory 'Content-Type' header was missing from the POST request.",
            )
        })?;

        if !is_form_urlencoded(content_type.to_str().unwrap_or_default()) {
            return Err(OidcError::invalid_request(
                "A malformed userinfo request has been received: \
                 the 'Content-Type' header contained an unexpected value. \
                 Make sure to use 'application/x-www-form-urlencoded'.",
            ));
        }

        parse_urlencoded(&transport.body)
    } else {
        return Err(OidcError::invalid_request(
            "A malformed userinfo request has been received: \
             make sure to use either GET or POST.",
        ));
    };

    request.set_property(MESSAGE_TYPE_PROPERTY, USERINFO_MESSAGE_TYPE);
    Ok(request)
}

fn parse_urlencoded(input: &[u8]) -> UserinfoRequest {
    UserinfoRequest::from_pairs(url::form_urlencoded::parse(input).into_owned())
}

// Media type comparison ignores case and any `;`-separated parameters (charset etc).
fn is_form_urlencoded(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|media_type| media_type.eq_ignore_ascii_case(FORM_URLENCODED))
}
