use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::{error::Error as StdError, fmt};
use tracing::warn;

use crate::services::userinfo::{
    AccessTokenFormat, Principal, Ticket, TokenFormatError, UserinfoRequest,
};

// Errors returned while building the verifier or verifying a token.
#[derive(Debug)]
pub enum AccessJwtError {
    InvalidKey(jsonwebtoken::errors::Error),
    Jwt(jsonwebtoken::errors::Error),
}

impl fmt::Display for AccessJwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey(e) => write!(f, "invalid ed25519 public key pem: {}", e),
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
        }
    }
}

impl StdError for AccessJwtError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::InvalidKey(e) | Self::Jwt(e) => Some(e),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AccessJwtError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

/// JWT access-token reader.
///
/// Checks signature and issuer only:
/// - `aud` names the resource server, so it is not checked here.
/// - `exp` is left to the pipeline, which reports expired tokens on their own.
///
/// Key material is not printable via Debug.
#[derive(Clone)]
pub struct AccessJwtFormat {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for AccessJwtFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessJwtFormat")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AccessJwtFormat {
    /// `public_key_pem` must be an Ed25519 public key in PEM format.
    pub fn new(public_key_pem: &str, issuer: &str) -> Result<Self, AccessJwtError> {
        let decoding_key = DecodingKey::from_ed_pem(public_key_pem.as_bytes())
            .map_err(AccessJwtError::InvalidKey)?;

        Ok(Self::with_key(decoding_key, Algorithm::EdDSA, issuer))
    }

    pub fn with_key(decoding_key: DecodingKey, algorithm: Algorithm, issuer: &str) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["iss"]);
        validation.validate_exp = false;
        validation.validate_aud = false;

        Self {
            decoding_key,
            validation,
        }
    }

    // Verify signature + issuer and return the raw claim set.
    pub fn verify(&self, token: &str) -> Result<Map<String, Value>, AccessJwtError> {
        let data =
            jsonwebtoken::decode::<Map<String, Value>>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    /// Map a verified claim set onto a ticket.
    ///
    /// - strings → one claim; arrays → one claim per scalar element
    /// - numbers / booleans → their JSON text; objects are ignored
    /// - scopes from `scope` (space separated) and `scp`
    /// - presenters from `azp` and `client_id`
    /// - `exp` is a NumericDate and may carry a fraction; anything else makes the
    ///   token unusable (`None`) instead of never expiring
    pub fn ticket_from_claims(claims: &Map<String, Value>) -> Option<Ticket> {
        let mut principal = Principal::default();
        for (claim_type, value) in claims {
            match value {
                Value::Array(items) => {
                    for item in items {
                        if let Some(text) = scalar_text(item) {
                            principal.add_claim(claim_type, text);
                        }
                    }
                }
                other => {
                    if let Some(text) = scalar_text(other) {
                        principal.add_claim(claim_type, text);
                    }
                }
            }
        }

        let mut scopes: Vec<String> = claims
            .get("scope")
            .and_then(Value::as_str)
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        scopes.extend(string_list(claims.get("scp")));

        let mut presenters = string_list(claims.get("azp"));
        presenters.extend(string_list(claims.get("client_id")));

        let mut ticket = Ticket::new(principal)
            .with_scopes(scopes)
            .with_presenters(presenters.into_iter().filter(|p| !p.is_empty()));

        if let Some(exp) = claims.get("exp") {
            ticket = ticket.with_expiry(numeric_date(exp)?);
        }

        Some(ticket)
    }
}

#[async_trait]
impl AccessTokenFormat for AccessJwtFormat {
    async fn deserialize_access_token(
        &self,
        token: &str,
        _request: &UserinfoRequest,
    ) -> Result<Option<Ticket>, TokenFormatError> {
        match self.verify(token) {
            Ok(claims) => {
                let ticket = Self::ticket_from_claims(&claims);
                if ticket.is_none() {
                    warn!(exp = ?claims.get("exp"), "access token carries an unusable exp claim");
                }
                Ok(ticket)
            }
            Err(err) => {
                warn!(error = %err, "access token verification failed");
                Ok(None)
            }
        }
    }
}

// Seconds since the epoch, fraction floored. Non-numbers and out-of-range values are None.
fn numeric_date(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = value.as_f64()?.floor();
    if !seconds.is_finite() || seconds < i64::MIN as f64 || seconds >= i64::MAX as f64 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(seconds as i64, 0)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// A claim that may be a single string or an array of strings.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
