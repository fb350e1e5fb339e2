use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

pub mod claim_types {
    /// Unique identifier of the principal.
    pub const SUBJECT: &str = "sub";
    pub const FAMILY_NAME: &str = "family_name";
    pub const GIVEN_NAME: &str = "given_name";
    pub const BIRTHDATE: &str = "birthdate";
    pub const EMAIL: &str = "email";
    pub const HOME_PHONE: &str = "home_phone";
    pub const MOBILE_PHONE: &str = "mobile_phone";
    pub const OTHER_PHONE: &str = "other_phone";
}

pub mod scopes {
    pub const PROFILE: &str = "profile";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// The authenticated principal carried by a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    claims: Vec<Claim>,
}

impl Principal {
    pub fn new(claims: Vec<Claim>) -> Self {
        Self { claims }
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    pub fn add_claim(&mut self, claim_type: impl Into<String>, value: impl Into<String>) {
        self.claims.push(Claim::new(claim_type, value));
    }

    /// First non-empty value of the given claim type.
    pub fn claim(&self, claim_type: &str) -> Option<&str> {
        self.claims
            .iter()
            .filter(|c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
            .find(|v| !v.is_empty())
    }
}

/// Deserialized access token: who it was issued for, what it grants and until when.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ticket {
    pub principal: Principal,
    pub scopes: BTreeSet<String>,
    /// Authorized parties (clients) the token was issued to.
    pub presenters: BTreeSet<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            ..Default::default()
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    pub fn with_presenters<I, S>(mut self, presenters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.presenters
            .extend(presenters.into_iter().map(Into::into));
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// Strictly before `now`; a ticket expiring exactly now is still valid.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}
