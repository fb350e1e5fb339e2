//! Scope-gated claim assembly and the final `sub` check.
use serde_json::{Map, Value};

use super::context::HandleContext;
use super::error::OidcError;
use super::request::UserinfoRequest;
use super::ticket::{Ticket, claim_types, scopes};

pub const SUBJECT: &str = "sub";
pub const ISSUER: &str = "iss";
pub const AUDIENCE: &str = "aud";
pub const PHONE_NUMBER: &str = "phone_number";

const PHONE_CLAIM_PREFERENCE: [&str; 3] = [
    claim_types::HOME_PHONE,
    claim_types::MOBILE_PHONE,
    claim_types::OTHER_PHONE,
];

/// Build the handle-stage context from a resolved ticket.
///
/// Audiences are the ticket presenters (the client calling this endpoint), not the
/// access token audience (the resource server).
pub fn assemble(request: UserinfoRequest, ticket: Ticket, issuer: &str) -> HandleContext {
    let mut ctx = HandleContext::new(request, ticket);
    let principal = &ctx.ticket.principal;

    ctx.subject = principal
        .claim(claim_types::SUBJECT)
        .unwrap_or_default()
        .to_string();
    ctx.issuer = issuer.to_string();
    ctx.audiences = ctx.ticket.presenters.clone();

    let mut claims = Map::new();

    if ctx.ticket.has_scope(scopes::PROFILE) {
        for claim_type in [
            claim_types::FAMILY_NAME,
            claim_types::GIVEN_NAME,
            claim_types::BIRTHDATE,
        ] {
            if let Some(value) = principal.claim(claim_type) {
                claims.insert(claim_type.to_string(), Value::from(value));
            }
        }
    }

    if ctx.ticket.has_scope(scopes::EMAIL) {
        if let Some(email) = principal.claim(claim_types::EMAIL) {
            claims.insert(claim_types::EMAIL.to_string(), Value::from(email));
        }
    }

    if ctx.ticket.has_scope(scopes::PHONE) {
        let phone = PHONE_CLAIM_PREFERENCE
            .iter()
            .find_map(|claim_type| principal.claim(claim_type));
        if let Some(phone) = phone {
            claims.insert(PHONE_NUMBER.to_string(), Value::from(phone));
        }
    }

    ctx.claims = claims;
    ctx
}

/// Turn the (possibly provider-edited) context into the success body.
///
/// `sub`, `iss` and `aud` come from the dedicated fields and win over same-named
/// entries in `claims`.
pub fn finalize(ctx: HandleContext) -> Result<Map<String, Value>, OidcError> {
    if ctx.subject.is_empty() {
        return Err(OidcError::server_error(
            "The mandatory 'sub' claim was missing.",
        ));
    }

    let mut body = ctx.claims;
    body.insert(SUBJECT.to_string(), Value::from(ctx.subject));

    if !ctx.issuer.is_empty() {
        body.insert(ISSUER.to_string(), Value::from(ctx.issuer));
    }

    let mut audiences: Vec<String> = ctx.audiences.into_iter().collect();
    match audiences.len() {
        0 => {
            body.remove(AUDIENCE);
        }
        1 => {
            body.insert(AUDIENCE.to_string(), Value::from(audiences.remove(0)));
        }
        _ => {
            body.insert(AUDIENCE.to_string(), Value::from(audiences));
        }
    }

    Ok(body)
}
