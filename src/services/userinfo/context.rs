/*
 * Responsibility
 * - 各 hook に渡す stage ごとの context
 * - hook が書き換えた field だけが次の stage に引き継がれる
 *
 * Notes
 * - `response` は hook が自前で書いた応答。Handled のときだけ送信される
 *   (Apply stage では送信予定の応答が最初から入っている)
 */
use std::collections::BTreeSet;

use serde_json::{Map, Value};

use super::request::UserinfoRequest;
use super::response::UserinfoResponse;
use super::ticket::Ticket;

/// Stage 2: right after the request was normalized.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    pub request: UserinfoRequest,
    pub response: Option<UserinfoResponse>,
}

impl ExtractContext {
    pub fn new(request: UserinfoRequest) -> Self {
        Self {
            request,
            response: None,
        }
    }
}

/// Stage 4: the bearer token has been located but not resolved yet.
#[derive(Debug, Clone)]
pub struct ValidateContext {
    pub request: UserinfoRequest,
    pub access_token: String,
    pub response: Option<UserinfoResponse>,
}

impl ValidateContext {
    pub fn new(request: UserinfoRequest, access_token: String) -> Self {
        Self {
            request,
            access_token,
            response: None,
        }
    }
}

/// Stage 7: the scope-gated claim set, open for the provider to edit.
///
/// `subject`, `issuer` and `audiences` become `sub`, `iss` and `aud`; every entry of
/// `claims` is copied into the body as-is.
#[derive(Debug, Clone)]
pub struct HandleContext {
    pub request: UserinfoRequest,
    pub ticket: Ticket,
    pub subject: String,
    pub issuer: String,
    pub audiences: BTreeSet<String>,
    pub claims: Map<String, Value>,
    pub response: Option<UserinfoResponse>,
}

impl HandleContext {
    pub fn new(request: UserinfoRequest, ticket: Ticket) -> Self {
        Self {
            request,
            ticket,
            subject: String::new(),
            issuer: String::new(),
            audiences: BTreeSet::new(),
            claims: Map::new(),
            response: None,
        }
    }
}

/// Stage 9: the response about to be written.
///
/// `request` is absent when the request could not be normalized.
#[derive(Debug, Clone)]
pub struct ApplyContext {
    pub request: Option<UserinfoRequest>,
    pub response: Option<UserinfoResponse>,
}

impl ApplyContext {
    pub fn new(request: Option<UserinfoRequest>, response: UserinfoResponse) -> Self {
        Self {
            request,
            response: Some(response),
        }
    }
}
