//! The userinfo request pipeline.
//!
//! ```text
//! extract → [extract hook] → locate token → [validate hook] → resolve ticket
//!   → assemble claims → [handle hook] → check `sub` → [apply hook] → send
//! ```
//!
//! Every hook result goes through `settle`, so Handled / Skipped / Rejected behave
//! the same way at each stage. Every error, from a stage or a hook, ends up in one
//! error `UserinfoResponse` that is emitted like a success.
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::claims;
use super::context::{ApplyContext, ExtractContext, ValidateContext};
use super::error::{OidcError, PipelineError, codes};
use super::exchange::UserinfoExchange;
use super::outcome::{HookFlow, HookOutcome};
use super::provider::UserinfoProvider;
use super::request;
use super::response::UserinfoResponse;
use super::token::{self, AccessTokenFormat, Clock, SystemClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Extract,
    LocateToken,
    Validate,
    ResolveTicket,
    Handle,
    Finalize,
    Apply,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::LocateToken => "locate_token",
            Stage::Validate => "validate",
            Stage::ResolveTicket => "resolve_ticket",
            Stage::Handle => "handle",
            Stage::Finalize => "finalize",
            Stage::Apply => "apply",
        }
    }
}

/// How the request stages ended.
enum Exit {
    /// Emit this response (success or error) through the apply stage.
    Respond(UserinfoResponse),
    /// A hook stopped the pipeline; `true` when the request counts as handled.
    Stop(bool),
}

#[derive(Clone)]
pub struct UserinfoEndpoint {
    issuer: String,
    provider: Arc<dyn UserinfoProvider>,
    tokens: Arc<dyn AccessTokenFormat>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for UserinfoEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserinfoEndpoint")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl UserinfoEndpoint {
    pub fn new(
        issuer: impl Into<String>,
        provider: Arc<dyn UserinfoProvider>,
        tokens: Arc<dyn AccessTokenFormat>,
    ) -> Self {
        Self {
            issuer: issuer.into(),
            provider,
            tokens,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Run the pipeline for one request.
    ///
    /// Returns:
    /// - `Ok(true)`  => a response was produced (success or error), or a hook handled it
    /// - `Ok(false)` => a hook skipped the request; the caller should route it elsewhere
    /// - `Err(_)`    => fatal failure, nothing was sent
    pub async fn handle_userinfo_request(
        &self,
        exchange: &mut UserinfoExchange,
    ) -> Result<bool, PipelineError> {
        match self.run_stages(exchange).await? {
            Exit::Respond(response) => self.emit(exchange, response).await,
            Exit::Stop(handled) => Ok(handled),
        }
    }

    async fn run_stages(&self, exchange: &mut UserinfoExchange) -> Result<Exit, PipelineError> {
        let request = match request::extract(exchange.transport()) {
            Ok(request) => request,
            Err(err) => return Ok(rejected(Stage::Extract, err)),
        };
        exchange.set_request(request.clone());

        let mut ctx = ExtractContext::new(request);
        let outcome = self.provider.extract_userinfo_request(&mut ctx).await;
        if let ControlFlow::Break(exit) =
            settle(Stage::Extract, exchange, outcome, &mut ctx.response)?
        {
            return Ok(exit);
        }
        let request = ctx.request;
        exchange.set_request(request.clone());

        let access_token = match token::locate(&request, &exchange.transport().headers) {
            Ok(token) => token,
            Err(err) => return Ok(rejected(Stage::LocateToken, err)),
        };

        let mut ctx = ValidateContext::new(request, access_token);
        let outcome = self.provider.validate_userinfo_request(&mut ctx).await;
        if let ControlFlow::Break(exit) =
            settle(Stage::Validate, exchange, outcome, &mut ctx.response)?
        {
            return Ok(exit);
        }
        let ValidateContext {
            request,
            access_token,
            ..
        } = ctx;

        let ticket = match self
            .tokens
            .deserialize_access_token(&access_token, &request)
            .await?
        {
            Some(ticket) => ticket,
            None => {
                return Ok(rejected(
                    Stage::ResolveTicket,
                    OidcError::invalid_grant("Invalid token."),
                ));
            }
        };

        if ticket.is_expired(self.clock.now()) {
            return Ok(rejected(
                Stage::ResolveTicket,
                OidcError::invalid_grant("Expired token."),
            ));
        }

        let mut ctx = claims::assemble(request, ticket, &self.issuer);
        let outcome = self.provider.handle_userinfo_request(&mut ctx).await;
        if let ControlFlow::Break(exit) =
            settle(Stage::Handle, exchange, outcome, &mut ctx.response)?
        {
            return Ok(exit);
        }

        match claims::finalize(ctx) {
            Ok(body) => Ok(Exit::Respond(UserinfoResponse::claims(body))),
            Err(err) => Ok(rejected(Stage::Finalize, err)),
        }
    }

    async fn emit(
        &self,
        exchange: &mut UserinfoExchange,
        response: UserinfoResponse,
    ) -> Result<bool, PipelineError> {
        exchange.set_response(response.clone());

        let mut ctx = ApplyContext::new(exchange.request().cloned(), response.clone());
        let outcome = self.provider.apply_userinfo_response(&mut ctx).await;

        match settle(Stage::Apply, exchange, outcome, &mut ctx.response)? {
            ControlFlow::Continue(()) => {
                // A hook that cleared the response gets the published one.
                exchange.send(ctx.response.unwrap_or(response))?;
                Ok(true)
            }
            ControlFlow::Break(Exit::Stop(handled)) => Ok(handled),
            // Sent as-is: running the apply hook again could loop.
            ControlFlow::Break(Exit::Respond(error)) => {
                exchange.set_response(error.clone());
                exchange.send(error)?;
                Ok(true)
            }
        }
    }
}

/// Apply a hook outcome.
///
/// On Handled, whatever the hook left in `response` is written to the transport.
fn settle(
    stage: Stage,
    exchange: &mut UserinfoExchange,
    outcome: HookOutcome,
    response: &mut Option<UserinfoResponse>,
) -> Result<ControlFlow<Exit>, PipelineError> {
    match HookFlow::from(outcome) {
        HookFlow::Proceed => Ok(ControlFlow::Continue(())),
        HookFlow::Stop(handled) => {
            debug!(stage = stage.as_str(), handled, "userinfo pipeline stopped by provider");
            if let (true, Some(response)) = (handled, response.take()) {
                exchange.send(response)?;
            }
            Ok(ControlFlow::Break(Exit::Stop(handled)))
        }
        HookFlow::Reject(err) => Ok(ControlFlow::Break(rejected(stage, err))),
    }
}

fn rejected(stage: Stage, err: OidcError) -> Exit {
    let description = err.description.as_deref().unwrap_or_default();
    if err.code == codes::SERVER_ERROR {
        warn!(
            stage = stage.as_str(),
            error = %err.code,
            description,
            "userinfo request failed"
        );
    } else {
        info!(
            stage = stage.as_str(),
            error = %err.code,
            description,
            "userinfo request rejected"
        );
    }
    Exit::Respond(UserinfoResponse::from(err))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
    use chrono::Duration;
    use serde_json::json;

    use super::*;
    use crate::services::userinfo::DefaultUserinfoProvider;
    use crate::services::userinfo::context::HandleContext;
    use crate::services::userinfo::request::TransportRequest;
    use crate::services::userinfo::testing::{self, FailingTokens, StaticTokens};
    use crate::services::userinfo::ticket::Ticket;

    fn bearer_get(token: &str) -> UserinfoExchange {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        UserinfoExchange::new(TransportRequest {
            method: Method::GET,
            headers,
            query: None,
            body: Bytes::new(),
        })
    }

    async fn run(
        endpoint: &UserinfoEndpoint,
        mut exchange: UserinfoExchange,
    ) -> (bool, Option<UserinfoResponse>) {
        let handled = endpoint.handle_userinfo_request(&mut exchange).await.unwrap();
        (handled, exchange.into_sent())
    }

    fn error_of(response: &UserinfoResponse) -> serde_json::Value {
        serde_json::to_value(response.payload()).unwrap()
    }

    #[tokio::test]
    async fn valid_token_yields_scope_gated_claims() {
        let endpoint = testing::endpoint(Arc::new(DefaultUserinfoProvider));

        let (handled, sent) = run(&endpoint, bearer_get(testing::ALICE_TOKEN)).await;

        assert!(handled);
        let sent = sent.unwrap();
        assert_eq!(sent.status(), StatusCode::OK);
        assert_eq!(
            serde_json::to_value(sent.payload()).unwrap(),
            json!({
                "sub": "alice",
                "iss": testing::ISSUER,
                "aud": "client-a",
                "email": "alice@example.com",
            })
        );
    }

    #[tokio::test]
    async fn unknown_token_is_invalid_grant() {
        let endpoint = testing::endpoint(Arc::new(DefaultUserinfoProvider));

        let (handled, sent) = run(&endpoint, bearer_get("nope")).await;

        assert!(handled);
        let sent = sent.unwrap();
        assert_eq!(sent.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_of(&sent),
            json!({ "error": "invalid_grant", "error_description": "Invalid token." })
        );
    }

    #[tokio::test]
    async fn expired_token_is_invalid_grant() {
        let expired = Ticket::new(testing::alice().principal)
            .with_expiry(testing::now() - Duration::seconds(1));
        let tokens = StaticTokens::default().with("old", expired);
        let endpoint = UserinfoEndpoint::new(
            testing::ISSUER,
            Arc::new(DefaultUserinfoProvider),
            Arc::new(tokens),
        )
        .with_clock(Arc::new(testing::FixedClock(testing::now())));

        let (_, sent) = run(&endpoint, bearer_get("old")).await;

        assert_eq!(
            error_of(&sent.unwrap()),
            json!({ "error": "invalid_grant", "error_description": "Expired token." })
        );
    }

    #[tokio::test]
    async fn missing_token_is_invalid_request() {
        let endpoint = testing::endpoint(Arc::new(DefaultUserinfoProvider));
        let exchange = UserinfoExchange::new(TransportRequest {
            method: Method::GET,
            ..Default::default()
        });

        let (handled, sent) = run(&endpoint, exchange).await;

        assert!(handled);
        assert_eq!(sent.unwrap().error_code(), Some(codes::INVALID_REQUEST));
    }

    #[tokio::test]
    async fn token_backend_failure_is_fatal_and_sends_nothing() {
        let endpoint = UserinfoEndpoint::new(
            testing::ISSUER,
            Arc::new(DefaultUserinfoProvider),
            Arc::new(FailingTokens),
        );
        let mut exchange = bearer_get("anything");

        let err = endpoint
            .handle_userinfo_request(&mut exchange)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::TokenFormat(_)));
        assert!(exchange.sent().is_none());
    }

    struct SkipOnHandle;

    #[async_trait]
    impl UserinfoProvider for SkipOnHandle {
        async fn handle_userinfo_request(&self, _ctx: &mut HandleContext) -> HookOutcome {
            HookOutcome::Skipped
        }
    }

    #[tokio::test]
    async fn skipped_handle_hook_returns_false_without_payload() {
        let endpoint = testing::endpoint(Arc::new(SkipOnHandle));

        let (handled, sent) = run(&endpoint, bearer_get(testing::ALICE_TOKEN)).await;

        assert!(!handled);
        assert!(sent.is_none());
    }

    struct ClearSubject;

    #[async_trait]
    impl UserinfoProvider for ClearSubject {
        async fn handle_userinfo_request(&self, ctx: &mut HandleContext) -> HookOutcome {
            ctx.subject.clear();
            HookOutcome::Continue
        }
    }

    #[tokio::test]
    async fn clearing_the_subject_is_a_server_error() {
        let endpoint = testing::endpoint(Arc::new(ClearSubject));

        let (handled, sent) = run(&endpoint, bearer_get(testing::ALICE_TOKEN)).await;

        assert!(handled);
        let sent = sent.unwrap();
        assert_eq!(sent.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            error_of(&sent),
            json!({
                "error": "server_error",
                "error_description": "The mandatory 'sub' claim was missing.",
            })
        );
        assert!(sent.claim("sub").is_none());
    }

    struct AddLocale;

    #[async_trait]
    impl UserinfoProvider for AddLocale {
        async fn handle_userinfo_request(&self, ctx: &mut HandleContext) -> HookOutcome {
            ctx.claims.insert("locale".to_string(), json!("en-GB"));
            ctx.claims.remove("email");
            ctx.audiences.clear();
            HookOutcome::Continue
        }
    }

    #[tokio::test]
    async fn handle_hook_edits_reach_the_body() {
        let endpoint = testing::endpoint(Arc::new(AddLocale));

        let (_, sent) = run(&endpoint, bearer_get(testing::ALICE_TOKEN)).await;

        assert_eq!(
            serde_json::to_value(sent.unwrap().payload()).unwrap(),
            json!({ "sub": "alice", "iss": testing::ISSUER, "locale": "en-GB" })
        );
    }

    struct RejectOnExtract;

    #[async_trait]
    impl UserinfoProvider for RejectOnExtract {
        async fn extract_userinfo_request(&self, _ctx: &mut ExtractContext) -> HookOutcome {
            HookOutcome::Rejected {
                error: None,
                description: Some("Requests from this network are refused.".to_string()),
                uri: None,
            }
        }
    }

    #[tokio::test]
    async fn extract_hook_rejection_defaults_to_invalid_request() {
        let endpoint = testing::endpoint(Arc::new(RejectOnExtract));

        let (handled, sent) = run(&endpoint, bearer_get(testing::ALICE_TOKEN)).await;

        assert!(handled);
        assert_eq!(
            error_of(&sent.unwrap()),
            json!({
                "error": "invalid_request",
                "error_description": "Requests from this network are refused.",
            })
        );
    }

    struct SwapToken;

    #[async_trait]
    impl UserinfoProvider for SwapToken {
        async fn validate_userinfo_request(&self, ctx: &mut ValidateContext) -> HookOutcome {
            if ctx.access_token == "legacy" {
                ctx.access_token = testing::ALICE_TOKEN.to_string();
                return HookOutcome::Continue;
            }
            HookOutcome::reject("invalid_token", "Only legacy tokens are accepted here.")
        }
    }

    #[tokio::test]
    async fn validate_hook_can_rewrite_the_token_or_reject() {
        let endpoint = testing::endpoint(Arc::new(SwapToken));

        let (_, sent) = run(&endpoint, bearer_get("legacy")).await;
        assert_eq!(sent.unwrap().claim("sub"), Some(&json!("alice")));

        let (_, sent) = run(&endpoint, bearer_get(testing::ALICE_TOKEN)).await;
        assert_eq!(sent.unwrap().error_code(), Some("invalid_token"));
    }

    struct HandleItself;

    #[async_trait]
    impl UserinfoProvider for HandleItself {
        async fn handle_userinfo_request(&self, ctx: &mut HandleContext) -> HookOutcome {
            let mut body = serde_json::Map::new();
            body.insert("sub".to_string(), json!(ctx.subject.to_uppercase()));
            ctx.response = Some(UserinfoResponse::claims(body));
            HookOutcome::Handled
        }

        async fn apply_userinfo_response(&self, _ctx: &mut ApplyContext) -> HookOutcome {
            panic!("apply hook must not run after a handled response");
        }
    }

    #[tokio::test]
    async fn handled_hook_writes_its_own_response_and_stops() {
        let endpoint = testing::endpoint(Arc::new(HandleItself));

        let (handled, sent) = run(&endpoint, bearer_get(testing::ALICE_TOKEN)).await;

        assert!(handled);
        assert_eq!(sent.unwrap().claim("sub"), Some(&json!("ALICE")));
    }

    #[derive(Default)]
    struct RecordApply {
        seen: Mutex<Vec<(Option<String>, StatusCode)>>,
    }

    #[async_trait]
    impl UserinfoProvider for RecordApply {
        async fn apply_userinfo_response(&self, ctx: &mut ApplyContext) -> HookOutcome {
            let message_type = ctx
                .request
                .as_ref()
                .and_then(|r| r.message_type())
                .map(str::to_string);
            let status = ctx.response.as_ref().map(|r| r.status()).unwrap_or_default();
            self.seen.lock().unwrap().push((message_type, status));
            HookOutcome::Continue
        }
    }

    #[tokio::test]
    async fn apply_hook_sees_both_success_and_error_responses() {
        let provider = Arc::new(RecordApply::default());
        let endpoint = testing::endpoint(provider.clone());

        run(&endpoint, bearer_get(testing::ALICE_TOKEN)).await;
        run(&endpoint, bearer_get("unknown")).await;
        run(
            &endpoint,
            UserinfoExchange::new(TransportRequest {
                method: Method::DELETE,
                ..Default::default()
            }),
        )
        .await;

        let seen = provider.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                (Some("userinfo".to_string()), StatusCode::OK),
                (Some("userinfo".to_string()), StatusCode::BAD_REQUEST),
                (None, StatusCode::BAD_REQUEST),
            ]
        );
    }

    struct RejectOnApply;

    #[async_trait]
    impl UserinfoProvider for RejectOnApply {
        async fn apply_userinfo_response(&self, _ctx: &mut ApplyContext) -> HookOutcome {
            HookOutcome::reject("access_denied", "Response withheld.")
        }
    }

    #[tokio::test]
    async fn apply_hook_rejection_replaces_the_response_once() {
        let endpoint = testing::endpoint(Arc::new(RejectOnApply));
        let mut exchange = bearer_get(testing::ALICE_TOKEN);

        let handled = endpoint
            .handle_userinfo_request(&mut exchange)
            .await
            .unwrap();

        assert!(handled);
        assert_eq!(
            exchange.response().and_then(UserinfoResponse::error_code),
            Some("access_denied")
        );
        assert_eq!(exchange.response(), exchange.sent());
        let sent = exchange.into_sent().unwrap();
        assert_eq!(sent.error_code(), Some("access_denied"));
        assert!(sent.claim("sub").is_none());
    }

    struct SkipOnApply;

    #[async_trait]
    impl UserinfoProvider for SkipOnApply {
        async fn apply_userinfo_response(&self, _ctx: &mut ApplyContext) -> HookOutcome {
            HookOutcome::Skipped
        }
    }

    #[tokio::test]
    async fn skipped_apply_hook_sends_nothing() {
        let endpoint = testing::endpoint(Arc::new(SkipOnApply));

        let (handled, sent) = run(&endpoint, bearer_get(testing::ALICE_TOKEN)).await;

        assert!(!handled);
        assert!(sent.is_none());
    }
}
