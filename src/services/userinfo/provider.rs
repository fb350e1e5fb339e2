use async_trait::async_trait;

use super::context::{ApplyContext, ExtractContext, HandleContext, ValidateContext};
use super::outcome::HookOutcome;

/// Override points of the userinfo pipeline.
///
/// Every method defaults to `HookOutcome::Continue`, so an implementation only
/// overrides the stages it cares about.
#[async_trait]
pub trait UserinfoProvider: Send + Sync {
    async fn extract_userinfo_request(&self, _ctx: &mut ExtractContext) -> HookOutcome {
        HookOutcome::Continue
    }

    async fn validate_userinfo_request(&self, _ctx: &mut ValidateContext) -> HookOutcome {
        HookOutcome::Continue
    }

    async fn handle_userinfo_request(&self, _ctx: &mut HandleContext) -> HookOutcome {
        HookOutcome::Continue
    }

    async fn apply_userinfo_response(&self, _ctx: &mut ApplyContext) -> HookOutcome {
        HookOutcome::Continue
    }
}

/// Provider that never intervenes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUserinfoProvider;

impl UserinfoProvider for DefaultUserinfoProvider {}
