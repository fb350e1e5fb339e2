use super::error::{OidcError, codes};

/// Result of a provider hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HookOutcome {
    /// Keep going with whatever the hook left in its context.
    #[default]
    Continue,
    /// The hook produced the response itself; nothing else runs.
    Handled,
    /// The hook declines the request so an outer router can try another handler.
    Skipped,
    /// The hook rejects the request with its own error triple.
    Rejected {
        error: Option<String>,
        description: Option<String>,
        uri: Option<String>,
    },
}

impl HookOutcome {
    pub fn reject(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Rejected {
            error: Some(error.into()),
            description: Some(description.into()),
            uri: None,
        }
    }
}

/// What the pipeline does after a hook returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HookFlow {
    Proceed,
    /// `true` when the request counts as handled.
    Stop(bool),
    Reject(OidcError),
}

impl From<HookOutcome> for HookFlow {
    fn from(outcome: HookOutcome) -> Self {
        match outcome {
            HookOutcome::Continue => Self::Proceed,
            HookOutcome::Handled => Self::Stop(true),
            HookOutcome::Skipped => Self::Stop(false),
            HookOutcome::Rejected {
                error,
                description,
                uri,
            } => Self::Reject(OidcError {
                // Same default at every stage, including validation.
                code: error
                    .filter(|code| !code.is_empty())
                    .unwrap_or_else(|| codes::INVALID_REQUEST.to_string()),
                description,
                uri,
            }),
        }
    }
}
