//! Hook error types.

/// Error type hook handlers may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for hook dispatch.
pub type HookResult<T> = Result<T, HookError>;

/// Errors from hook registration and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Event name does not follow `on<Event>[_<suffix>]`.
    #[error("invalid event name `{0}`: expected on<Event>[_<suffix>]")]
    InvalidEventName(String),

    /// A handler failed. Handler failures are bugs in a subscriber, not
    /// "no result", so they are never swallowed.
    #[error("hook {event} registered by {owner} failed: {source}")]
    Handler {
        event: String,
        owner: String,
        #[source]
        source: BoxError,
    },
}

impl HookError {
    /// Event the error escaped from, if any.
    #[must_use]
    pub fn event(&self) -> &str {
        match self {
            Self::InvalidEventName(event) | Self::Handler { event, .. } => event,
        }
    }
}
