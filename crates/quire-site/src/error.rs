//! Pipeline error type.

use quire_content::ContentError;
use quire_hooks::HookError;
use quire_url::{Url, UrlError};

/// Error returned by the resolution pipeline.
///
/// Boundary entry points on [`Session`](crate::Session) degrade `Url` and
/// `Content` errors to "not found"; `Hook` errors (a subscriber bug) always
/// propagate.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// A hook handler failed.
    #[error(transparent)]
    Hook(#[from] HookError),
    /// Content lookup failed.
    #[error(transparent)]
    Content(#[from] ContentError),
    /// Input could not be parsed as a URL.
    #[error(transparent)]
    Url(#[from] UrlError),
    /// Page resolution kept re-entering the same URL.
    #[error("resolution cycle at {0}")]
    Cycle(Url),
    /// Lazy content failed on an earlier read.
    #[error("content of {url} failed to render: {message}")]
    Render { url: String, message: String },
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SiteError {
    /// HTTP-style status for the error page this error is shown with.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Url(_) | Self::Content(_) => 404,
            Self::Cycle(_) => 508,
            Self::Hook(_) | Self::Render { .. } | Self::Io(_) => 500,
        }
    }
}
