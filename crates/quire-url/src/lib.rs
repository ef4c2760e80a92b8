//! Context-relative URL model for quire.
//!
//! This crate provides:
//! - [`Url`]: an immutable-by-convention URL value with a normalized, decoded path
//!   and a key-sorted query map
//! - [`UrlFactory`]: the per-request stack of "site" and "context" URLs used to
//!   expand relative references (`@/`, `@ctx/`, `/foo`, `foo`) before parsing
//!
//! # Relative references
//!
//! | Input | Expands against |
//! |---|---|
//! | `https://host/x` | nothing (already absolute) |
//! | `@/foo` | current site base |
//! | `@ctx/foo` | directory of the current context |
//! | `@blog/foo` | current site base (namespace segment kept) |
//! | `/foo` | origin of the current site |
//! | `foo`, `../foo` | current context (RFC 3986 reference resolution) |
//!
//! # Example
//!
//! ```
//! use quire_url::{Url, UrlFactory};
//!
//! let site: Url = "https://ex.com/docs/".parse()?;
//! let mut factory = UrlFactory::new();
//! factory.begin_site(site);
//!
//! let url = factory.parse("@/guide/index.html")?;
//! assert_eq!(url.to_string(), "https://ex.com/docs/guide/");
//! assert_eq!(factory.site_full_path(&url).as_deref(), Some("guide/"));
//!
//! factory.end_site();
//! # Ok::<(), quire_url::UrlError>(())
//! ```

mod factory;
mod model;
mod path;

pub use factory::{ContextScope, SiteScope, UrlFactory};
pub use model::Url;
pub use path::normalize_path;

/// Error returned when a URL cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    /// Generic or scheme-specific parsing failed.
    #[error("Malformed URL {input:?}: {reason}")]
    Malformed {
        /// Input as given by the caller.
        input: String,
        /// Parser explanation.
        reason: String,
    },
    /// A relative reference was parsed with no site on the stack.
    #[error("No site available to resolve relative URL {0:?}")]
    NoSite(String),
}

impl UrlError {
    pub(crate) fn malformed(input: &str, reason: impl std::fmt::Display) -> Self {
        Self::Malformed {
            input: input.to_owned(),
            reason: reason.to_string(),
        }
    }
}
