//! The content backend trait.

use crate::{ContentDirectory, ContentError, ContentFile};

/// A source of content files and directories.
///
/// Backends answer glob lookups over content paths (see [`crate::PathPattern`])
/// and compute change fingerprints. All paths are **content paths**, not
/// filesystem paths:
///
/// - `/` - backend root
/// - `/guide/index.md` - a file
/// - `/~blog/post.md` - a file in the unscoped `~blog` fallback tree
///
/// Implementations must return results in a deterministic order for a given
/// backend state.
pub trait ContentBackend: Send + Sync {
    /// Identifier for logs and error messages (e.g. `"Fs(content)"`).
    fn name(&self) -> &str;

    /// Files matching `pattern`.
    ///
    /// Brace alternatives are returned in listed order; within one alternative,
    /// results are sorted by content path.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if the pattern is invalid or the backend cannot
    /// be read. A missing root yields an empty list, not an error.
    fn files(&self, pattern: &str) -> Result<Vec<ContentFile>, ContentError>;

    /// Directories matching `pattern`; same ordering rules as [`files`](Self::files).
    fn directories(&self, pattern: &str) -> Result<Vec<ContentDirectory>, ContentError>;

    /// Change fingerprint for `path`.
    ///
    /// Must cover `path` itself, every ancestor directory's own files (not their
    /// subdirectories), and every descendant of `path`. Must be deterministic for
    /// a given backend state and change whenever a covered file's modification
    /// time or presence changes.
    fn hash(&self, path: &str) -> Result<String, ContentError>;
}
