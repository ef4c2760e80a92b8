//! Content lookup error type.
//!
//! [`ContentError`] pairs a semantic [`ContentErrorKind`] with optional path,
//! backend and source context, so callers can branch on the kind while logs
//! still carry backend-specific detail.

use std::path::PathBuf;

/// Semantic error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Path escapes the backend root or is otherwise unusable.
    InvalidPath,
    /// Glob pattern failed to compile.
    InvalidPattern,
    /// Other/unknown error category.
    Other,
}

/// Content error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct ContentError {
    kind: ContentErrorKind,
    path: Option<PathBuf>,
    backend: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ContentError {
    /// Create a new content error.
    #[must_use]
    pub fn new(kind: ContentErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Semantic error category.
    #[must_use]
    pub fn kind(&self) -> ContentErrorKind {
        self.kind
    }

    /// Path context, if any.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    /// Backend identifier, if any.
    #[must_use]
    pub fn backend(&self) -> Option<&str> {
        self.backend.as_deref()
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(ContentErrorKind::NotFound).with_path(path)
    }

    /// Create an invalid path error.
    #[must_use]
    pub fn invalid_path(path: impl Into<PathBuf>) -> Self {
        Self::new(ContentErrorKind::InvalidPath).with_path(path)
    }

    /// Create a content error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ContentErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => ContentErrorKind::PermissionDenied,
            _ => ContentErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for ContentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = &self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            ContentErrorKind::NotFound => "Not found",
            ContentErrorKind::PermissionDenied => "Permission denied",
            ContentErrorKind::InvalidPath => "Invalid path",
            ContentErrorKind::InvalidPattern => "Invalid pattern",
            ContentErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for ContentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_content_error_new() {
        let err = ContentError::new(ContentErrorKind::NotFound);

        assert_eq!(err.kind(), ContentErrorKind::NotFound);
        assert!(err.path().is_none());
        assert!(err.backend().is_none());
    }

    #[test]
    fn test_content_error_io_kinds() {
        let not_found = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no");
        let other = std::io::Error::other("boom");

        assert_eq!(
            ContentError::io(not_found, None).kind(),
            ContentErrorKind::NotFound
        );
        assert_eq!(
            ContentError::io(denied, None).kind(),
            ContentErrorKind::PermissionDenied
        );
        let err = ContentError::io(other, Some(PathBuf::from("/x")));
        assert_eq!(err.kind(), ContentErrorKind::Other);
        assert_eq!(err.path(), Some(Path::new("/x")));
    }

    #[test]
    fn test_content_error_display_simple() {
        let err = ContentError::invalid_path("/a/../b");

        assert_eq!(err.to_string(), "Invalid path (path: /a/../b)");
    }

    #[test]
    fn test_content_error_display_full() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ContentError::new(ContentErrorKind::NotFound)
            .with_backend("Fs(content)")
            .with_path("/foo/bar")
            .with_source(io_err);

        assert_eq!(
            err.to_string(),
            "[Fs(content)] Not found: file not found (path: /foo/bar)"
        );
    }

    #[test]
    fn test_content_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ContentError>();
    }
}
