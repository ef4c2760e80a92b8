//! Layered content lookup for quire.
//!
//! This crate provides a [`ContentBackend`] trait for abstracting where content
//! files live, and a [`ContentProvider`] that merges any number of backends into
//! one deterministic view. This enables:
//!
//! - **Overrides**: a site's content directory shadows bundled defaults
//! - **Namespaces**: `@blog/...` trees served from their own backends, with an
//!   unscoped `~blog/...` fallback
//! - **Cheap invalidation**: per-path change fingerprints for cache keys
//!
//! # Architecture
//!
//! The crate provides:
//! - [`ContentBackend`] trait with `files()`, `directories()`, and `hash()`
//! - [`ContentProvider`] merging backends in reverse registration order
//! - [`MemoryBackend`] for embedded bundles and tests
//! - [`PathPattern`] glob compilation with `**` and `{a,b}` support, shared by
//!   backend implementations
//!
//! The filesystem backend lives in `quire-content-fs`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use quire_content::{ContentProvider, MemoryBackend};
//!
//! let mut provider = ContentProvider::new();
//! provider.add_backend(Arc::new(MemoryBackend::new("defaults").with_file("/index.md", "a")), None);
//! provider.add_backend(Arc::new(MemoryBackend::new("site").with_file("/index.md", "b")), None);
//!
//! let files = provider.files("/index.*", None)?;
//! assert_eq!(files[0].read_to_string()?, "b");
//! # Ok::<(), quire_content::ContentError>(())
//! ```

mod backend;
mod error;
mod file;
mod fingerprint;
mod memory;
mod pattern;
mod provider;

pub use backend::ContentBackend;
pub use error::{ContentError, ContentErrorKind};
pub use file::{ContentDirectory, ContentFile, FileSource};
pub use fingerprint::Fingerprint;
pub use memory::MemoryBackend;
pub use pattern::{PathPattern, Segment, expand_braces};
pub use provider::ContentProvider;
