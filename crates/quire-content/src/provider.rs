//! Layered content lookup across registered backends.
//!
//! # Precedence
//!
//! Backends registered later take precedence: every lookup visits backends in
//! reverse registration order and concatenates their results, so the first
//! result is the most specific override (e.g. a site's content directory
//! registered after the bundled defaults).
//!
//! # Namespaces
//!
//! A lookup with a namespace `ns` visits, in order:
//!
//! 1. backends registered for `ns` (reverse registration order), with the
//!    pattern as given
//! 2. unscoped backends (reverse registration order), with the pattern rooted
//!    at `/~ns`
//!
//! Results from both are published under `/@ns/...`. A lookup with no
//! namespace visits only the unscoped backends.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{ContentBackend, ContentDirectory, ContentError, ContentFile, Fingerprint};

/// Ordered set of content backends.
#[derive(Default, Clone)]
pub struct ContentProvider {
    backends: Vec<Arc<dyn ContentBackend>>,
    namespaced: HashMap<String, Vec<Arc<dyn ContentBackend>>>,
}

impl ContentProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend, optionally scoped to a namespace.
    pub fn add_backend(&mut self, backend: Arc<dyn ContentBackend>, namespace: Option<&str>) {
        tracing::debug!(backend = backend.name(), namespace = ?namespace, "registered content backend");
        match namespace {
            Some(ns) => self
                .namespaced
                .entry(ns.to_owned())
                .or_default()
                .push(backend),
            None => self.backends.push(backend),
        }
    }

    /// Registered namespace names, sorted.
    pub fn namespaces(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.namespaced.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Files matching `pattern`, highest precedence first.
    ///
    /// # Errors
    ///
    /// Propagates the first backend error.
    pub fn files(
        &self,
        pattern: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<ContentFile>, ContentError> {
        self.collect(
            pattern,
            namespace,
            |b, p| b.files(p),
            ContentFile::with_url_path,
            ContentFile::url_path,
        )
    }

    /// Directories matching `pattern`, highest precedence first.
    pub fn directories(
        &self,
        pattern: &str,
        namespace: Option<&str>,
    ) -> Result<Vec<ContentDirectory>, ContentError> {
        self.collect(
            pattern,
            namespace,
            |b, p| b.directories(p),
            ContentDirectory::with_url_path,
            ContentDirectory::url_path,
        )
    }

    /// Change fingerprint of `path` across every backend that participates in
    /// a lookup of `path` under `namespace`.
    pub fn hash(&self, path: &str, namespace: Option<&str>) -> Result<String, ContentError> {
        let mut fingerprint = Fingerprint::new().with(namespace.unwrap_or_default());
        for (backend, backend_path) in self.plan(path, namespace) {
            fingerprint.update(backend.name());
            fingerprint.update(backend.hash(&backend_path)?);
        }
        Ok(fingerprint.finish())
    }

    /// Backends to visit and the path each one is queried with.
    fn plan(&self, path: &str, namespace: Option<&str>) -> Vec<(&Arc<dyn ContentBackend>, String)> {
        let path = rooted(path);
        match namespace {
            None => self.backends.iter().rev().map(|b| (b, path.clone())).collect(),
            Some(ns) => {
                let fallback = format!("/~{ns}{path}");
                self.namespaced
                    .get(ns)
                    .into_iter()
                    .flatten()
                    .rev()
                    .map(|b| (b, path.clone()))
                    .chain(self.backends.iter().rev().map(|b| (b, fallback.clone())))
                    .collect()
            }
        }
    }

    fn collect<T>(
        &self,
        pattern: &str,
        namespace: Option<&str>,
        query: impl Fn(&dyn ContentBackend, &str) -> Result<Vec<T>, ContentError>,
        rehome: impl Fn(T, String) -> T,
        url_path: impl Fn(&T) -> &str,
    ) -> Result<Vec<T>, ContentError> {
        let mut results = Vec::new();
        for (backend, backend_pattern) in self.plan(pattern, namespace) {
            let found = query(backend.as_ref(), &backend_pattern)?;
            tracing::trace!(
                backend = backend.name(),
                pattern = %backend_pattern,
                count = found.len(),
                "content lookup"
            );
            match namespace {
                None => results.extend(found),
                Some(ns) => results.extend(found.into_iter().map(|item| {
                    let published = publish_path(url_path(&item), ns);
                    rehome(item, published)
                })),
            }
        }
        Ok(results)
    }
}

impl std::fmt::Debug for ContentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |list: &Vec<Arc<dyn ContentBackend>>| {
            list.iter().map(|b| b.name().to_owned()).collect::<Vec<_>>()
        };
        f.debug_struct("ContentProvider")
            .field("backends", &names(&self.backends))
            .field(
                "namespaced",
                &self
                    .namespaced
                    .iter()
                    .map(|(ns, list)| (ns.clone(), names(list)))
                    .collect::<HashMap<_, _>>(),
            )
            .finish()
    }
}

fn rooted(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

/// `/x` or `/~ns/x` → `/@ns/x`.
fn publish_path(url_path: &str, ns: &str) -> String {
    let fallback_root = format!("/~{ns}");
    let rest = url_path
        .strip_prefix(&fallback_root)
        .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        .unwrap_or(url_path);
    let rest = if rest.is_empty() { "/" } else { rest };
    format!("/@{ns}{rest}")
}
