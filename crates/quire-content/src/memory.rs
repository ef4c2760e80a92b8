//! In-memory content backend.
//!
//! [`MemoryBackend`] serves files held in memory: content bundled into the
//! binary (built-in defaults) or fixtures in tests. Each write stamps the file
//! with a fresh version from a process-wide counter, which stands in for the
//! modification time in [`hash`](ContentBackend::hash).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::{ContentBackend, ContentDirectory, ContentError, ContentFile, Fingerprint, PathPattern};

/// Process-wide write counter.
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone)]
struct Entry {
    bytes: Arc<[u8]>,
    version: u64,
}

/// Content backend backed by an in-memory map of content path to bytes.
///
/// # Example
///
/// ```
/// use quire_content::{ContentBackend, MemoryBackend};
///
/// let bundle = MemoryBackend::new("defaults")
///     .with_file("/_error/index.html", "<h1>Error</h1>")
///     .with_file("/theme/site.css", "body { margin: 0 }");
///
/// let files = bundle.files("/**/*.css")?;
/// assert_eq!(files[0].url_path(), "/theme/site.css");
/// # Ok::<(), quire_content::ContentError>(())
/// ```
#[derive(Debug)]
pub struct MemoryBackend {
    name: String,
    entries: RwLock<BTreeMap<String, Entry>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: format!("Memory({name})"),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Add a file, builder style.
    #[must_use]
    pub fn with_file(self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.insert(path, content);
        self
    }

    /// Add or replace a file. Replacing counts as a modification.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, path: &str, content: impl AsRef<[u8]>) {
        let entry = Entry {
            bytes: Arc::from(content.as_ref()),
            version: NEXT_VERSION.fetch_add(1, Ordering::Relaxed),
        };
        self.entries
            .write()
            .unwrap()
            .insert(clean_path(path), entry);
    }

    /// Remove a file, returning whether it existed.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn remove(&self, path: &str) -> bool {
        self.entries
            .write()
            .unwrap()
            .remove(&clean_path(path))
            .is_some()
    }

    /// Every directory implied by the stored file paths, as `/a/b/`.
    fn directory_set(entries: &BTreeMap<String, Entry>) -> BTreeSet<String> {
        let mut dirs = BTreeSet::new();
        dirs.insert("/".to_owned());
        for path in entries.keys() {
            let mut end = 0;
            while let Some(idx) = path[end + 1..].find('/') {
                end += idx + 1;
                dirs.insert(format!("{}/", &path[..end]));
            }
        }
        dirs
    }
}

impl ContentBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn files(&self, pattern: &str) -> Result<Vec<ContentFile>, ContentError> {
        let compiled =
            PathPattern::compile(pattern).map_err(|e| e.with_backend(self.name.clone()))?;
        let entries = self.entries.read().unwrap();

        Ok(compiled
            .iter()
            .flat_map(|p| {
                entries
                    .iter()
                    .filter(|(path, _)| p.matches(path))
                    .map(|(path, entry)| ContentFile::embedded(Arc::clone(&entry.bytes), path.clone()))
            })
            .collect())
    }

    fn directories(&self, pattern: &str) -> Result<Vec<ContentDirectory>, ContentError> {
        let compiled =
            PathPattern::compile(pattern).map_err(|e| e.with_backend(self.name.clone()))?;
        let dirs = Self::directory_set(&self.entries.read().unwrap());

        Ok(compiled
            .iter()
            .flat_map(|p| {
                dirs.iter()
                    .filter(|dir| p.matches(dir))
                    .map(ContentDirectory::virtual_dir)
            })
            .collect())
    }

    fn hash(&self, path: &str) -> Result<String, ContentError> {
        let target = clean_path(path);
        if target.split('/').any(|s| s == "..") {
            return Err(ContentError::invalid_path(path).with_backend(self.name.clone()));
        }
        let subtree = format!("{}/", target.trim_end_matches('/'));
        let ancestors = ancestor_dirs(&target);

        let mut fingerprint = Fingerprint::new();
        for (file, entry) in self.entries.read().unwrap().iter() {
            let parent = &file[..=file.rfind('/').unwrap_or(0)];
            let covered = *file == target
                || file.starts_with(&subtree)
                || ancestors.iter().any(|a| a == parent);
            if covered {
                fingerprint.update(file);
                fingerprint.update(entry.version.to_le_bytes());
            }
        }
        Ok(fingerprint.finish())
    }
}

/// `a//b/` → `/a/b`; the root stays `/`.
fn clean_path(path: &str) -> String {
    let joined = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

/// `/a/b/c` → `["/", "/a/", "/a/b/"]` (the target's own directory is covered
/// by the subtree check when it is a directory).
fn ancestor_dirs(path: &str) -> Vec<String> {
    let mut dirs = vec!["/".to_owned()];
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut current = String::from("/");
    for segment in segments.iter().take(segments.len().saturating_sub(1)) {
        current.push_str(segment);
        current.push('/');
        dirs.push(current.clone());
    }
    dirs
}
