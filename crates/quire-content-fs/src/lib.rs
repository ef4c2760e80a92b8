//! Filesystem content backend for quire.
//!
//! [`FsBackend`] serves a content directory on disk through the
//! [`ContentBackend`] trait:
//!
//! - Glob lookups walk only the directories a pattern can reach
//! - Hidden entries (leading `.`) are skipped unless a segment names them
//! - Change fingerprints are built from file modification times
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use quire_content::ContentProvider;
//! use quire_content_fs::FsBackend;
//!
//! let mut provider = ContentProvider::new();
//! provider.add_backend(Arc::new(FsBackend::new("content")), None);
//!
//! for file in provider.files("/**/*.md", None)? {
//!     println!("{}", file.url_path());
//! }
//! # Ok::<(), quire_content::ContentError>(())
//! ```

mod scanner;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use quire_content::{
    ContentBackend, ContentDirectory, ContentError, ContentFile, Fingerprint, PathPattern,
};

use scanner::Match;

/// Content backend rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
    name: String,
}

impl FsBackend {
    /// Create a backend serving `root`.
    ///
    /// The directory does not need to exist; a missing root behaves as an
    /// empty backend.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = format!("Fs({})", root.display());
        Self { root, name }
    }

    /// Override the identifier used in logs and cache fingerprints.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lookup(&self, pattern: &str) -> Result<Vec<Match>, ContentError> {
        let compiled =
            PathPattern::compile(pattern).map_err(|e| e.with_backend(self.name.clone()))?;

        let mut results = Vec::new();
        if !self.root.is_dir() {
            return Ok(results);
        }
        for alternative in &compiled {
            let mut found = Vec::new();
            scanner::walk(&self.root, "", alternative.segments(), &mut found);
            found.sort_by(|a, b| a.url_path.cmp(&b.url_path));
            found.dedup_by(|a, b| a.url_path == b.url_path);
            results.extend(found);
        }
        tracing::trace!(backend = %self.name, pattern, count = results.len(), "filesystem lookup");
        Ok(results)
    }
}

impl ContentBackend for FsBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn files(&self, pattern: &str) -> Result<Vec<ContentFile>, ContentError> {
        Ok(self
            .lookup(pattern)?
            .into_iter()
            .filter(|m| !m.is_dir)
            .map(|m| ContentFile::disk(m.path, m.url_path))
            .collect())
    }

    fn directories(&self, pattern: &str) -> Result<Vec<ContentDirectory>, ContentError> {
        Ok(self
            .lookup(pattern)?
            .into_iter()
            .filter(|m| m.is_dir)
            .map(|m| ContentDirectory::disk(m.path, m.url_path))
            .collect())
    }

    fn hash(&self, path: &str) -> Result<String, ContentError> {
        let names: Vec<&str> = path
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        if names.contains(&"..") {
            return Err(ContentError::invalid_path(path).with_backend(self.name.clone()));
        }

        let mut fingerprint = Fingerprint::new();
        let mut target = self.root.clone();
        for name in &names {
            hash_own_files(&target, &mut fingerprint);
            target.push(name);
        }

        match fs::metadata(&target) {
            Ok(meta) if meta.is_dir() => {
                fingerprint.update("dir");
                let mut entries = Vec::new();
                scanner::descendants(&target, &mut entries);
                for entry in entries {
                    let relative = entry.path.strip_prefix(&target).unwrap_or(&entry.path);
                    fingerprint.update(relative.to_string_lossy().as_bytes());
                    if !entry.is_dir {
                        fingerprint.update(mtime_nanos(&entry.path).to_le_bytes());
                    }
                }
            }
            Ok(meta) => {
                fingerprint.update("file");
                fingerprint.update(modified(&meta).to_le_bytes());
            }
            Err(_) => fingerprint.update("missing"),
        }
        Ok(fingerprint.finish())
    }
}

/// Names and mtimes of the visible files directly inside `dir`.
fn hash_own_files(dir: &Path, fingerprint: &mut Fingerprint) {
    for entry in scanner::read_sorted(dir) {
        if entry.is_dir || entry.is_hidden() {
            continue;
        }
        fingerprint.update(entry.name.as_bytes());
        fingerprint.update(mtime_nanos(&entry.path).to_le_bytes());
    }
}

fn mtime_nanos(path: &Path) -> u128 {
    fs::metadata(path).map_or(0, |meta| modified(&meta))
}

fn modified(meta: &fs::Metadata) -> u128 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_nanos())
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    use pretty_assertions::assert_eq;
    use quire_content::ContentErrorKind;
    use tempfile::TempDir;

    use super::*;

    fn create_test_dir() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a/b/c/d")).unwrap();
        fs::create_dir_all(root.join("other")).unwrap();
        fs::write(root.join("index.md"), "# Home").unwrap();
        fs::write(root.join("a/index.md"), "# A").unwrap();
        fs::write(root.join("a/style.css"), "body {}").unwrap();
        fs::write(root.join("a/style.scss"), "$x: 1;").unwrap();
        fs::write(root.join("a/b/c/d/deep.md"), "# Deep").unwrap();
        fs::write(root.join("other/x.md"), "# X").unwrap();
        temp_dir
    }

    /// Push a file's mtime forward so the change is visible on coarse clocks.
    fn touch(path: &Path) {
        let later = SystemTime::now() + Duration::from_secs(60);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(later)
            .unwrap();
    }

    fn urls(files: &[ContentFile]) -> Vec<&str> {
        files.iter().map(ContentFile::url_path).collect()
    }

    #[test]
    fn test_files_sorted_within_alternative() {
        let temp_dir = create_test_dir();
        let backend = FsBackend::new(temp_dir.path());

        assert_eq!(
            urls(&backend.files("/**/*.md").unwrap()),
            vec!["/a/b/c/d/deep.md", "/a/index.md", "/index.md", "/other/x.md"]
        );
    }

    #[test]
    fn test_files_brace_order() {
        let temp_dir = create_test_dir();
        let backend = FsBackend::new(temp_dir.path());

        assert_eq!(
            urls(&backend.files("/a/style.{scss,css}").unwrap()),
            vec!["/a/style.scss", "/a/style.css"]
        );
    }

    #[test]
    fn test_files_have_disk_paths() {
        let temp_dir = create_test_dir();
        let backend = FsBackend::new(temp_dir.path());
        let files = backend.files("/index.md").unwrap();

        assert_eq!(files[0].path(), Some(temp_dir.path().join("index.md").as_path()));
        assert_eq!(files[0].read_to_string().unwrap(), "# Home");
    }

    #[test]
    fn test_directories() {
        let temp_dir = create_test_dir();
        let backend = FsBackend::new(temp_dir.path());
        let dirs = backend.directories("/a/**").unwrap();
        let paths: Vec<_> = dirs.iter().map(ContentDirectory::url_path).collect();

        assert_eq!(paths, vec!["/a/", "/a/b/", "/a/b/c/", "/a/b/c/d/"]);
    }

    #[test]
    fn test_recursive_dedup() {
        let temp_dir = create_test_dir();
        let backend = FsBackend::new(temp_dir.path());

        assert_eq!(
            urls(&backend.files("/**/**/deep.md").unwrap()),
            vec!["/a/b/c/d/deep.md"]
        );
    }

    #[test]
    fn test_missing_root_is_empty() {
        let backend = FsBackend::new("/nonexistent/quire/content");

        assert!(backend.files("/**/*").unwrap().is_empty());
        assert!(backend.directories("/").unwrap().is_empty());
        assert!(backend.hash("/").is_ok());
    }

    #[test]
    fn test_rejects_traversal() {
        let temp_dir = create_test_dir();
        let backend = FsBackend::new(temp_dir.path().join("a"));

        let err = backend.files("/../*.md").unwrap_err();
        assert_eq!(err.kind(), ContentErrorKind::InvalidPath);
        assert!(backend.hash("/b/../..").is_err());
    }

    #[test]
    fn test_hash_deterministic() {
        let temp_dir = create_test_dir();
        let backend = FsBackend::new(temp_dir.path());

        assert_eq!(backend.hash("/a/b").unwrap(), backend.hash("/a/b").unwrap());
    }

    #[test]
    fn test_hash_descendant_change() {
        let temp_dir = create_test_dir();
        let backend = FsBackend::new(temp_dir.path());
        let before = backend.hash("/a/b").unwrap();

        touch(&temp_dir.path().join("a/b/c/d/deep.md"));

        assert_ne!(before, backend.hash("/a/b").unwrap());
    }

    #[test]
    fn test_hash_ancestor_change() {
        let temp_dir = create_test_dir();
        let backend = FsBackend::new(temp_dir.path());
        let before = backend.hash("/a/b").unwrap();

        touch(&temp_dir.path().join("a/index.md"));

        assert_ne!(before, backend.hash("/a/b").unwrap());
    }

    #[test]
    fn test_hash_ignores_sibling_subtree() {
        let temp_dir = create_test_dir();
        let backend = FsBackend::new(temp_dir.path());
        let before = backend.hash("/a/b").unwrap();

        touch(&temp_dir.path().join("other/x.md"));

        assert_eq!(before, backend.hash("/a/b").unwrap());
    }

    #[test]
    fn test_hash_new_file() {
        let temp_dir = create_test_dir();
        let backend = FsBackend::new(temp_dir.path());
        let before = backend.hash("/a").unwrap();

        fs::write(temp_dir.path().join("a/b/new.md"), "new").unwrap();

        assert_ne!(before, backend.hash("/a").unwrap());
    }

    #[test]
    fn test_name() {
        let backend = FsBackend::new("docs");
        assert_eq!(backend.name(), "Fs(docs)");
        assert_eq!(backend.with_name("site").name(), "site");
    }
}
