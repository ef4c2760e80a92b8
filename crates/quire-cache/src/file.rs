//! File-based cache.
//!
//! [`FileCache`] stores one file per entry, grouped into bucket directories.
//! Each file is a header followed by the data:
//!
//! ```text
//! [expires_at: u64 LE][etag_len: u32 LE][etag bytes][data bytes]
//! ```
//!
//! `expires_at` is milliseconds since the Unix epoch, `0` for no expiry. Only
//! the header is read before deciding hit or miss.
//!
//! On construction the `VERSION` file in the cache root is checked; on a
//! mismatch or when it is missing, the whole directory is wiped and recreated.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::expiry::{expires_at, is_expired};
use crate::{Cache, CacheBucket};

/// File-based [`Cache`] rooted at a directory on disk.
///
/// ```text
/// {root}/
/// +-- VERSION
/// +-- pages/
///     +-- 3f2a...      # entry keyed by fingerprint
/// ```
pub struct FileCache {
    root: PathBuf,
    ttl: Option<Duration>,
}

impl FileCache {
    /// Open the cache at `root`, wiping it if it was written by another
    /// `version`. Filesystem errors are logged, never fatal.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        validate_version(&root, version);
        Self { root, ttl: None }
    }

    /// Expire entries `ttl` after they are written.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(FileCacheBucket {
            dir: self.root.join(name),
            ttl: self.ttl,
        })
    }
}

struct FileCacheBucket {
    dir: PathBuf,
    ttl: Option<Duration>,
}

impl FileCacheBucket {
    /// Entry path, or `None` for keys that would escape the bucket.
    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        if key.is_empty() || key.split('/').any(|s| s == ".." || s.is_empty()) {
            tracing::warn!(key, "rejected cache key");
            return None;
        }
        Some(self.dir.join(key))
    }
}

impl CacheBucket for FileCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let path = self.entry_path(key)?;
        let mut file = File::open(&path).ok()?;

        let mut expiry_buf = [0u8; 8];
        file.read_exact(&mut expiry_buf).ok()?;
        if is_expired(u64::from_le_bytes(expiry_buf)) {
            drop(file);
            let _ = fs::remove_file(&path);
            return None;
        }

        let mut len_buf = [0u8; 4];
        file.read_exact(&mut len_buf).ok()?;
        let etag_len = u32::from_le_bytes(len_buf) as usize;

        let mut stored_etag = vec![0u8; etag_len];
        file.read_exact(&mut stored_etag).ok()?;
        if !etag.is_empty() && stored_etag != etag.as_bytes() {
            return None;
        }

        let mut data = Vec::new();
        file.read_to_end(&mut data).ok()?;
        Some(data)
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        let Some(path) = self.entry_path(key) else {
            return;
        };
        let Some(parent) = path.parent() else {
            return;
        };
        if let Err(e) = fs::create_dir_all(parent) {
            tracing::warn!(key, error = %e, "failed to create cache bucket");
            return;
        }

        let etag_bytes = etag.as_bytes();
        let Ok(etag_len) = u32::try_from(etag_bytes.len()) else {
            return;
        };
        let mut buf = Vec::with_capacity(12 + etag_bytes.len() + value.len());
        buf.extend_from_slice(&expires_at(self.ttl).to_le_bytes());
        buf.extend_from_slice(&etag_len.to_le_bytes());
        buf.extend_from_slice(etag_bytes);
        buf.extend_from_slice(value);

        if let Err(e) = fs::write(&path, &buf) {
            tracing::warn!(key, error = %e, "failed to write cache entry");
        }
    }
}

/// Validate the cache version, wiping the directory on mismatch.
fn validate_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!(version, "cache version matches");
            return;
        }
        Ok(stored) => {
            tracing::info!(stored = %stored, version, "cache version mismatch, wiping cache");
        }
        Err(_) => {
            tracing::info!(root = %root.display(), "initializing cache");
        }
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!("failed to remove cache directory: {e}");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!("failed to create cache directory: {e}");
        return;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!("failed to write cache VERSION file: {e}");
    }
}
