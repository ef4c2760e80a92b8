//! Keyed cache for quire.
//!
//! Two traits decouple cache consumers from storage:
//!
//! - [`Cache`]: factory for named cache buckets
//! - [`CacheBucket`]: key-value store with etag validation
//!
//! Entries carry an optional time-to-live set on the cache. An expired entry
//! is a miss, exactly like an etag mismatch.
//!
//! # Implementations
//!
//! - [`NullCache`] / [`NullCacheBucket`]: no-op (always miss)
//! - [`MemoryCache`]: process-local map, shared across bucket handles
//! - [`FileCache`]: one file per entry with version validation
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use quire_cache::{Cache, MemoryCache};
//!
//! let cache = MemoryCache::new().with_ttl(Duration::from_secs(3600));
//! let bucket = cache.bucket("pages");
//! bucket.set("index", "v1", b"<h1>Home</h1>");
//!
//! assert_eq!(bucket.get("index", "v1").as_deref(), Some(&b"<h1>Home</h1>"[..]));
//! assert_eq!(bucket.get("index", "v2"), None);
//! ```

mod expiry;
mod ext;
mod file;
mod memory;

pub use ext::CacheBucketExt;
pub use file::FileCache;
pub use memory::MemoryCache;

/// A named partition within a [`Cache`].
///
/// A hit requires the key to exist, the stored etag to equal `etag`, and the
/// entry not to have expired. The etag is opaque to the cache (a content
/// fingerprint, a version string, ...).
pub trait CacheBucket: Send + Sync {
    /// Retrieve a cached value.
    ///
    /// An empty `etag` skips etag validation; expiry is still enforced.
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>>;

    /// Store a value, replacing any existing entry for `key`.
    ///
    /// Failures are logged and otherwise ignored; the cache is optional.
    fn set(&self, key: &str, etag: &str, value: &[u8]);
}

/// Factory for named, isolated [`CacheBucket`]s.
pub trait Cache: Send + Sync {
    /// Open or create a named bucket (e.g. `"pages"`).
    ///
    /// Handles for the same name share storage.
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// [`CacheBucket`] that never stores anything.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str, _etag: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _etag: &str, _value: &[u8]) {}
}

/// [`Cache`] used when caching is disabled.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_cache_always_misses() {
        let bucket = NullCache.bucket("pages");

        assert_eq!(bucket.get("key", "etag1"), None);
        bucket.set("key", "etag1", b"hello");
        assert_eq!(bucket.get("key", "etag1"), None);
        assert_eq!(bucket.get("key", ""), None);
    }
}
