//! Typed helpers over [`CacheBucket`].

use crate::CacheBucket;

/// String helpers for every [`CacheBucket`].
///
/// Kept off [`CacheBucket`] itself so the trait stays object-safe.
pub trait CacheBucketExt: CacheBucket {
    /// UTF-8 value; `None` on miss or invalid UTF-8.
    fn get_string(&self, key: &str, etag: &str) -> Option<String> {
        String::from_utf8(self.get(key, etag)?).ok()
    }

    fn set_string(&self, key: &str, etag: &str, value: &str) {
        self.set(key, etag, value.as_bytes());
    }

    /// Cached string for `key`, computing and storing it on a miss.
    ///
    /// # Errors
    ///
    /// Returns the error from `compute`; nothing is stored in that case.
    fn get_or_try_insert_string<E>(
        &self,
        key: &str,
        etag: &str,
        compute: impl FnOnce() -> Result<String, E>,
    ) -> Result<String, E> {
        if let Some(hit) = self.get_string(key, etag) {
            tracing::trace!(key, "cache hit");
            return Ok(hit);
        }
        let value = compute()?;
        self.set_string(key, etag, &value);
        Ok(value)
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}
