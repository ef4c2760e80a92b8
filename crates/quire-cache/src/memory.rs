//! Process-local cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::expiry::{expires_at, is_expired};
use crate::{Cache, CacheBucket};

#[derive(Debug, Clone)]
struct Entry {
    etag: String,
    value: Vec<u8>,
    expires_at: u64,
}

type Store = Arc<Mutex<HashMap<(String, String), Entry>>>;

/// In-memory [`Cache`]; every bucket handle shares one map.
///
/// Cloning the cache shares the map as well.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    store: Store,
    ttl: Option<Duration>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expire entries `ttl` after they are written.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.lock().map_or(0, |s| s.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(MemoryCacheBucket {
            name: name.to_owned(),
            store: Arc::clone(&self.store),
            ttl: self.ttl,
        })
    }
}

struct MemoryCacheBucket {
    name: String,
    store: Store,
    ttl: Option<Duration>,
}

impl CacheBucket for MemoryCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let mut store = self.store.lock().ok()?;
        let id = (self.name.clone(), key.to_owned());
        let entry = store.get(&id)?;
        if is_expired(entry.expires_at) {
            store.remove(&id);
            return None;
        }
        if !etag.is_empty() && entry.etag != etag {
            return None;
        }
        Some(entry.value.clone())
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        let Ok(mut store) = self.store.lock() else {
            tracing::warn!(bucket = %self.name, "memory cache lock poisoned");
            return;
        };
        store.insert(
            (self.name.clone(), key.to_owned()),
            Entry {
                etag: etag.to_owned(),
                value: value.to_vec(),
                expires_at: expires_at(self.ttl),
            },
        );
    }
}
