//! In-memory TTL cache for the access-token read path.
//!
//! Entries carry an absolute deadline and are evicted lazily on read. The
//! cache can only under-report (a read after expiry sees a miss and falls
//! back to the store); it never extends validity, because every TTL written
//! here is bounded by the row's own expiry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use authmux_core::{RepoResult, TokenCache};

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Process-local `TokenCache` over a concurrent map.
#[derive(Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TokenCache for MemoryCache {
    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let now = Instant::now();

        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Ok(Some(entry.value.clone()));
            }
        }

        // Expired entry: remove on read rather than holding a sweep task
        if self
            .entries
            .remove_if(key, |_, entry| entry.expires_at <= now)
            .is_some()
        {
            debug!("[OAuth] Evicted expired cache entry on read");
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl_ms: u64) -> RepoResult<()> {
        if ttl_ms == 0 {
            // Zero TTL: nothing to cache, but make sure no stale value survives
            self.entries.remove(key);
            return Ok(());
        }

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_millis(ttl_ms),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> RepoResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
