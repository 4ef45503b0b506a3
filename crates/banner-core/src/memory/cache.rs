//! In-memory cache using DashMap (stands in for Redis)

use crate::ports::BannerCache;
use crate::{Banner, Deadline, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Simple in-memory cache with TTL support
pub struct MemoryCache {
    data: Arc<DashMap<String, CacheEntry>>,
}

struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl MemoryCache {
    pub fn new() -> Self {
        let cache = Self {
            data: Arc::new(DashMap::new()),
        };

        // Sweeping needs a runtime; without one, expired entries are still
        // dropped lazily on read.
        if tokio::runtime::Handle::try_current().is_ok() {
            cache.start_cleanup_task();
        }

        cache
    }

    /// Raw bytes for a live key
    pub fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        let entry = self.data.get(key)?;
        if Instant::now() >= entry.expires_at {
            drop(entry);
            self.evict_expired(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Removes `key` only if it is still expired; a concurrent `set_raw`
    /// between the read and the removal keeps its entry.
    fn evict_expired(&self, key: &str) {
        self.data
            .remove_if(key, |_, entry| Instant::now() >= entry.expires_at);
    }

    /// Store raw bytes with a TTL, replacing any previous value
    pub fn set_raw(&self, key: String, value: Vec<u8>, ttl: Duration) {
        self.data.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn start_cleanup_task(&self) {
        let data: Weak<DashMap<String, CacheEntry>> = Arc::downgrade(&self.data);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;

                let Some(data) = data.upgrade() else {
                    break;
                };
                let now = Instant::now();
                data.retain(|_, entry| entry.expires_at > now);
            }
        });
    }

    fn decode(&self, key: &str) -> Result<Option<Banner>> {
        match self.get_raw(key) {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn encode(&self, key: &str, banner: &Banner, ttl: Duration) -> Result<()> {
        let bytes = serde_json::to_vec(banner)?;
        self.set_raw(key.to_string(), bytes, ttl);
        Ok(())
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BannerCache for MemoryCache {
    async fn get(&self, ctx: &Deadline, key: &str) -> Result<Option<Banner>> {
        ctx.run(async { self.decode(key) }).await
    }

    async fn set(&self, ctx: &Deadline, key: &str, banner: &Banner, ttl: Duration) -> Result<()> {
        ctx.run(async { self.encode(key, banner, ttl) }).await
    }
}
