//! Redis banner cache

use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use banner_core::{Banner, BannerCache, BannerError, Deadline, Result};
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::info;

/// JSON-encoded banners under caller-supplied keys, expiring via `PX`.
///
/// `ConnectionManager` multiplexes one connection and reconnects on failure;
/// each call works on its own cheap clone of the handle.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> AnyResult<Self> {
        info!("Connecting to Redis...");
        let client = redis::Client::open(url).context("Invalid Redis URL")?;
        let conn = ConnectionManager::new(client)
            .await
            .context("Failed to connect to Redis")?;
        Ok(Self { conn })
    }

    async fn fetch(&self, key: &str) -> Result<Option<Banner>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn store(&self, key: &str, banner: &Banner, ttl: Duration) -> Result<()> {
        let json = serde_json::to_string(banner)?;
        // Redis rejects a zero expiry
        let ttl_ms = (ttl.as_millis() as u64).max(1);

        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(json)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(cache_error)
    }
}

#[async_trait]
impl BannerCache for RedisCache {
    async fn get(&self, ctx: &Deadline, key: &str) -> Result<Option<Banner>> {
        ctx.run(self.fetch(key)).await
    }

    async fn set(&self, ctx: &Deadline, key: &str, banner: &Banner, ttl: Duration) -> Result<()> {
        ctx.run(self.store(key, banner, ttl)).await
    }
}

fn cache_error(err: redis::RedisError) -> BannerError {
    BannerError::Cache(err.to_string())
}
