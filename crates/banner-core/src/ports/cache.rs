//! Key-value cache port

use crate::{Banner, Deadline, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Serialized banner cache with per-entry expiry.
///
/// `get` returns `Ok(None)` for a missing or expired key; transport and
/// decoding failures are errors. `set` overwrites any previous value.
#[async_trait]
pub trait BannerCache: Send + Sync {
    async fn get(&self, ctx: &Deadline, key: &str) -> Result<Option<Banner>>;
    async fn set(&self, ctx: &Deadline, key: &str, banner: &Banner, ttl: Duration) -> Result<()>;
}
