//! Banner resolution service
//!
//! Cache-aside lookups by (feature, tag) on top of a relational store, plus
//! validated pass-through writes. Cache entries are only ever written on a
//! read miss and are never invalidated by writes; they age out after
//! [`CACHE_TTL`].

use crate::ports::{BannerCache, BannerStore};
use crate::{Banner, BannerError, BannerFilter, BannerPayload, Deadline, NewBanner, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifetime of entries populated by [`BannerService::get_banner`].
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache key for the single-banner lookup path.
pub fn cache_key(feature_id: i64, tag_id: i64) -> String {
    format!("feature{}-tag{}", feature_id, tag_id)
}

pub struct BannerService {
    cache: Arc<dyn BannerCache>,
    store: Arc<dyn BannerStore>,
    cache_ttl: Duration,
}

impl BannerService {
    pub fn new(cache: Arc<dyn BannerCache>, store: Arc<dyn BannerStore>) -> Self {
        Self {
            cache,
            store,
            cache_ttl: CACHE_TTL,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub async fn get_banner(
        &self,
        ctx: &Deadline,
        tag_id: i64,
        feature_id: i64,
        use_last_revision: bool,
        is_admin: bool,
    ) -> Result<Banner> {
        let key = cache_key(feature_id, tag_id);

        if !use_last_revision {
            if let Some(banner) = self.cache.get(ctx, &key).await? {
                debug!("Cache hit for {}", key);
                return Ok(banner);
            }
            debug!("Cache miss for {}", key);
        }

        let banner = self
            .store
            .get_banner(ctx, feature_id, tag_id, is_admin)
            .await?;

        if let Err(e) = self.cache.set(ctx, &key, &banner, self.cache_ttl).await {
            warn!("Failed to populate cache for {}: {}", key, e);
        }

        Ok(banner)
    }

    pub async fn list_banners(
        &self,
        ctx: &Deadline,
        feature_id: i64,
        tag_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Banner>> {
        let filter = BannerFilter::new(feature_id, tag_id, limit, offset).normalized();
        self.store.list_banners(ctx, filter).await
    }

    pub async fn create_banner(&self, ctx: &Deadline, payload: BannerPayload) -> Result<i64> {
        let banner = validate(payload)?;
        let banner_id = self.store.create_banner(ctx, &banner).await?;

        info!(
            "Created banner {}: feature={}, tags={:?}",
            banner_id, banner.feature_id, banner.tag_ids
        );
        Ok(banner_id)
    }

    pub async fn update_banner(
        &self,
        ctx: &Deadline,
        banner_id: i64,
        payload: BannerPayload,
    ) -> Result<()> {
        let banner = validate(payload)?;
        self.store.update_banner(ctx, banner_id, &banner).await?;

        info!(
            "Updated banner {}: feature={}, tags={:?}, active={}",
            banner_id, banner.feature_id, banner.tag_ids, banner.is_active
        );
        Ok(())
    }

    pub async fn delete_banner(&self, ctx: &Deadline, banner_id: i64) -> Result<()> {
        self.store.delete_banner(ctx, banner_id).await?;
        info!("Deleted banner {}", banner_id);
        Ok(())
    }
}

/// Check write invariants and drop repeated tag ids, keeping first occurrence.
fn validate(payload: BannerPayload) -> Result<NewBanner> {
    if payload.tag_ids.is_empty() {
        return Err(BannerError::validation("at least one tag_id is required"));
    }
    if payload.feature_id == 0 {
        return Err(BannerError::validation("invalid feature_id"));
    }
    let content = payload
        .content
        .ok_or_else(|| BannerError::validation("content must not be null"))?;

    let mut seen = HashSet::with_capacity(payload.tag_ids.len());
    let tag_ids = payload
        .tag_ids
        .into_iter()
        .filter(|tag| seen.insert(*tag))
        .collect();

    Ok(NewBanner {
        feature_id: payload.feature_id,
        tag_ids,
        content,
        is_active: payload.is_active,
    })
}
