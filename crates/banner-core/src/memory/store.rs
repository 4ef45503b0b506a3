//! Map-backed banner store (stands in for Postgres)

use crate::ports::BannerStore;
use crate::{Banner, BannerError, BannerFilter, Deadline, NewBanner, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

/// Banner store held entirely in process memory.
///
/// Each write takes the lock once and validates before mutating, so a failed
/// write leaves the state untouched.
#[derive(Default)]
pub struct MemoryBannerStore {
    state: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    last_id: i64,
    banners: BTreeMap<i64, Banner>,
}

impl StoreState {
    /// Reject duplicate tags and (feature, tag) pairs owned by another banner.
    fn check_unique(&self, banner_id: Option<i64>, banner: &NewBanner) -> Result<()> {
        let mut seen = HashSet::with_capacity(banner.tag_ids.len());
        if !banner.tag_ids.iter().all(|tag| seen.insert(*tag)) {
            return Err(BannerError::Conflict);
        }

        let taken = self.banners.values().any(|other| {
            Some(other.banner_id) != banner_id
                && other.feature_id == banner.feature_id
                && other.tag_ids.iter().any(|tag| seen.contains(tag))
        });
        if taken {
            return Err(BannerError::Conflict);
        }
        Ok(())
    }
}

impl MemoryBannerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.banners.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn find(&self, feature_id: i64, tag_id: i64, is_admin: bool) -> Result<Banner> {
        let state = self.state.read().await;
        state
            .banners
            .values()
            .filter(|b| b.feature_id == feature_id && b.has_tag(tag_id))
            .filter(|b| is_admin || b.is_active)
            .max_by_key(|b| (b.updated_at, b.banner_id))
            .cloned()
            .ok_or(BannerError::NotFound)
    }

    async fn list(&self, filter: BannerFilter) -> Result<Vec<Banner>> {
        let state = self.state.read().await;
        let mut banners: Vec<Banner> = state
            .banners
            .values()
            .filter(|b| filter.by_feature().map_or(true, |f| b.feature_id == f))
            .filter(|b| filter.by_tag().map_or(true, |t| b.has_tag(t)))
            .cloned()
            .collect();
        banners.sort_by(|a, b| {
            (b.updated_at, b.banner_id).cmp(&(a.updated_at, a.banner_id))
        });

        let offset = filter.offset().unwrap_or(0) as usize;
        let page = banners.into_iter().skip(offset);
        Ok(match filter.limit() {
            Some(limit) => page.take(limit as usize).collect(),
            None => page.collect(),
        })
    }

    async fn insert(&self, banner: &NewBanner) -> Result<i64> {
        let mut state = self.state.write().await;
        state.check_unique(None, banner)?;

        state.last_id += 1;
        let banner_id = state.last_id;
        let mut stored = Banner::from_new(banner_id, banner.clone(), Utc::now());
        stored.tag_ids.sort_unstable();
        state.banners.insert(banner_id, stored);
        Ok(banner_id)
    }

    async fn replace(&self, banner_id: i64, banner: &NewBanner) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.banners.contains_key(&banner_id) {
            return Err(BannerError::NotFound);
        }
        state.check_unique(Some(banner_id), banner)?;

        let stored = state
            .banners
            .get_mut(&banner_id)
            .ok_or(BannerError::NotFound)?;
        stored.feature_id = banner.feature_id;
        stored.tag_ids = banner.tag_ids.clone();
        stored.tag_ids.sort_unstable();
        stored.content = banner.content.clone();
        stored.is_active = banner.is_active;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn remove(&self, banner_id: i64) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .banners
            .remove(&banner_id)
            .map(|_| ())
            .ok_or(BannerError::NotFound)
    }
}

#[async_trait]
impl BannerStore for MemoryBannerStore {
    async fn get_banner(
        &self,
        ctx: &Deadline,
        feature_id: i64,
        tag_id: i64,
        is_admin: bool,
    ) -> Result<Banner> {
        ctx.run(self.find(feature_id, tag_id, is_admin)).await
    }

    async fn list_banners(&self, ctx: &Deadline, filter: BannerFilter) -> Result<Vec<Banner>> {
        ctx.run(self.list(filter)).await
    }

    async fn create_banner(&self, ctx: &Deadline, banner: &NewBanner) -> Result<i64> {
        ctx.run(self.insert(banner)).await
    }

    async fn update_banner(
        &self,
        ctx: &Deadline,
        banner_id: i64,
        banner: &NewBanner,
    ) -> Result<()> {
        ctx.run(self.replace(banner_id, banner)).await
    }

    async fn delete_banner(&self, ctx: &Deadline, banner_id: i64) -> Result<()> {
        ctx.run(self.remove(banner_id)).await
    }
}
