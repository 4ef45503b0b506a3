//! Relational banner store port

use crate::{Banner, BannerFilter, Deadline, NewBanner, Result};
use async_trait::async_trait;

/// Source of truth for banners and their tag associations.
///
/// Writes are atomic: either every statement of a create/update/delete is
/// visible or none is. Missing targets yield `BannerError::NotFound` and
/// duplicate (feature, tag) pairs yield `BannerError::Conflict`.
#[async_trait]
pub trait BannerStore: Send + Sync {
    /// At most one banner carrying both ids; inactive ones only for admins.
    async fn get_banner(
        &self,
        ctx: &Deadline,
        feature_id: i64,
        tag_id: i64,
        is_admin: bool,
    ) -> Result<Banner>;

    /// Newest `updated_at` first. Zero-valued filter fields are ignored.
    async fn list_banners(&self, ctx: &Deadline, filter: BannerFilter) -> Result<Vec<Banner>>;

    async fn create_banner(&self, ctx: &Deadline, banner: &NewBanner) -> Result<i64>;

    /// Replaces the row and the full tag set of `banner_id`.
    async fn update_banner(&self, ctx: &Deadline, banner_id: i64, banner: &NewBanner)
        -> Result<()>;

    async fn delete_banner(&self, ctx: &Deadline, banner_id: i64) -> Result<()>;
}
