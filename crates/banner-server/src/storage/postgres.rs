//! PostgreSQL banner store
//!
//! Every write runs in a single transaction: the banner row and its full
//! association set commit together or not at all. Failing statements roll
//! the transaction back before the error is returned, and a transaction
//! dropped mid-flight (deadline or cancellation) is rolled back by sqlx when
//! its connection returns to the pool.
//!
//! Joint (feature_id, tag_id) uniqueness is enforced by a trigger on
//! `banner_tags` that raises `unique_violation`; the store maps that SQLSTATE
//! to [`BannerError::Conflict`].

use crate::config::DatabaseConfig;
use anyhow::{Context, Result as AnyResult};
use async_trait::async_trait;
use banner_core::{
    Banner, BannerError, BannerFilter, BannerStore, Deadline, NewBanner, Result,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder, Transaction};
use std::collections::HashMap;
use tracing::{info, warn};

const SCHEMA: &str = include_str!("schema.sql");

/// SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for `deadlock_detected`
const DEADLOCK_DETECTED: &str = "40P01";

const BANNER_COLUMNS: &str =
    "b.banner_id, b.feature_id, b.content, b.is_active, b.created_at, b.updated_at";

pub struct PostgresBannerStore {
    pool: PgPool,
}

impl PostgresBannerStore {
    pub async fn connect(config: &DatabaseConfig) -> AnyResult<Self> {
        info!(
            "Connecting to PostgreSQL (max_connections={})...",
            config.max_connections
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .connect(&config.url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the bundled DDL. Idempotent.
    pub async fn init_schema(&self) -> AnyResult<()> {
        (&self.pool)
            .execute(SCHEMA)
            .await
            .context("Failed to apply banner schema")?;
        info!("Banner schema is up to date");
        Ok(())
    }

    async fn fetch_banner(&self, feature_id: i64, tag_id: i64, is_admin: bool) -> Result<Banner> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;

        let row: BannerRow = sqlx::query_as(
            r#"
            SELECT b.banner_id, b.feature_id, b.content, b.is_active, b.created_at, b.updated_at
            FROM banners b
            INNER JOIN banner_tags bt ON bt.banner_id = b.banner_id
            WHERE b.feature_id = $1 AND bt.tag_id = $2 AND ($3 OR b.is_active)
            ORDER BY b.updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(feature_id)
        .bind(tag_id)
        .bind(is_admin)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_error)?
        .ok_or(BannerError::NotFound)?;

        let tag_ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT tag_id FROM banner_tags WHERE banner_id = $1 ORDER BY tag_id
            "#,
        )
        .bind(row.banner_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error)?;

        Ok(row.into_banner(tag_ids))
    }

    async fn fetch_banners(&self, filter: BannerFilter) -> Result<Vec<Banner>> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query.push(BANNER_COLUMNS).push(" FROM banners b");
        if filter.by_tag().is_some() {
            query.push(" INNER JOIN banner_tags bt ON bt.banner_id = b.banner_id");
        }

        let mut glue = " WHERE ";
        if let Some(feature_id) = filter.by_feature() {
            query.push(glue).push("b.feature_id = ").push_bind(feature_id);
            glue = " AND ";
        }
        if let Some(tag_id) = filter.by_tag() {
            query.push(glue).push("bt.tag_id = ").push_bind(tag_id);
        }

        query.push(" ORDER BY b.updated_at DESC, b.banner_id DESC");
        if let Some(limit) = filter.limit() {
            query.push(" LIMIT ").push_bind(limit);
        }
        if let Some(offset) = filter.offset() {
            query.push(" OFFSET ").push_bind(offset);
        }

        let rows: Vec<BannerRow> = query
            .build_query_as()
            .fetch_all(&mut *conn)
            .await
            .map_err(db_error)?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut tags = fetch_tag_sets(&mut *conn, &rows).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let tag_ids = tags.remove(&row.banner_id).unwrap_or_default();
                row.into_banner(tag_ids)
            })
            .collect())
    }

    async fn insert_banner(&self, banner: &NewBanner) -> Result<i64> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        match insert_rows(&mut tx, banner).await {
            Ok(banner_id) => {
                tx.commit().await.map_err(db_error)?;
                Ok(banner_id)
            }
            Err(e) => {
                rollback(tx).await;
                Err(e)
            }
        }
    }

    async fn replace_banner(&self, banner_id: i64, banner: &NewBanner) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        match replace_rows(&mut tx, banner_id, banner).await {
            Ok(()) => tx.commit().await.map_err(db_error),
            Err(e) => {
                rollback(tx).await;
                Err(e)
            }
        }
    }

    async fn remove_banner(&self, banner_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        match remove_rows(&mut tx, banner_id).await {
            Ok(()) => tx.commit().await.map_err(db_error),
            Err(e) => {
                rollback(tx).await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl BannerStore for PostgresBannerStore {
    async fn get_banner(
        &self,
        ctx: &Deadline,
        feature_id: i64,
        tag_id: i64,
        is_admin: bool,
    ) -> Result<Banner> {
        ctx.run(self.fetch_banner(feature_id, tag_id, is_admin))
            .await
    }

    async fn list_banners(&self, ctx: &Deadline, filter: BannerFilter) -> Result<Vec<Banner>> {
        ctx.run(self.fetch_banners(filter)).await
    }

    async fn create_banner(&self, ctx: &Deadline, banner: &NewBanner) -> Result<i64> {
        ctx.run(self.insert_banner(banner)).await
    }

    async fn update_banner(
        &self,
        ctx: &Deadline,
        banner_id: i64,
        banner: &NewBanner,
    ) -> Result<()> {
        ctx.run(self.replace_banner(banner_id, banner)).await
    }

    async fn delete_banner(&self, ctx: &Deadline, banner_id: i64) -> Result<()> {
        ctx.run(self.remove_banner(banner_id)).await
    }
}

async fn insert_rows(tx: &mut Transaction<'_, Postgres>, banner: &NewBanner) -> Result<i64> {
    let banner_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO banners (feature_id, content, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, now(), now())
        RETURNING banner_id
        "#,
    )
    .bind(banner.feature_id)
    .bind(Json(&banner.content))
    .bind(banner.is_active)
    .fetch_one(&mut **tx)
    .await
    .map_err(db_error)?;

    insert_tags(tx, banner_id, &banner.tag_ids).await?;
    Ok(banner_id)
}

async fn replace_rows(
    tx: &mut Transaction<'_, Postgres>,
    banner_id: i64,
    banner: &NewBanner,
) -> Result<()> {
    let updated = sqlx::query(
        r#"
        UPDATE banners
        SET feature_id = $1, content = $2, is_active = $3, updated_at = now()
        WHERE banner_id = $4
        "#,
    )
    .bind(banner.feature_id)
    .bind(Json(&banner.content))
    .bind(banner.is_active)
    .bind(banner_id)
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;

    if updated.rows_affected() != 1 {
        return Err(BannerError::NotFound);
    }

    sqlx::query("DELETE FROM banner_tags WHERE banner_id = $1")
        .bind(banner_id)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;

    insert_tags(tx, banner_id, &banner.tag_ids).await
}

async fn remove_rows(tx: &mut Transaction<'_, Postgres>, banner_id: i64) -> Result<()> {
    // Associations first; the cascade is not relied on
    sqlx::query("DELETE FROM banner_tags WHERE banner_id = $1")
        .bind(banner_id)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;

    let deleted = sqlx::query("DELETE FROM banners WHERE banner_id = $1")
        .bind(banner_id)
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;

    if deleted.rows_affected() == 0 {
        return Err(BannerError::NotFound);
    }
    Ok(())
}

/// Rows go in ascending tag order so every writer takes the per-pair
/// advisory locks in the same order.
async fn insert_tags(
    tx: &mut Transaction<'_, Postgres>,
    banner_id: i64,
    tag_ids: &[i64],
) -> Result<()> {
    for tag_id in lock_order(tag_ids) {
        sqlx::query("INSERT INTO banner_tags (banner_id, tag_id) VALUES ($1, $2)")
            .bind(banner_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await
            .map_err(db_error)?;
    }
    Ok(())
}

fn lock_order(tag_ids: &[i64]) -> Vec<i64> {
    let mut ordered = tag_ids.to_vec();
    ordered.sort_unstable();
    ordered
}

/// Tag sets for a page of banners, in one round trip.
async fn fetch_tag_sets(
    conn: &mut PgConnection,
    rows: &[BannerRow],
) -> Result<HashMap<i64, Vec<i64>>> {
    let ids: Vec<i64> = rows.iter().map(|row| row.banner_id).collect();

    let pairs: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT banner_id, tag_id
        FROM banner_tags
        WHERE banner_id = ANY($1)
        ORDER BY banner_id, tag_id
        "#,
    )
    .bind(ids.as_slice())
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;

    let mut tags: HashMap<i64, Vec<i64>> = HashMap::with_capacity(ids.len());
    for (banner_id, tag_id) in pairs {
        tags.entry(banner_id).or_default().push(tag_id);
    }
    Ok(tags)
}

async fn rollback(tx: Transaction<'_, Postgres>) {
    if let Err(e) = tx.rollback().await {
        warn!("Failed to roll back banner transaction: {}", e);
    }
}

/// Classify by SQLSTATE, never by message text.
fn db_error(err: sqlx::Error) -> BannerError {
    match &err {
        sqlx::Error::RowNotFound => BannerError::NotFound,
        sqlx::Error::Database(db) if db.code().is_some_and(|c| is_conflict_code(&c)) => {
            BannerError::Conflict
        }
        _ => BannerError::Database(err.to_string()),
    }
}

/// Two writers racing for the same pair surface as a unique violation, or as
/// a deadlock when their lock sets overlap.
fn is_conflict_code(code: &str) -> bool {
    matches!(code, UNIQUE_VIOLATION | DEADLOCK_DETECTED)
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct BannerRow {
    banner_id: i64,
    feature_id: i64,
    content: Json<Value>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BannerRow {
    fn into_banner(self, tag_ids: Vec<i64>) -> Banner {
        Banner {
            banner_id: self.banner_id,
            feature_id: self.feature_id,
            tag_ids,
            content: self.content.0,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
