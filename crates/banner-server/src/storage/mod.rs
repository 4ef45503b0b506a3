//! Storage layer
//!
//! PostgreSQL holds banners and their tag associations; Redis holds the
//! read-through banner cache. The in-memory backends from `banner-core` can
//! replace either one through configuration.

pub mod postgres;
pub mod redis;

pub use self::postgres::PostgresBannerStore;
pub use self::redis::RedisCache;
