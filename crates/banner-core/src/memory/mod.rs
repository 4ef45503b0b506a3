//! In-process backends
//!
//! DashMap cache in place of Redis, and a map-backed banner store in place of
//! Postgres. Both follow the port contracts so they can stand in for the real
//! adapters in tests and local runs.

pub mod cache;
pub mod store;

pub use cache::MemoryCache;
pub use store::MemoryBannerStore;
