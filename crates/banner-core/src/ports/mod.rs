//! Port traits (interfaces) for dependency injection

pub mod cache;
pub mod storage;

pub use cache::BannerCache;
pub use storage::BannerStore;
