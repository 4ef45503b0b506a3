//! Banner Core Library
//!
//! Cache-aside resolution of banners by (feature, tag), the store ports the
//! resolver depends on, and in-memory implementations of those ports.

// Re-export pure types from banner-types
pub use banner_types::*;

pub mod deadline;
pub mod error;
pub mod memory;
pub mod ports;
pub mod service;

pub use deadline::Deadline;
pub use error::{BannerError, ErrorKind, Result};
pub use memory::{MemoryBannerStore, MemoryCache};
pub use ports::{BannerCache, BannerStore};
pub use service::{cache_key, BannerService, CACHE_TTL};
