//! HTTP handlers

pub mod banners;
pub mod error;
pub mod health;
pub mod tokens;

pub use error::ApiError;
pub use health::health;
