//! Error types for the banner service

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BannerError>;

#[derive(Error, Debug)]
pub enum BannerError {
    #[error("Banner not found")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflicting feature/tag combination")]
    Conflict,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,
}

/// Error classes surfaced to the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    ValidationFailed,
    Conflict,
    Internal,
}

impl BannerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BannerError::NotFound => ErrorKind::NotFound,
            BannerError::Validation(_) => ErrorKind::ValidationFailed,
            BannerError::Conflict => ErrorKind::Conflict,
            BannerError::Database(_)
            | BannerError::Cache(_)
            | BannerError::Serialization(_)
            | BannerError::Cancelled
            | BannerError::DeadlineExceeded => ErrorKind::Internal,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        BannerError::Validation(msg.into())
    }
}

impl From<serde_json::Error> for BannerError {
    fn from(e: serde_json::Error) -> Self {
        BannerError::Serialization(e.to_string())
    }
}
