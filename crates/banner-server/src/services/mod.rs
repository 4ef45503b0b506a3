//! Server-side services

pub mod tokens;

pub use tokens::TokenService;
