//! Banner Server
//!
//! HTTP front end for banner resolution and administration. Wires the
//! PostgreSQL store and the Redis cache (or their in-memory stand-ins) into
//! `BannerService` and exposes it over axum.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod services;
pub mod storage;

use axum::{
    routing::{get, put},
    Router,
};
use banner_core::{BannerService, Deadline};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use services::TokenService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub banners: Arc<BannerService>,
    pub tokens: Arc<TokenService>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(banners: BannerService, tokens: TokenService, request_timeout: Duration) -> Self {
        Self {
            banners: Arc::new(banners),
            tokens: Arc::new(tokens),
            request_timeout,
        }
    }

    /// Fresh per-request deadline.
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_routes())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/token", get(handlers::tokens::user_token))
        .route("/admin-token", get(handlers::tokens::admin_token))
        .route(
            "/banner",
            get(handlers::banners::get).post(handlers::banners::create),
        )
        .route("/banners", get(handlers::banners::list))
        .route(
            "/banner/:id",
            put(handlers::banners::update).delete(handlers::banners::delete),
        )
}
