//! Banner Server binary

use anyhow::{Context, Result};
use banner_core::{BannerCache, BannerService, BannerStore, MemoryBannerStore, MemoryCache};
use banner_server::config::{CacheBackend, ServerConfig, StoreBackend};
use banner_server::services::TokenService;
use banner_server::storage::{PostgresBannerStore, RedisCache};
use banner_server::{router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // Configuration comes first so the log level can honour it
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[FATAL] Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting Banner Server v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server(config).await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server(config: ServerConfig) -> Result<()> {
    if config.uses_default_secret() {
        warn!("auth.jwt_secret not set, using default (insecure for production)");
    }

    let store: Arc<dyn BannerStore> = match config.database.backend {
        StoreBackend::Postgres => {
            let store = PostgresBannerStore::connect(&config.database)
                .await
                .context("Failed to initialize database")?;
            if config.database.init_schema {
                store
                    .init_schema()
                    .await
                    .context("Failed to apply database schema")?;
                info!("Database schema ready");
            }
            Arc::new(store)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory banner store; data is lost on restart");
            Arc::new(MemoryBannerStore::new())
        }
    };

    let cache: Arc<dyn BannerCache> = match config.cache.backend {
        CacheBackend::Redis => Arc::new(
            RedisCache::connect(&config.cache.url)
                .await
                .context("Failed to initialize cache")?,
        ),
        CacheBackend::Memory => {
            info!("Using in-memory cache");
            Arc::new(MemoryCache::new())
        }
    };

    let banners = BannerService::new(cache, store).with_cache_ttl(config.cache.ttl());
    let tokens = TokenService::new(&config.auth);
    let app = router(AppState::new(banners, tokens, config.request_timeout()));

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
