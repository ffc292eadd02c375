//! Service entry point: configuration, tracing, router, serve.

use anyhow::{Context, Result};
use capbridge_auth::auth::{
    create_router, AppState, InMemoryDirectory, PasswordHasher, TokenService,
};
use capbridge_auth::config::AppConfig;
use capbridge_auth::middleware::{RateLimitConfig, RateLimiter};
use chrono::Duration as ChronoDuration;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let config = AppConfig::from_env();
    info!(
        bind = %config.bind_addr,
        token_ttl_secs = config.token_ttl_secs,
        rate_limit_max = config.rate_limit_max,
        origins = config.allowed_origins.len(),
        "🔐 starting auth service"
    );

    let state = AppState::new(
        Arc::new(InMemoryDirectory::new()),
        Arc::new(PasswordHasher::default()),
        Arc::new(TokenService::new(
            &config.jwt_secret,
            ChronoDuration::seconds(config.token_ttl_secs),
        )),
        config.login_failure_delay,
    );

    let limiter = RateLimiter::new(RateLimitConfig {
        max_requests: config.rate_limit_max,
        window: config.rate_limit_window,
    });

    // Bound the limiter's memory: idle client entries drop in the background.
    let cleanup_limiter = limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            cleanup_limiter.cleanup();
        }
    });

    let app = create_router(state, &config, limiter);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("🎯 auth service listening on {}", config.bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "capbridge_auth=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
