//! Authentication endpoints and router assembly.
//!
//! Single entry point for signup, login, token verification and health.
//! Cross-origin policy, rate limiting, payload size and security headers
//! are applied as layers around the route set.

use crate::auth::{
    directory::{InsertError, UserDirectory},
    models::{
        normalize_email, Account, AccountType, AuthResponse, LoginRequest, PublicProfile,
        SignupRequest, VerifyResponse,
    },
    password::PasswordHasher,
    token::TokenService,
};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::middleware::{
    enforce_body_limit, rate_limit_middleware, request_logging, security_headers, RateLimiter,
};
use crate::validate;
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<dyn UserDirectory>,
    pub hasher: Arc<PasswordHasher>,
    pub tokens: Arc<TokenService>,
    pub login_failure_delay: Duration,
    pub started_at: Instant,
    /// Digest of a throwaway password at the configured cost. Logins for
    /// unknown emails verify against this so they pay for the same key
    /// derivation a real account would.
    decoy_hash: Arc<String>,
}

impl AppState {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        hasher: Arc<PasswordHasher>,
        tokens: Arc<TokenService>,
        login_failure_delay: Duration,
    ) -> Self {
        let decoy_hash = Arc::new(hasher.hash("decoy-never-a-real-password"));
        Self {
            directory,
            hasher,
            tokens,
            login_failure_delay,
            started_at: Instant::now(),
            decoy_hash,
        }
    }
}

/// Assemble the service router with all cross-cutting layers.
pub fn create_router(state: AppState, config: &AppConfig, limiter: RateLimiter) -> Router {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/verify", get(verify_token))
        .route("/health", get(health))
        .route("/", get(health))
        .fallback(not_found)
        .with_state(state)
        // Layer order is inside-out: CORS runs first on the way in, then
        // logging, security headers, rate limiting, and size policy.
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(middleware::from_fn_with_state(
            config.max_body_bytes,
            enforce_body_limit,
        ))
        .layer(middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&config.allowed_origins))
}

/// CORS from the configured origin allow-list. An empty list falls back to
/// permissive, which is only acceptable in development profiles.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let list: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(list))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-csrf-token"),
        ])
}

/// Signup - POST /auth/signup
async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(payload) = payload.map_err(bad_body)?;

    require_non_blank("email", &payload.email)?;
    require_non_blank("password", &payload.password)?;
    require_non_blank("name", &payload.name)?;
    require_non_blank("accountType", &payload.account_type)?;

    let email = normalize_email(&payload.email);
    validate::validate_email(&email).map_err(|message| ApiError::Validation {
        field: "email",
        message,
    })?;

    if payload.password.len() < validate::MIN_PASSWORD_LEN {
        return Err(ApiError::Validation {
            field: "password",
            message: format!(
                "Password must be at least {} characters long",
                validate::MIN_PASSWORD_LEN
            ),
        });
    }

    let account_type =
        AccountType::from_str(&payload.account_type).ok_or(ApiError::Validation {
            field: "accountType",
            message: "Account type must be investor, business_owner or admin".to_string(),
        })?;

    // Key derivation is CPU-bound; keep it off the async workers.
    let hasher = state.hasher.clone();
    let password = payload.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .context("password hashing task failed")?;

    let account = Account::new(email, password_hash, payload.name.trim().to_string(), account_type);

    match state.directory.insert(account.clone()).await {
        Ok(()) => {}
        Err(InsertError::DuplicateEmail) => return Err(ApiError::DuplicateAccount),
        Err(InsertError::Storage(e)) => return Err(ApiError::Internal(e)),
    }

    // Only accounts that exist get tokens; a lost duplicate race must not
    // mint one.
    let profile = PublicProfile::from_account(&account);
    let token = state.tokens.issue(&account)?;

    info!(email = %profile.email, account_type = %profile.account_type.as_str(), "account created");

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user: profile })))
}

/// Login - POST /auth/login
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(payload) = payload.map_err(bad_body)?;

    require_non_blank("email", &payload.email)?;
    require_non_blank("password", &payload.password)?;

    let email = normalize_email(&payload.email);
    validate::validate_email(&email).map_err(|message| ApiError::Validation {
        field: "email",
        message,
    })?;

    let account = state.directory.find_by_email(&email).await?;

    // Unknown emails run the derivation against a decoy digest so both
    // failure modes cost the same before the fixed delay.
    let stored = match &account {
        Some(account) => account.password_hash.clone(),
        None => state.decoy_hash.as_ref().clone(),
    };
    let hasher = state.hasher.clone();
    let password = payload.password.clone();
    let matched = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
        .await
        .context("password verification task failed")?;
    let verified = matched && account.is_some();

    let account = match (verified, account) {
        (true, Some(account)) => account,
        _ => {
            warn!(email = %email, "failed login attempt");
            // Fixed delay so unknown-email and wrong-password responses are
            // indistinguishable by timing. Awaited inline, part of the response.
            tokio::time::sleep(state.login_failure_delay).await;
            return Err(ApiError::Authentication);
        }
    };

    state
        .directory
        .update_last_login(&account.email, Utc::now())
        .await?;

    let token = state.tokens.issue(&account)?;

    info!(email = %account.email, "login successful");

    Ok(Json(AuthResponse {
        token,
        user: PublicProfile::from_account_verified(&account),
    }))
}

/// Token verification - GET /auth/verify
async fn verify_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VerifyResponse>, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(ApiError::MissingToken)?;

    let claims = state
        .tokens
        .verify(token)
        .map_err(|_| ApiError::Authentication)?;

    Ok(Json(VerifyResponse {
        valid: true,
        user: claims,
    }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    uptime_secs: u64,
}

/// Health probe - GET /health (and GET /)
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}

fn bad_body(rejection: JsonRejection) -> ApiError {
    // Bodies that blew the size limit while buffering keep their own status.
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge;
    }
    ApiError::Validation {
        field: "body",
        message: rejection.body_text(),
    }
}

fn require_non_blank(field: &'static str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation {
            field,
            message: format!("{} is required", field),
        });
    }
    Ok(())
}
