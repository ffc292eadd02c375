//! Environment-driven service configuration.

use rand::rngs::OsRng;
use rand::RngCore;
use std::env;
use std::time::Duration;
use tracing::warn;

/// All knobs the service reads at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Signing secret for bearer tokens. Rotating it invalidates every
    /// outstanding token at once.
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    /// Origin allow-list for CORS. Empty means permissive (dev only).
    pub allowed_origins: Vec<String>,
    pub max_body_bytes: usize,
    pub rate_limit_max: usize,
    pub rate_limit_window: Duration,
    /// Fixed artificial delay on failed logins, normalizing response timing
    /// between unknown-email and wrong-password paths.
    pub login_failure_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            jwt_secret: String::new(),
            token_ttl_secs: 24 * 3600,
            allowed_origins: Vec::new(),
            max_body_bytes: 16 * 1024,
            rate_limit_max: 60,
            rate_limit_window: Duration::from_secs(60),
            login_failure_delay: Duration::from_millis(500),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set; using a random secret (tokens will not survive restart)");
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            hex::encode(bytes)
        });

        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            jwt_secret,
            token_ttl_secs: env_parse("TOKEN_TTL_SECS", defaults.token_ttl_secs),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            max_body_bytes: env_parse("MAX_BODY_BYTES", defaults.max_body_bytes),
            rate_limit_max: env_parse("RATE_LIMIT_MAX", defaults.rate_limit_max),
            rate_limit_window: Duration::from_secs(env_parse(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window.as_secs(),
            )),
            login_failure_delay: Duration::from_millis(env_parse(
                "LOGIN_FAILURE_DELAY_MS",
                defaults.login_failure_delay.as_millis() as u64,
            )),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
