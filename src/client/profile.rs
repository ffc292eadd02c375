//! Deployment profiles for the client session guard.
//!
//! The environment is injected explicitly (build flag, env var or caller
//! choice) rather than inferred from the active network address at runtime.

use std::env;
use std::time::Duration;

/// Deployment context the client is running against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Staging,
    Development,
}

impl Environment {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Some(Environment::Production),
            "staging" => Some(Environment::Staging),
            "development" | "dev" => Some(Environment::Development),
            _ => None,
        }
    }

    /// Read from `APP_ENV`, defaulting to development.
    pub fn from_env() -> Self {
        env::var("APP_ENV")
            .ok()
            .and_then(|v| Self::from_str(&v))
            .unwrap_or(Environment::Development)
    }
}

/// Per-environment client configuration.
#[derive(Debug, Clone)]
pub struct Profile {
    pub environment: Environment,
    pub api_base: String,
    /// Whether secure transport is mandatory for this profile.
    pub require_https: bool,
    pub session_lifetime: Duration,
    /// Whether anti-forgery tokens are attached to state-changing calls.
    pub csrf_required: bool,
}

impl Profile {
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self {
                environment,
                api_base: "https://api.capbridge.africa".to_string(),
                require_https: true,
                session_lifetime: Duration::from_secs(2 * 3600),
                csrf_required: true,
            },
            Environment::Staging => Self {
                environment,
                api_base: "https://staging-api.capbridge.africa".to_string(),
                require_https: true,
                session_lifetime: Duration::from_secs(4 * 3600),
                csrf_required: true,
            },
            Environment::Development => Self {
                environment,
                api_base: "http://localhost:3000".to_string(),
                require_https: false,
                session_lifetime: Duration::from_secs(8 * 3600),
                csrf_required: false,
            },
        }
    }

    /// Override the endpoint base, keeping the rest of the profile.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Endpoint base after secure-transport enforcement.
    ///
    /// When the profile mandates HTTPS and the configured base is plain
    /// HTTP, the base is forced to its secure equivalent before any request
    /// is made. This is the native counterpart of the browser redirect.
    pub fn effective_api_base(&self) -> String {
        let base = match self.api_base.strip_prefix("http://") {
            Some(rest) if self.require_https => format!("https://{}", rest),
            _ => self.api_base.clone(),
        };
        base.trim_end_matches('/').to_string()
    }
}
