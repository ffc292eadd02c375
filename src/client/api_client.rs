//! Authenticated call wrapper for the auth backend.
//!
//! Every outbound call goes through one request path that attaches the
//! bearer token and the anti-forgery header, and applies a uniform response
//! policy: 401 kills the local session, 403 and 429 surface as typed
//! errors, anything else non-2xx passes through for the caller.

use crate::auth::models::{AccountType, AuthResponse, Claims, VerifyResponse};
use crate::client::profile::Profile;
use crate::client::session::{Session, SessionStore};
use crate::validate;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

const CSRF_HEADER: &str = "X-CSRF-Token";

/// Client-side call failures.
#[derive(Debug)]
pub enum ClientError {
    /// Input rejected locally before any request was made.
    Validation(String),
    /// The backend answered 401; the local session has been cleared.
    SessionExpired,
    /// The backend answered 403.
    Forbidden,
    /// The backend answered 429.
    RateLimited { retry_after_secs: Option<u64> },
    /// Any other non-2xx response, passed through for the caller.
    Api { status: u16, message: String },
    /// Network or protocol failure.
    Transport(reqwest::Error),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Validation(msg) => write!(f, "validation failed: {}", msg),
            ClientError::SessionExpired => write!(f, "session expired, sign in again"),
            ClientError::Forbidden => write!(f, "access forbidden"),
            ClientError::RateLimited { .. } => write!(f, "rate limited, slow down"),
            ClientError::Api { status, message } => {
                write!(f, "request failed ({}): {}", status, message)
            }
            ClientError::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err)
    }
}

/// Session-aware client for the auth endpoints.
pub struct AuthClient {
    http: reqwest::Client,
    api_base: String,
    profile: Profile,
    store: SessionStore,
}

impl AuthClient {
    pub fn new(profile: Profile) -> Result<Self, ClientError> {
        let api_base = profile.effective_api_base();
        let store = SessionStore::new(profile.session_lifetime);
        let http = reqwest::Client::builder()
            .build()
            .map_err(ClientError::Transport)?;

        Ok(Self {
            http,
            api_base,
            profile,
            store,
        })
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.store
    }

    /// Register a new account and persist the resulting session.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
        account_type: AccountType,
    ) -> Result<Session, ClientError> {
        // Apply the shared rules locally so the server never sees input the
        // pages would reject.
        validate::validate_email(email).map_err(ClientError::Validation)?;
        validate::validate_password_strength(password).map_err(ClientError::Validation)?;
        if name.trim().is_empty() {
            return Err(ClientError::Validation("Name is required".to_string()));
        }

        let body = json!({
            "email": email,
            "password": password,
            "name": name,
            "accountType": account_type.as_str(),
        });
        let response = self
            .send(Method::POST, "/auth/signup", Some(&body), false)
            .await?;

        let auth: AuthResponse = response.json().await?;
        Ok(self.store.store(auth.token, auth.user))
    }

    /// Authenticate and replace any existing session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        validate::validate_email(email).map_err(ClientError::Validation)?;

        let body = json!({ "email": email, "password": password });
        let response = self
            .send(Method::POST, "/auth/login", Some(&body), false)
            .await?;

        let auth: AuthResponse = response.json().await?;
        Ok(self.store.store(auth.token, auth.user))
    }

    /// Ask the backend to verify the current session's token.
    pub async fn verify(&self) -> Result<Claims, ClientError> {
        let response = self.send(Method::GET, "/auth/verify", None::<&()>, true).await?;
        let verified: VerifyResponse = response.json().await?;
        Ok(verified.user)
    }

    /// Drop the local session. Tokens are bearer credentials with no
    /// server-side record, so sign-out is purely local.
    pub fn sign_out(&self) {
        self.store.clear();
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        requires_auth: bool,
    ) -> Result<reqwest::Response, ClientError> {
        let url = format!("{}{}", self.api_base, path);
        let state_changing = method != Method::GET;
        let mut request: RequestBuilder = self.http.request(method, &url);

        if let Some(body) = body {
            request = request.json(body);
        }

        if self.profile.csrf_required && state_changing {
            request = request.header(CSRF_HEADER, self.store.csrf_token());
        }

        if requires_auth {
            let session = self.store.current().ok_or(ClientError::SessionExpired)?;
            request = request.bearer_auth(session.token);
        }

        let response = request.send().await?;
        self.check_status(response).await
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ClientError> {
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED => {
                // A 401 anywhere means the session is dead.
                warn!("received 401, clearing local session");
                self.store.clear();
                Err(ClientError::SessionExpired)
            }
            StatusCode::FORBIDDEN => Err(ClientError::Forbidden),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|v| v["retry_after_seconds"].as_u64());
                Err(ClientError::RateLimited { retry_after_secs })
            }
            s if !s.is_success() => {
                let message = response
                    .json::<serde_json::Value>()
                    .await
                    .ok()
                    .and_then(|v| v["message"].as_str().map(str::to_string))
                    .unwrap_or_else(|| "unknown error".to_string());
                Err(ClientError::Api {
                    status: s.as_u16(),
                    message,
                })
            }
            _ => Ok(response),
        }
    }
}
