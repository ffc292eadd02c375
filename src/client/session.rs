//! Client-held session state and anti-forgery token management.
//!
//! The store is the single source of truth for "am I signed in": once the
//! wall clock passes a session's expiry the session reads as absent, even
//! if nothing ever cleared it.

use crate::auth::models::PublicProfile;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

const CSRF_TOKEN_BYTES: usize = 32;

/// One authenticated session: bearer token plus profile copy and expiry.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: PublicProfile,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Session storage scoped to one client instance (the native counterpart of
/// browser session storage).
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
    csrf: Arc<Mutex<Option<String>>>,
    lifetime: Duration,
}

impl SessionStore {
    pub fn new(lifetime: std::time::Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            csrf: Arc::new(Mutex::new(None)),
            lifetime: Duration::from_std(lifetime).unwrap_or_else(|_| Duration::hours(8)),
        }
    }

    /// Replace the stored session after a successful signup or login.
    pub fn store(&self, token: String, user: PublicProfile) -> Session {
        let created_at = Utc::now();
        let session = Session {
            token,
            user,
            created_at,
            expires_at: created_at + self.lifetime,
        };
        *self.inner.write() = Some(session.clone());
        session
    }

    /// Current session, treating an expired one as absent (and dropping it).
    pub fn current(&self) -> Option<Session> {
        self.current_at(Utc::now())
    }

    fn current_at(&self, now: DateTime<Utc>) -> Option<Session> {
        let snapshot = self.inner.read().clone()?;
        if !snapshot.is_expired_at(now) {
            return Some(snapshot);
        }
        self.clear_if_current(&snapshot);
        None
    }

    /// Drop the slot only if it still holds `expired`: a login racing the
    /// expiry read may have stored a fresh session in between.
    fn clear_if_current(&self, expired: &Session) {
        let mut guard = self.inner.write();
        let still_current = guard
            .as_ref()
            .is_some_and(|s| s.created_at == expired.created_at && s.token == expired.token);
        if still_current {
            *guard = None;
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Drop the session: sign-out, expiry, or a 401 from any call.
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Anti-forgery token for this store's lifetime.
    ///
    /// Generated once, reused until the store is dropped, regenerated only
    /// if absent. Independent of the bearer token by construction.
    pub fn csrf_token(&self) -> String {
        let mut guard = self.csrf.lock();
        guard
            .get_or_insert_with(|| {
                let mut bytes = [0u8; CSRF_TOKEN_BYTES];
                OsRng.fill_bytes(&mut bytes);
                URL_SAFE_NO_PAD.encode(bytes)
            })
            .clone()
    }

    /// Fire `on_expired` at the current session's deadline, clearing the
    /// session first - unless the user already signed out or a newer
    /// session replaced this one.
    pub fn spawn_expiry_watcher<F>(&self, on_expired: F) -> Option<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        let session = self.inner.read().clone()?;
        let store = self.clone();

        Some(tokio::spawn(async move {
            let remaining = (session.expires_at - Utc::now())
                .to_std()
                .unwrap_or_default();
            tokio::time::sleep(remaining).await;

            let mut guard = store.inner.write();
            let still_current = guard
                .as_ref()
                .is_some_and(|s| s.created_at == session.created_at && s.token == session.token);
            if still_current {
                *guard = None;
                drop(guard);
                info!("session expired");
                on_expired();
            }
        }))
    }
}
