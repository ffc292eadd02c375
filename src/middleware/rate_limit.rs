//! Per-client sliding-window rate limiting.
//!
//! Each client IP carries an ordered queue of recent request instants.
//! Entries older than the window are pruned before counting, so the limit
//! cannot be doubled by bursting across a fixed bucket boundary.
//!
//! State is in-process only: acceptable for abuse mitigation, not for
//! durable quota enforcement.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::error::ApiError;

/// Configuration for the sliding window.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window per client.
    pub max_requests: usize,
    /// Window duration.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
        }
    }
}

/// Sliding-window limiter keyed by client IP.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Arc<Mutex<HashMap<IpAddr, VecDeque<Instant>>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.config.window.as_secs()
    }

    /// Record a request from `ip` and decide whether to admit it.
    pub fn allow(&self, ip: IpAddr) -> bool {
        self.allow_at(ip, Instant::now())
    }

    fn allow_at(&self, ip: IpAddr, now: Instant) -> bool {
        let mut state = self.state.lock();
        let window = state.entry(ip).or_default();

        // Drop instants at or before the trailing edge of the window.
        if let Some(window_start) = now.checked_sub(self.config.window) {
            while window.front().is_some_and(|t| *t <= window_start) {
                window.pop_front();
            }
        }

        if window.len() >= self.config.max_requests {
            return false;
        }

        window.push_back(now);
        true
    }

    /// Drop idle entries. Call from a background task; the window itself
    /// slides without this, it only bounds memory.
    pub fn cleanup(&self) {
        let mut state = self.state.lock();
        let now = Instant::now();
        let window = self.config.window;

        state.retain(|_, instants| {
            instants
                .back()
                .is_some_and(|last| now.duration_since(*last) < window)
        });
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.state.lock().len()
    }
}

/// Axum middleware applying the limiter per client address.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = addr.ip();

    if limiter.allow(ip) {
        next.run(request).await
    } else {
        warn!(ip = %ip, "rate limit exceeded");
        ApiError::RateLimited {
            window_secs: limiter.window_secs(),
        }
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: usize, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_requests: max,
            window: Duration::from_secs(window_secs),
        })
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let limiter = limiter(3, 60);
        let now = Instant::now();

        assert!(limiter.allow_at(ip(1), now));
        assert!(limiter.allow_at(ip(1), now));
        assert!(limiter.allow_at(ip(1), now));
        assert!(!limiter.allow_at(ip(1), now));
    }

    #[test]
    fn test_window_slides() {
        let limiter = limiter(2, 10);
        let start = Instant::now();

        assert!(limiter.allow_at(ip(1), start));
        assert!(limiter.allow_at(ip(1), start + Duration::from_secs(5)));
        assert!(!limiter.allow_at(ip(1), start + Duration::from_secs(9)));

        // First request has left the window; one slot frees up.
        assert!(limiter.allow_at(ip(1), start + Duration::from_secs(11)));
        assert!(!limiter.allow_at(ip(1), start + Duration::from_secs(12)));
    }

    #[test]
    fn test_no_boundary_burst_doubling() {
        // 3 requests late in one window must still count against the next.
        let limiter = limiter(3, 10);
        let start = Instant::now();

        for _ in 0..3 {
            assert!(limiter.allow_at(ip(1), start + Duration::from_secs(9)));
        }
        assert!(!limiter.allow_at(ip(1), start + Duration::from_secs(10)));
        assert!(!limiter.allow_at(ip(1), start + Duration::from_secs(18)));
    }

    #[test]
    fn test_clients_tracked_independently() {
        let limiter = limiter(1, 60);
        let now = Instant::now();

        assert!(limiter.allow_at(ip(1), now));
        assert!(limiter.allow_at(ip(2), now));
        assert!(!limiter.allow_at(ip(1), now));
    }

    #[test]
    fn test_cleanup_drops_idle_entries() {
        let limiter = limiter(5, 0);
        assert!(limiter.allow_at(ip(1), Instant::now() - Duration::from_secs(1)));
        assert_eq!(limiter.tracked_clients(), 1);

        limiter.cleanup();
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
