//! Cross-cutting request middleware: rate limiting, security headers,
//! payload size policy and request logging.

pub mod body_limit;
pub mod logging;
pub mod rate_limit;
pub mod security_headers;

pub use body_limit::enforce_body_limit;
pub use logging::request_logging;
pub use rate_limit::{rate_limit_middleware, RateLimitConfig, RateLimiter};
pub use security_headers::security_headers;
