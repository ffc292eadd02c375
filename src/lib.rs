//! CapBridge authentication and session-security service.
//!
//! Server side: signed bearer tokens, salted password hashing, sliding-window
//! rate limiting and a small JSON API. Client side: session storage with its
//! own expiry, anti-forgery tokens and secure-transport enforcement.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod validate;
