//! Client session guard: the caller-side counterpart of the auth API.
//!
//! Keeps the backend's contract honest from the client: explicit deployment
//! profiles, secure-transport enforcement, session storage with its own
//! expiry, anti-forgery tokens and shared input validation.

pub mod api_client;
pub mod profile;
pub mod session;

pub use api_client::{AuthClient, ClientError};
pub use profile::{Environment, Profile};
pub use session::{Session, SessionStore};

// The shared validation rules live at the crate root so the server handlers
// apply the identical checks.
pub use crate::validate;
