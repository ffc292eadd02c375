//! Authentication core: accounts, credentials, bearer tokens and the
//! request handlers that tie them together.

pub mod api;
pub mod directory;
pub mod models;
pub mod password;
pub mod token;

pub use api::{create_router, AppState};
pub use directory::{InMemoryDirectory, UserDirectory};
pub use password::PasswordHasher;
pub use token::TokenService;
