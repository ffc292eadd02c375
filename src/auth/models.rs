//! Account and authentication data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalize an email address for use as a directory key.
///
/// Case and surrounding whitespace must never produce distinct accounts.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A registered account. One per normalized email, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // salted PBKDF2 digest - never serialize
    pub name: String,
    pub account_type: AccountType,
    pub created_at: DateTime<Utc>,
    pub email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    /// Build a fresh, unverified account. `email` must already be normalized.
    pub fn new(
        email: String,
        password_hash: String,
        name: String,
        account_type: AccountType,
    ) -> Self {
        Self {
            email,
            password_hash,
            name,
            account_type,
            created_at: Utc::now(),
            email_verified: false,
            last_login: None,
        }
    }
}

/// Closed set of account categories on the platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountType {
    #[serde(rename = "investor")]
    Investor,
    #[serde(rename = "business_owner")]
    BusinessOwner,
    #[serde(rename = "admin")]
    Admin,
}

impl AccountType {
    pub fn as_str(&self) -> &str {
        match self {
            AccountType::Investor => "investor",
            AccountType::BusinessOwner => "business_owner",
            AccountType::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "investor" => Some(AccountType::Investor),
            "business_owner" => Some(AccountType::BusinessOwner),
            "admin" => Some(AccountType::Admin),
            _ => None,
        }
    }
}

/// Identity claims carried inside a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub email: String,
    pub name: String,
    #[serde(rename = "accountType")]
    pub account_type: AccountType,
    pub exp: usize, // expiration timestamp (unix seconds)
}

/// Signup request body.
///
/// `account_type` arrives as a raw string so an out-of-set value can be
/// rejected with a field-level error instead of an opaque decode failure.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(rename = "accountType")]
    pub account_type: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful signup/login response.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicProfile,
}

/// Public view of an account. Never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub email: String,
    pub name: String,
    #[serde(rename = "accountType")]
    pub account_type: AccountType,
    #[serde(rename = "isEmailVerified", skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
}

impl PublicProfile {
    /// Profile view returned on signup (no verification flag yet).
    pub fn from_account(account: &Account) -> Self {
        Self {
            email: account.email.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            email_verified: None,
        }
    }

    /// Profile view returned on login, including the verification flag.
    pub fn from_account_verified(account: &Account) -> Self {
        Self {
            email_verified: Some(account.email_verified),
            ..Self::from_account(account)
        }
    }
}

/// Token verification response.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub user: Claims,
}
