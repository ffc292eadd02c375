//! Bearer token issue and verification.
//!
//! Compact HS256 tokens over a single server secret. Rotating the secret
//! invalidates every outstanding token at once; there is no selective
//! revocation.

use crate::auth::models::{Account, Claims};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Uniform failure for every bad token.
///
/// Malformed structure, signature mismatch and expiry are deliberately not
/// distinguished so callers leak nothing useful to forgery attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidToken;

impl std::fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid or expired token")
    }
}

impl std::error::Error for InvalidToken {}

/// Issues and verifies signed, expiring bearer tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // A token whose expiry has passed is invalid, full stop.
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    /// Issue a token for an account using the configured lifetime.
    pub fn issue(&self, account: &Account) -> Result<String> {
        self.issue_with_ttl(account, self.ttl)
    }

    /// Issue a token with an explicit lifetime.
    ///
    /// The lifetime is signed so tests can mint already-expired tokens.
    pub fn issue_with_ttl(&self, account: &Account, ttl: Duration) -> Result<String> {
        let exp = Utc::now()
            .checked_add_signed(ttl)
            .context("token expiry out of range")?
            .timestamp();

        let claims = Claims {
            email: account.email.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            exp: exp as usize,
        };

        debug!(email = %claims.email, ttl_secs = ttl.num_seconds(), "issuing token");

        encode(&Header::default(), &claims, &self.encoding).context("failed to sign token")
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::AccountType;

    fn test_account() -> Account {
        Account::new(
            "a@x.com".into(),
            "digest".into(),
            "A".into(),
            AccountType::Investor,
        )
    }

    fn service() -> TokenService {
        TokenService::new("test-secret-key-12345", Duration::hours(24))
    }

    #[test]
    fn test_verify_of_issue_returns_claims() {
        let tokens = service();
        let token = tokens.issue(&test_account()).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.name, "A");
        assert_eq!(claims.account_type, AccountType::Investor);
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service();
        let token = tokens
            .issue_with_ttl(&test_account(), Duration::seconds(-5))
            .unwrap();

        assert_eq!(tokens.verify(&token), Err(InvalidToken));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let tokens = service();
        let token = tokens.issue(&test_account()).unwrap();

        // Flip the final character of the signature segment.
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert_eq!(tokens.verify(&tampered), Err(InvalidToken));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let tokens = service();
        assert_eq!(tokens.verify(""), Err(InvalidToken));
        assert_eq!(tokens.verify("not.a.token"), Err(InvalidToken));
        assert_eq!(tokens.verify("missing-separators"), Err(InvalidToken));
    }

    #[test]
    fn test_secret_rotation_invalidates_outstanding_tokens() {
        let before = TokenService::new("secret-one", Duration::hours(1));
        let after = TokenService::new("secret-two", Duration::hours(1));

        let token = before.issue(&test_account()).unwrap();
        assert!(before.verify(&token).is_ok());
        assert_eq!(after.verify(&token), Err(InvalidToken));
    }
}
