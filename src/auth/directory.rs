//! User directory contract and the in-memory implementation.
//!
//! The request handlers depend only on the trait; a durable backend can be
//! swapped in without touching the token, password or rate-limit code.

use crate::auth::models::Account;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Failure modes for account insertion.
#[derive(Debug)]
pub enum InsertError {
    /// An account with the same normalized email already exists.
    DuplicateEmail,
    /// Backend failure unrelated to uniqueness.
    Storage(anyhow::Error),
}

impl std::fmt::Display for InsertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsertError::DuplicateEmail => write!(f, "an account with this email already exists"),
            InsertError::Storage(e) => write!(f, "account storage failed: {}", e),
        }
    }
}

impl std::error::Error for InsertError {}

/// Lookup and insert of account records keyed by normalized email.
///
/// Callers pass already-normalized emails. Implementations must make
/// `insert` atomic per key: two concurrent signups for one email may not
/// both succeed.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn insert(&self, account: Account) -> Result<(), InsertError>;

    async fn update_last_login(&self, email: &str, at: DateTime<Utc>) -> Result<()>;

    async fn mark_email_verified(&self, email: &str) -> Result<()>;
}

/// Process-memory directory. State is lost on restart; production deploys
/// back this contract with a durable store.
#[derive(Default)]
pub struct InMemoryDirectory {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self.accounts.read().get(email).cloned())
    }

    async fn insert(&self, account: Account) -> Result<(), InsertError> {
        // Check and insert under one write lock so simultaneous signups
        // for the same email serialize.
        let mut accounts = self.accounts.write();
        if accounts.contains_key(&account.email) {
            return Err(InsertError::DuplicateEmail);
        }
        accounts.insert(account.email.clone(), account);
        Ok(())
    }

    async fn update_last_login(&self, email: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(account) = self.accounts.write().get_mut(email) {
            account.last_login = Some(at);
        }
        Ok(())
    }

    async fn mark_email_verified(&self, email: &str) -> Result<()> {
        if let Some(account) = self.accounts.write().get_mut(email) {
            account.email_verified = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::AccountType;

    fn account(email: &str) -> Account {
        Account::new(email.into(), "digest".into(), "A".into(), AccountType::Investor)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let dir = InMemoryDirectory::new();
        dir.insert(account("a@x.com")).await.unwrap();

        let found = dir.find_by_email("a@x.com").await.unwrap();
        assert_eq!(found.unwrap().email, "a@x.com");

        assert!(dir.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let dir = InMemoryDirectory::new();
        dir.insert(account("a@x.com")).await.unwrap();

        match dir.insert(account("a@x.com")).await {
            Err(InsertError::DuplicateEmail) => {}
            other => panic!("expected duplicate rejection, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_concurrent_signups_single_winner() {
        let dir = std::sync::Arc::new(InMemoryDirectory::new());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let dir = dir.clone();
            handles.push(tokio::spawn(
                async move { dir.insert(account("a@x.com")).await },
            ));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_last_login_and_verification_updates() {
        let dir = InMemoryDirectory::new();
        dir.insert(account("a@x.com")).await.unwrap();

        let at = Utc::now();
        dir.update_last_login("a@x.com", at).await.unwrap();
        dir.mark_email_verified("a@x.com").await.unwrap();

        let stored = dir.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.last_login, Some(at));
        assert!(stored.email_verified);
    }
}
