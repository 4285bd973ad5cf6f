//! Test doubles shared by the service and handler tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::jwt::TokenIssuer;
use crate::auth::password::CredentialHasher;
use crate::error::{AccountError, AccountResult};
use crate::users::repo::UserStore;
use crate::users::repo_types::User;

/// Stand-in for Argon2 so tests do not pay the hashing cost on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeHasher;

impl CredentialHasher for FakeHasher {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        Ok(format!("fake${}", plain.chars().rev().collect::<String>()))
    }

    fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        Ok(self.hash(plain)? == hash)
    }

    fn decoy_hash(&self) -> &str {
        "fake-decoy"
    }
}

/// [`FakeHasher`] that records how many verifications it performed.
#[derive(Debug, Clone, Default)]
pub struct CountingHasher {
    verifies: Arc<AtomicUsize>,
}

impl CountingHasher {
    pub fn verifies(&self) -> usize {
        self.verifies.load(Ordering::SeqCst)
    }
}

impl CredentialHasher for CountingHasher {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        FakeHasher.hash(plain)
    }

    fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        self.verifies.fetch_add(1, Ordering::SeqCst);
        FakeHasher.verify(plain, hash)
    }

    fn decoy_hash(&self) -> &str {
        FakeHasher.decoy_hash()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FakeIssuer;

impl TokenIssuer for FakeIssuer {
    fn issue(&self, user: &User) -> anyhow::Result<String> {
        Ok(format!("token-for-{}", user.id))
    }
}

/// Store whose backend is permanently down.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownStore;

fn down() -> AccountError {
    AccountError::unavailable(anyhow::anyhow!("connection refused"))
}

#[async_trait]
impl UserStore for DownStore {
    async fn find_by_id(&self, _id: Uuid) -> AccountResult<Option<User>> {
        Err(down())
    }
    async fn find_by_email(&self, _email: &str) -> AccountResult<Option<User>> {
        Err(down())
    }
    async fn find_by_external_identity_id(&self, _id: &str) -> AccountResult<Option<User>> {
        Err(down())
    }
    async fn exists_by_email(&self, _email: &str) -> AccountResult<bool> {
        Err(down())
    }
    async fn save(&self, _user: User) -> AccountResult<User> {
        Err(down())
    }
}
