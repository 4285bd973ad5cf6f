use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::error;

use crate::error::{AccountError, AccountResult};

/// One-way password hashing primitive.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plain: &str) -> anyhow::Result<String>;
    fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool>;
    /// A well-formed hash that no password matches. Login verifies against it
    /// when the email is unknown so both paths cost one verification.
    fn decoy_hash(&self) -> &str;
}

/// Argon2id with the crate's default parameters over a random secret.
pub const DECOY_ARGON2_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$TuZfnel1FOGd0WSNdvAfYw$CecKpBk2yMz/BlkoVddgqJenyE696DShPyR8Do1cDTY";

#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        hash_password(plain)
    }

    fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        verify_password(plain, hash)
    }

    fn decoy_hash(&self) -> &str {
        DECOY_ARGON2_HASH
    }
}

/// Runs [`CredentialHasher::hash`] on the blocking pool.
pub async fn hash_off_thread(
    hasher: &Arc<dyn CredentialHasher>,
    plain: &str,
) -> AccountResult<String> {
    let hasher = Arc::clone(hasher);
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || hasher.hash(&plain))
        .await
        .map_err(AccountError::unavailable)?
        .map_err(AccountError::unavailable)
}

/// Runs [`CredentialHasher::verify`] on the blocking pool.
pub async fn verify_off_thread(
    hasher: &Arc<dyn CredentialHasher>,
    plain: &str,
    hash: &str,
) -> AccountResult<bool> {
    let hasher = Arc::clone(hasher);
    let (plain, hash) = (plain.to_owned(), hash.to_owned());
    tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
        .await
        .map_err(AccountError::unavailable)?
        .map_err(AccountError::unavailable)
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
