use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::jwt::TokenIssuer;
use crate::auth::password::{hash_off_thread, verify_off_thread, CredentialHasher};
use crate::error::{AccountError, AccountResult};
use crate::users::repo::UserStore;
use crate::validation::normalize_email;

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
}

/// Login and password change.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
    issuer: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            store,
            hasher,
            issuer,
        }
    }

    /// Fails with `NotFound` for an unknown email and `InvalidCredentials`
    /// for a wrong password; callers decide whether to tell them apart.
    pub async fn login(&self, email: &str, password: &str) -> AccountResult<LoginOutcome> {
        let email = normalize_email(email);
        let user = match self.store.find_by_email(&email).await? {
            Some(u) => u,
            None => {
                verify_off_thread(&self.hasher, password, self.hasher.decoy_hash()).await?;
                warn!(email = %email, "login unknown email");
                return Err(AccountError::NotFound(format!("User with email {email}")));
            }
        };

        if !verify_off_thread(&self.hasher, password, &user.password_hash).await? {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AccountError::InvalidCredentials);
        }

        let token = self.issuer.issue(&user).map_err(AccountError::unavailable)?;

        info!(user_id = %user.id, email = %user.email, "user logged in");
        Ok(LoginOutcome {
            token,
            user_id: user.id,
            email: user.email,
        })
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> AccountResult<()> {
        let mut user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("User with ID {user_id}")))?;

        if !verify_off_thread(&self.hasher, old_password, &user.password_hash).await? {
            warn!(user_id = %user_id, "change password with wrong old password");
            return Err(AccountError::InvalidCredentials);
        }

        user.password_hash = hash_off_thread(&self.hasher, new_password).await?;
        user.touch(OffsetDateTime::now_utc());
        self.store.save(user).await?;

        info!(user_id = %user_id, "password changed");
        Ok(())
    }
}
