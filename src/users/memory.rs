use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AccountError, AccountResult};
use crate::users::repo::UserStore;
use crate::users::repo_types::User;

/// In-memory implementation of [`UserStore`] (tests and local runs).
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> AccountResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_external_identity_id(
        &self,
        external_id: &str,
    ) -> AccountResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.external_identity_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> AccountResult<bool> {
        let users = self.users.read().await;
        Ok(users.values().any(|u| u.email == email))
    }

    async fn save(&self, mut user: User) -> AccountResult<User> {
        // Uniqueness scan and write happen under the same write guard.
        let mut users = self.users.write().await;

        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(AccountError::AlreadyExists(format!(
                "User with email {}",
                user.email
            )));
        }

        if let Some(external_id) = user.external_identity_id.as_deref() {
            let taken = users.values().any(|u| {
                u.id != user.id && u.external_identity_id.as_deref() == Some(external_id)
            });
            if taken {
                return Err(AccountError::AlreadyExists(format!(
                    "External identity {external_id}"
                )));
            }
        }

        if let Some(existing) = users.get(&user.id) {
            user.created_at = existing.created_at;
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }
}
