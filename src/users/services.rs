use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_off_thread, CredentialHasher};
use crate::error::{AccountError, AccountResult};
use crate::users::repo::UserStore;
use crate::users::repo_types::{User, UserUpdate};
use crate::validation::normalize_email;

/// Data needed to create an account. `password` is plaintext and is hashed
/// before anything is persisted.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
}

/// Registration, profile management and external identity linking.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn CredentialHasher>,
}

impl AccountService {
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { store, hasher }
    }

    pub async fn register(&self, input: NewAccount) -> AccountResult<User> {
        let email = normalize_email(&input.email);

        // Fast path only; `save` is what actually guards uniqueness.
        if self.store.exists_by_email(&email).await? {
            warn!(email = %email, "registration with existing email");
            return Err(AccountError::AlreadyExists(format!("User with email {email}")));
        }

        let password_hash = hash_off_thread(&self.hasher, &input.password).await?;
        let user = User::new(
            email,
            password_hash,
            input.first_name,
            input.last_name,
            input.phone_number,
            OffsetDateTime::now_utc(),
        );

        let user = self.store.save(user).await?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    pub async fn get_by_id(&self, id: Uuid) -> AccountResult<User> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("User with ID {id}")))
    }

    pub async fn get_by_external_identity_id(&self, external_id: &str) -> AccountResult<User> {
        self.store
            .find_by_external_identity_id(external_id)
            .await?
            .ok_or_else(|| {
                AccountError::NotFound(format!("User with external identity {external_id}"))
            })
    }

    pub async fn update(&self, id: Uuid, changes: UserUpdate) -> AccountResult<User> {
        let mut user = self.get_by_id(id).await?;
        changes.apply(&mut user);
        user.touch(OffsetDateTime::now_utc());

        let user = self.store.save(user).await?;
        info!(user_id = %user.id, "user updated");
        Ok(user)
    }

    pub async fn link_external_identity(
        &self,
        email: &str,
        external_id: &str,
    ) -> AccountResult<User> {
        let email = normalize_email(email);
        let mut user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AccountError::NotFound(format!("User with email {email}")))?;

        if let Some(owner) = self.store.find_by_external_identity_id(external_id).await? {
            if owner.id == user.id {
                return Ok(owner);
            }
            warn!(external_id, user_id = %user.id, owner_id = %owner.id, "external identity already linked");
            return Err(AccountError::AlreadyExists(format!(
                "External identity {external_id}"
            )));
        }

        user.external_identity_id = Some(external_id.to_string());
        user.touch(OffsetDateTime::now_utc());

        let user = self.store.save(user).await?;
        info!(external_id, user_id = %user.id, "external identity linked");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::Argon2Hasher;
    use crate::test_support::{DownStore, FakeHasher};
    use crate::users::memory::InMemoryUserStore;
    use std::time::Duration;

    fn service() -> AccountService {
        AccountService::new(Arc::new(InMemoryUserStore::new()), Arc::new(FakeHasher))
    }

    fn account(email: &str, password: &str) -> NewAccount {
        NewAccount {
            email: email.into(),
            password: password.into(),
            first_name: "A".into(),
            last_name: "B".into(),
            phone_number: None,
        }
    }

    #[tokio::test]
    async fn register_hashes_password_and_stamps_times() {
        let svc = AccountService::new(Arc::new(InMemoryUserStore::new()), Arc::new(Argon2Hasher));
        let user = svc.register(account("a@x.com", "p1")).await.unwrap();

        assert_ne!(user.password_hash, "p1");
        assert!(Argon2Hasher.verify("p1", &user.password_hash).unwrap());
        assert_eq!(user.created_at, user.updated_at);
        assert!(user.external_identity_id.is_none());
    }

    #[tokio::test]
    async fn distinct_emails_all_register() {
        let svc = service();
        let mut ids = Vec::new();
        for email in ["a@x.com", "b@x.com", "c@x.com"] {
            let user = svc.register(account(email, "secret")).await.unwrap();
            assert_ne!(user.password_hash, "secret");
            ids.push(user.id);
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_regardless_of_other_fields() {
        let svc = service();
        svc.register(account("a@x.com", "p1")).await.unwrap();

        let mut again = account("a@x.com", "different");
        again.first_name = "Other".into();
        again.phone_number = Some("+1".into());
        let err = svc.register(again).await.unwrap_err();
        assert!(matches!(err, AccountError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn email_uniqueness_ignores_case_and_whitespace() {
        let svc = service();
        let user = svc.register(account("  Alice@Example.com", "p1")).await.unwrap();
        assert_eq!(user.email, "alice@example.com");

        let err = svc.register(account("ALICE@example.COM", "p1")).await.unwrap_err();
        assert!(matches!(err, AccountError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn get_by_id_and_missing_user() {
        let svc = service();
        let user = svc.register(account("a@x.com", "p1")).await.unwrap();
        assert_eq!(svc.get_by_id(user.id).await.unwrap().email, "a@x.com");

        let err = svc.get_by_id(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_with_only_phone_keeps_names_and_advances_updated_at() {
        let svc = service();
        let user = svc.register(account("a@x.com", "p1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let updated = svc
            .update(
                user.id,
                UserUpdate {
                    phone_number: Some("+123".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name, "A");
        assert_eq!(updated.last_name, "B");
        assert_eq!(updated.phone_number.as_deref(), Some("+123"));
        assert!(updated.updated_at > user.updated_at);
        assert_eq!(updated.created_at, user.created_at);
        assert_eq!(updated.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn update_missing_user_is_not_found() {
        let err = service()
            .update(Uuid::new_v4(), UserUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn link_external_identity_sets_field_and_is_findable() {
        let svc = service();
        let user = svc.register(account("a@x.com", "p1")).await.unwrap();

        let linked = svc.link_external_identity("A@x.com", "idp|42").await.unwrap();
        assert_eq!(linked.id, user.id);
        assert_eq!(linked.external_identity_id.as_deref(), Some("idp|42"));

        let found = svc.get_by_external_identity_id("idp|42").await.unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn linking_same_identity_to_another_user_fails() {
        let svc = service();
        svc.register(account("a@x.com", "p1")).await.unwrap();
        svc.register(account("b@x.com", "p1")).await.unwrap();

        svc.link_external_identity("a@x.com", "idp|1").await.unwrap();
        let err = svc.link_external_identity("b@x.com", "idp|1").await.unwrap_err();
        assert!(matches!(err, AccountError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn relinking_same_user_is_idempotent() {
        let svc = service();
        svc.register(account("a@x.com", "p1")).await.unwrap();

        let first = svc.link_external_identity("a@x.com", "idp|1").await.unwrap();
        let second = svc.link_external_identity("a@x.com", "idp|1").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn link_unknown_email_or_lookup_unknown_identity_is_not_found() {
        let svc = service();
        let err = svc.link_external_identity("ghost@x.com", "idp|1").await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));

        let err = svc.get_by_external_identity_id("idp|nope").await.unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn store_guard_wins_when_precheck_is_raced() {
        let store = Arc::new(InMemoryUserStore::new());
        let svc = AccountService::new(store.clone(), Arc::new(FakeHasher));

        // Two registrations racing on the same email: exactly one may win.
        let (a, b) = tokio::join!(
            svc.register(account("race@x.com", "p1")),
            svc.register(account("race@x.com", "p2")),
        );
        let outcomes = [a.is_ok(), b.is_ok()];
        assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);
        for err in [a.err(), b.err()].into_iter().flatten() {
            assert!(matches!(err, AccountError::AlreadyExists(_)));
        }
        assert!(store.exists_by_email("race@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn store_failure_is_unavailable() {
        let svc = AccountService::new(Arc::new(DownStore), Arc::new(FakeHasher));
        let err = svc.register(account("a@x.com", "p1")).await.unwrap_err();
        assert!(matches!(err, AccountError::Unavailable(_)));
    }
}
