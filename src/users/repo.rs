use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AccountError, AccountResult};
use crate::users::repo_types::User;

/// Persistence seam for user records.
///
/// Implementations own the uniqueness of `email` and `external_identity_id`:
/// `save` must reject a conflicting write with [`AccountError::AlreadyExists`]
/// as part of the write itself, whatever the caller checked beforehand.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AccountResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>>;

    async fn find_by_external_identity_id(&self, external_id: &str)
        -> AccountResult<Option<User>>;

    async fn exists_by_email(&self, email: &str) -> AccountResult<bool>;

    /// Inserts the user if its id is unknown, otherwise updates it.
    /// `created_at` of an existing row is left untouched.
    async fn save(&self, user: User) -> AccountResult<User>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> AccountResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_identity_id, email, password_hash, first_name, last_name,
                   phone_number, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(AccountError::unavailable)
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_identity_id, email, password_hash, first_name, last_name,
                   phone_number, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(AccountError::unavailable)
    }

    async fn find_by_external_identity_id(
        &self,
        external_id: &str,
    ) -> AccountResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_identity_id, email, password_hash, first_name, last_name,
                   phone_number, created_at, updated_at
            FROM users
            WHERE external_identity_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.db)
        .await
        .map_err(AccountError::unavailable)
    }

    async fn exists_by_email(&self, email: &str) -> AccountResult<bool> {
        sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)"#)
            .bind(email)
            .fetch_one(&self.db)
            .await
            .map_err(AccountError::unavailable)
    }

    async fn save(&self, user: User) -> AccountResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, external_identity_id, email, password_hash, first_name,
                               last_name, phone_number, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                external_identity_id = EXCLUDED.external_identity_id,
                email = EXCLUDED.email,
                password_hash = EXCLUDED.password_hash,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                phone_number = EXCLUDED.phone_number,
                updated_at = EXCLUDED.updated_at
            RETURNING id, external_identity_id, email, password_hash, first_name, last_name,
                      phone_number, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.external_identity_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_number)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_error(e, &user))
    }
}

const EXTERNAL_IDENTITY_CONSTRAINT: &str = "users_external_identity_id_key";

fn map_write_error(e: sqlx::Error, user: &User) -> AccountError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some(EXTERNAL_IDENTITY_CONSTRAINT) => AccountError::AlreadyExists(format!(
                    "External identity {}",
                    user.external_identity_id.as_deref().unwrap_or_default()
                )),
                _ => AccountError::AlreadyExists(format!("User with email {}", user.email)),
            };
        }
    }
    AccountError::unavailable(e)
}
