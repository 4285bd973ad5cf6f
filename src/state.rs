use crate::auth::jwt::{JwtKeys, TokenIssuer};
use crate::auth::password::{Argon2Hasher, CredentialHasher};
use crate::auth::services::AuthService;
use crate::config::{AppConfig, StoreBackend};
use crate::users::memory::InMemoryUserStore;
use crate::users::repo::{PgUserStore, UserStore};
use crate::users::services::AccountService;
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: AccountService,
    pub auth: AuthService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL must be set")?;
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(config.database_max_connections)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory user store; data will not survive a restart");
                Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };
        let hasher = Arc::new(Argon2Hasher) as Arc<dyn CredentialHasher>;
        let issuer = Arc::new(JwtKeys::from(&config.jwt)) as Arc<dyn TokenIssuer>;

        Ok(Self::from_parts(config, store, hasher, issuer))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn CredentialHasher>,
        issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            accounts: AccountService::new(store.clone(), hasher.clone()),
            auth: AuthService::new(store, hasher, issuer),
            config,
        }
    }

    #[cfg(test)]
    pub fn fake(reveal_unknown_email: bool) -> Self {
        use crate::config::{AuthConfig, JwtConfig};
        use crate::test_support::{FakeHasher, FakeIssuer};

        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            database_url: None,
            database_max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
            },
            auth: AuthConfig {
                reveal_unknown_email,
            },
        });

        Self::from_parts(
            config,
            Arc::new(InMemoryUserStore::new()),
            Arc::new(FakeHasher),
            Arc::new(FakeIssuer),
        )
    }
}
