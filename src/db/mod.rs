use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::users;
use crate::models::user::GOOGLE_USERNAME_PREFIX;
use crate::models::{SearchHistoryEntry, User};

pub mod migrator;
pub mod repositories;

use repositories::user::{InsertOutcome, hash_password, verify_password};

/// Outcome of registering a local account.
#[derive(Debug)]
pub enum CreateUserOutcome {
    Created(User),
    UsernameTaken,
}

/// Handle to the credential store. Cheap to clone; every clone shares the
/// same connection pool.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:") || db_url.contains("mode=memory");

        if !in_memory {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:")
                .split('?')
                .next()
                .unwrap_or_default();
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Each pooled connection to an in-memory database is its own database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn history_repo(&self) -> repositories::search_history::SearchHistoryRepository {
        repositories::search_history::SearchHistoryRepository::new(self.conn.clone())
    }

    async fn hydrate(&self, model: users::Model) -> Result<User> {
        let search_history = self.history_repo().list_for_user(model.id).await?;

        Ok(User {
            id: model.id,
            username: model.username,
            google_token: model.google_token,
            search_history,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }

    /// Full user record, history included, or `None` if no such username.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.user_repo().get_by_username(username).await? {
            Some(model) => Ok(Some(self.hydrate(model).await?)),
            None => Ok(None),
        }
    }

    /// Registers a local account. Uniqueness is enforced by the database, not
    /// by a prior lookup.
    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        security: &SecurityConfig,
    ) -> Result<CreateUserOutcome> {
        let password = password.to_string();
        let security = security.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, &security))
            .await
            .map_err(|e| anyhow::anyhow!("Password hashing task panicked: {e}"))??;

        match self
            .user_repo()
            .insert(username, Some(password_hash), None)
            .await?
        {
            InsertOutcome::Created(model) => Ok(CreateUserOutcome::Created(self.hydrate(model).await?)),
            InsertOutcome::Duplicate => Ok(CreateUserOutcome::UsernameTaken),
        }
    }

    /// Finds the account linked to a Google token, creating an OAuth-only
    /// account on first sight. Linking always goes through `google_token`.
    pub async fn find_or_create_google_user(&self, token: &str) -> Result<User> {
        let repo = self.user_repo();

        if let Some(model) = repo.get_by_google_token(token).await? {
            return self.hydrate(model).await;
        }

        let username = format!("{GOOGLE_USERNAME_PREFIX}{}", uuid::Uuid::new_v4().simple());

        match repo.insert(&username, None, Some(token.to_string())).await? {
            InsertOutcome::Created(model) => {
                info!(username = %model.username, "Created account for Google login");
                self.hydrate(model).await
            }
            // A concurrent login linked the token first.
            InsertOutcome::Duplicate => {
                let model = repo
                    .get_by_google_token(token)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("Google account vanished after insert conflict"))?;
                self.hydrate(model).await
            }
        }
    }

    /// Checks a login attempt against the `users` row alone; the search
    /// history is not loaded. Returns the username on a match, `None` for an
    /// unknown user or a wrong password.
    pub async fn verify_credentials(&self, username: &str, candidate: &str) -> Result<Option<String>> {
        let Some(model) = self.user_repo().get_by_username(username).await? else {
            return Ok(None);
        };

        if verify_password(model.password_hash, candidate).await? {
            Ok(Some(model.username))
        } else {
            Ok(None)
        }
    }

    /// Appends one history entry and returns the user as now stored.
    pub async fn append_search_history(&self, user: &User, entry: &SearchHistoryEntry) -> Result<User> {
        self.history_repo().append(user.id, entry).await?;

        let search_history = self.history_repo().list_for_user(user.id).await?;
        Ok(User {
            search_history,
            ..user.clone()
        })
    }
}
