//! Local storage primitives shared by the roster surfaces.
//!
//! Everything the application persists goes through [`KeyValueStore`]: a
//! namespaced key maps to one serialized value. [`SqlStore`] keeps entries in
//! the `kv_entries` table, [`MemoryStore`] keeps them in process for tests.

mod kv;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::info;

pub use kv::{KeyValueStore, MemoryStore, SqlStore};

/// Shared connection alias.
pub type DbPool = DatabaseConnection;

/// Type-erased backend for surfaces that pick storage at runtime.
pub type DynStore = std::sync::Arc<dyn KeyValueStore>;

const DEFAULT_DATABASE_URL: &str = "sqlite://roster.db?mode=rwc";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Environment-driven connection settings.
#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    env_key: String,
    url: Option<String>,
}

fn default_url_key() -> String {
    "DATABASE_URL".to_string()
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            env_key: default_url_key(),
            url: None,
        }
    }
}

impl DatabaseSettings {
    pub fn new(env_key: impl Into<String>) -> Self {
        Self {
            env_key: env_key.into(),
            url: None,
        }
    }

    /// Pin an explicit URL, bypassing the environment.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn database_url(&self) -> String {
        self.url
            .clone()
            .or_else(|| std::env::var(&self.env_key).ok())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }
}

pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    let url = settings.database_url();
    let mut options = ConnectOptions::new(url.clone());
    options.sqlx_logging(false);
    let pool = Database::connect(options).await?;
    info!(%url, "storage connected");
    Ok(pool)
}
