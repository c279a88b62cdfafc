use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur when interacting with the SQLite store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] MigrateError),

    #[error("Failed to prepare database directory: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

/// Handle to the on-disk SQLite database.
///
/// Holds connection options only. Every operation opens its own connection
/// and closes it when done; nothing is pooled.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    options: SqliteConnectOptions,
}

impl SqliteStore {
    /// Open the store from a URL such as `sqlite://data/housing.db`.
    ///
    /// Creates the parent directory and the database file if needed and runs
    /// migrations.
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        Self::with_options(options).await
    }

    /// Open the store at a filesystem path
    pub async fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        Self::with_options(options).await
    }

    async fn with_options(options: SqliteConnectOptions) -> Result<Self, StoreError> {
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self { options };

        let mut conn = store.connect().await?;
        MIGRATOR.run(&mut conn).await?;
        conn.close().await?;

        tracing::info!("SQLite store ready at {}", store.options.get_filename().display());

        Ok(store)
    }

    /// Open a fresh connection. Callers close it when their operation is done.
    pub async fn connect(&self) -> Result<SqliteConnection, StoreError> {
        Ok(self.options.connect().await?)
    }

    /// Health check for the database file
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        let mut conn = self.connect().await?;
        sqlx::query("SELECT 1").fetch_one(&mut conn).await?;
        conn.close().await?;
        Ok(true)
    }
}
