pub mod postgres;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::domain::history::{HistoryRecord, NewHistoryEntry};
use crate::domain::user::User;
use crate::infrastructure::config::DatabaseConfig;
use postgres::PostgresStore;
use sqlite::SqliteStore;

/// Persistence for accounts and cleaning history
#[async_trait]
pub trait CleaningStore: Send + Sync {
    /// Human-readable backend name
    fn backend_name(&self) -> &'static str;

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User>;

    async fn find_user(&self, username: &str) -> Result<Option<User>>;

    /// Insert a history row; the store assigns the timestamp
    async fn insert_history(&self, entry: &NewHistoryEntry) -> Result<HistoryRecord>;

    /// Most recent runs of one user, newest first
    async fn recent_history(&self, user_id: i64, limit: i64) -> Result<Vec<HistoryRecord>>;
}

/// PostgreSQL when a postgres URL is configured, the SQLite file otherwise
pub async fn connect_store(config: &DatabaseConfig) -> Result<Arc<dyn CleaningStore>> {
    match config.url.as_deref() {
        Some(url) if is_postgres_url(url) => {
            info!("Using PostgreSQL history store");
            let store = PostgresStore::connect(url, config.max_connections).await?;
            Ok(Arc::new(store))
        }
        _ => {
            info!(path = %config.sqlite_path.display(), "Using SQLite history store");
            let store = SqliteStore::connect(&config.sqlite_path, config.max_connections).await?;
            Ok(Arc::new(store))
        }
    }
}

fn is_postgres_url(url: &str) -> bool {
    url.starts_with("postgres://") || url.starts_with("postgresql://")
}

/// Map a failed user insert, reporting taken usernames as a conflict
fn user_insert_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict("Username already exists".to_string())
        }
        _ => AppError::DatabaseError(format!("Failed to insert user: {}", err)),
    }
}

/// Read a column from a raw row, reporting a missing or mistyped column as a database error
fn read_column<'r, R, T>(row: &'r R, name: &'static str) -> Result<T>
where
    R: sqlx::Row,
    T: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    &'static str: sqlx::ColumnIndex<R>,
{
    row.try_get(name)
        .map_err(|e| AppError::DatabaseError(format!("Failed to read column '{}': {}", name, e)))
}

// Internal entities for database mapping
#[derive(sqlx::FromRow)]
struct UserEntity {
    id: i64,
    username: String,
    password: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserEntity> for User {
    fn from(e: UserEntity) -> Self {
        Self {
            id: e.id,
            username: e.username,
            password_hash: e.password,
            created_at: Some(e.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct HistoryEntity {
    id: i64,
    filename: String,
    original_rows: i64,
    cleaned_rows: i64,
    operations: String,
    cleaned_at: chrono::DateTime<chrono::Utc>,
}

impl From<HistoryEntity> for HistoryRecord {
    fn from(e: HistoryEntity) -> Self {
        Self {
            id: e.id,
            filename: e.filename,
            original_rows: e.original_rows,
            cleaned_rows: e.cleaned_rows,
            operations: e.operations,
            cleaned_at: e.cleaned_at,
        }
    }
}
