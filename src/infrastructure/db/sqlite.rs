use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::debug;

use super::{user_insert_error, CleaningStore, HistoryEntity, UserEntity};
use crate::domain::error::{AppError, Result};
use crate::domain::history::{HistoryRecord, NewHistoryEntry};
use crate::domain::user::User;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file at `path`
    pub async fn connect(path: &Path, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        Self::init(pool).await
    }

    /// Private in-memory database, kept alive on a single connection
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            AppError::DatabaseError(format!("Failed to parse connection string: {}", e))
        })?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        Self::init(pool).await
    }

    async fn init(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create users table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cleaning_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                filename TEXT NOT NULL,
                original_rows INTEGER NOT NULL,
                cleaned_rows INTEGER NOT NULL,
                operations TEXT NOT NULL,
                cleaned_at TIMESTAMP NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to create cleaning_history table: {}", e))
        })?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl CleaningStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "SQLite"
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let created_at = chrono::Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, password, created_at) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(user_insert_error)?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Some(created_at),
        })
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, UserEntity>(
            "SELECT id, username, password, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user: {}", e)))
        .map(|entity| entity.map(User::from))
    }

    async fn insert_history(&self, entry: &NewHistoryEntry) -> Result<HistoryRecord> {
        let cleaned_at = chrono::Utc::now();
        let result = sqlx::query(
            "INSERT INTO cleaning_history
                (user_id, filename, original_rows, cleaned_rows, operations, cleaned_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.user_id)
        .bind(&entry.filename)
        .bind(entry.original_rows)
        .bind(entry.cleaned_rows)
        .bind(&entry.operations)
        .bind(cleaned_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to save history: {}", e)))?;

        debug!(user_id = entry.user_id, filename = %entry.filename, "Saved cleaning history");

        Ok(HistoryRecord {
            id: result.last_insert_rowid(),
            filename: entry.filename.clone(),
            original_rows: entry.original_rows,
            cleaned_rows: entry.cleaned_rows,
            operations: entry.operations.clone(),
            cleaned_at,
        })
    }

    async fn recent_history(&self, user_id: i64, limit: i64) -> Result<Vec<HistoryRecord>> {
        sqlx::query_as::<_, HistoryEntity>(
            "SELECT id, filename, original_rows, cleaned_rows, operations, cleaned_at
             FROM cleaning_history
             WHERE user_id = ?
             ORDER BY cleaned_at DESC, id DESC
             LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch history: {}", e)))
        .map(|entities| entities.into_iter().map(|e| e.into()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::read_column;

    fn entry(user_id: i64, filename: &str) -> NewHistoryEntry {
        NewHistoryEntry {
            user_id,
            filename: filename.to_string(),
            original_rows: 3,
            cleaned_rows: 1,
            operations: "Remove Duplicates, Remove NULL Values".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_user() {
        let store = SqliteStore::in_memory().await.unwrap();

        let user = store.insert_user("alice", "hash").await.unwrap();
        let found = store.find_user("alice").await.unwrap().unwrap();

        assert_eq!(found.id, user.id);
        assert_eq!(found.password_hash, "hash");
        assert!(store.find_user("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.insert_user("alice", "hash").await.unwrap();

        let result = store.insert_user("alice", "other").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_recent_history_is_per_user_newest_first() {
        let store = SqliteStore::in_memory().await.unwrap();
        let alice = store.insert_user("alice", "hash").await.unwrap();
        let bob = store.insert_user("bob", "hash").await.unwrap();

        for i in 0..12 {
            store
                .insert_history(&entry(alice.id, &format!("file{}.csv", i)))
                .await
                .unwrap();
        }
        store.insert_history(&entry(bob.id, "bob.csv")).await.unwrap();

        let history = store.recent_history(alice.id, 10).await.unwrap();
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].filename, "file11.csv");
        assert!(history.iter().all(|h| h.filename != "bob.csv"));
        assert_eq!(history[0].operations, "Remove Duplicates, Remove NULL Values");

        let history = store.recent_history(bob.id, 10).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_read_column_maps_missing_column() {
        let store = SqliteStore::in_memory().await.unwrap();
        let row = sqlx::query("SELECT 42 AS id")
            .fetch_one(&store.pool)
            .await
            .unwrap();

        let id: i64 = read_column(&row, "id").unwrap();
        assert_eq!(id, 42);

        let missing = read_column::<_, chrono::DateTime<chrono::Utc>>(&row, "cleaned_at");
        assert!(matches!(missing, Err(AppError::DatabaseError(msg)) if msg.contains("cleaned_at")));
    }
}
