use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use super::{read_column, user_insert_error, CleaningStore, HistoryEntity, UserEntity};
use crate::domain::error::{AppError, Result};
use crate::domain::history::{HistoryRecord, NewHistoryEntry};
use crate::domain::user::User;

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                username VARCHAR(255) UNIQUE NOT NULL,
                password VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create users table: {}", e)))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cleaning_history (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users(id),
                filename VARCHAR(255) NOT NULL,
                original_rows BIGINT NOT NULL,
                cleaned_rows BIGINT NOT NULL,
                operations TEXT NOT NULL,
                cleaned_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
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
impl CleaningStore for PostgresStore {
    fn backend_name(&self) -> &'static str {
        "PostgreSQL"
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User> {
        sqlx::query_as::<_, UserEntity>(
            "INSERT INTO users (username, password) VALUES ($1, $2)
             RETURNING id, username, password, created_at",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(user_insert_error)
        .map(User::from)
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, UserEntity>(
            "SELECT id, username, password, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user: {}", e)))
        .map(|entity| entity.map(User::from))
    }

    async fn insert_history(&self, entry: &NewHistoryEntry) -> Result<HistoryRecord> {
        let row = sqlx::query(
            "INSERT INTO cleaning_history
                (user_id, filename, original_rows, cleaned_rows, operations)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, cleaned_at",
        )
        .bind(entry.user_id)
        .bind(&entry.filename)
        .bind(entry.original_rows)
        .bind(entry.cleaned_rows)
        .bind(&entry.operations)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to save history: {}", e)))?;

        debug!(user_id = entry.user_id, filename = %entry.filename, "Saved cleaning history");

        Ok(HistoryRecord {
            id: read_column(&row, "id")?,
            filename: entry.filename.clone(),
            original_rows: entry.original_rows,
            cleaned_rows: entry.cleaned_rows,
            operations: entry.operations.clone(),
            cleaned_at: read_column(&row, "cleaned_at")?,
        })
    }

    async fn recent_history(&self, user_id: i64, limit: i64) -> Result<Vec<HistoryRecord>> {
        sqlx::query_as::<_, HistoryEntity>(
            "SELECT id, filename, original_rows, cleaned_rows, operations, cleaned_at
             FROM cleaning_history
             WHERE user_id = $1
             ORDER BY cleaned_at DESC, id DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch history: {}", e)))
        .map(|entities| entities.into_iter().map(|e| e.into()).collect())
    }
}
