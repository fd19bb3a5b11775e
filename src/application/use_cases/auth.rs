use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::domain::error::{AppError, Result};
use crate::domain::user::{Credentials, User};
use crate::infrastructure::db::CleaningStore;
use crate::infrastructure::security::password::{hash_password, verify_password};
use crate::infrastructure::session_store::SessionStore;

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    pub user_id: i64,
    pub username: String,
}

pub struct AuthUseCase {
    store: Arc<dyn CleaningStore>,
    sessions: SessionStore,
}

impl AuthUseCase {
    pub fn new(store: Arc<dyn CleaningStore>, sessions: SessionStore) -> Self {
        Self { store, sessions }
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<User> {
        credentials.validate()?;

        let hash = hash_password(&credentials.password)?;
        let user = self.store.insert_user(&credentials.username, &hash).await?;

        info!(user_id = user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResult> {
        credentials.validate()?;

        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = self
            .store
            .find_user(&credentials.username)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&credentials.password, &user.password_hash)? {
            return Err(invalid());
        }

        let token = self.sessions.open(user.id, &user.username)?;
        info!(user_id = user.id, "User logged in");

        Ok(LoginResult {
            token,
            user_id: user.id,
            username: user.username,
        })
    }

    pub fn logout(&self, token: &str) -> Result<bool> {
        self.sessions.close(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::sqlite::SqliteStore;

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    async fn auth() -> (AuthUseCase, SessionStore) {
        let store = SqliteStore::in_memory().await.unwrap();
        let sessions = SessionStore::new();
        (AuthUseCase::new(Arc::new(store), sessions.clone()), sessions)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (auth, sessions) = auth().await;

        let user = auth.register(&creds("alice", "s3cret")).await.unwrap();
        assert_ne!(user.password_hash, "s3cret");

        let login = auth.login(&creds("alice", "s3cret")).await.unwrap();
        assert_eq!(login.user_id, user.id);
        assert_eq!(sessions.get(&login.token).unwrap().username, "alice");

        assert!(auth.logout(&login.token).unwrap());
        assert!(sessions.get(&login.token).is_err());
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (auth, _) = auth().await;
        auth.register(&creds("alice", "one")).await.unwrap();

        let result = auth.register(&creds("alice", "two")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (auth, _) = auth().await;
        auth.register(&creds("alice", "right")).await.unwrap();

        assert!(matches!(
            auth.login(&creds("alice", "wrong")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.login(&creds("nobody", "right")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.login(&creds("", "right")).await,
            Err(AppError::ValidationError(_))
        ));
    }
}
