use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::domain::error::{AppError, Result};

/// The last cleaned file of a session, kept for download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedArtifact {
    pub filename: String,
    pub csv: String,
}

impl CleanedArtifact {
    /// Name offered for the download
    pub fn download_name(&self) -> String {
        format!("cleaned_{}", self.filename)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    #[serde(skip)]
    pub last_cleaned: Option<CleanedArtifact>,
    #[serde(skip)]
    last_seen: Instant,
}

/// Sessions unused for this long are dropped
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(8 * 60 * 60);

/// In-memory sessions keyed by an opaque token
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Lock the map, dropping sessions idle past the timeout
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|_| AppError::Internal("Session store lock poisoned".to_string()))?;

        let before = sessions.len();
        let now = Instant::now();
        sessions.retain(|_, session| now.duration_since(session.last_seen) < self.idle_timeout);
        if sessions.len() < before {
            debug!(evicted = before - sessions.len(), "Evicted idle sessions");
        }

        Ok(sessions)
    }

    /// Open a session and return its token
    pub fn open(&self, user_id: i64, username: &str) -> Result<String> {
        let token = uuid::Uuid::new_v4().to_string();
        self.lock()?.insert(
            token.clone(),
            Session {
                user_id,
                username: username.to_string(),
                last_cleaned: None,
                last_seen: Instant::now(),
            },
        );
        Ok(token)
    }

    /// Look up a live session and mark it as used
    pub fn get(&self, token: &str) -> Result<Session> {
        let mut sessions = self.lock()?;
        let session = sessions
            .get_mut(token)
            .ok_or_else(|| AppError::Unauthorized("Please log in".to_string()))?;
        session.last_seen = Instant::now();
        Ok(session.clone())
    }

    /// Number of live sessions
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Replace the session's cleaned artifact
    pub fn store_cleaned(&self, token: &str, artifact: CleanedArtifact) -> Result<()> {
        let mut sessions = self.lock()?;
        let session = sessions
            .get_mut(token)
            .ok_or_else(|| AppError::Unauthorized("Please log in".to_string()))?;
        session.last_cleaned = Some(artifact);
        Ok(())
    }

    pub fn cleaned(&self, token: &str) -> Result<CleanedArtifact> {
        self.get(token)?
            .last_cleaned
            .ok_or_else(|| AppError::NotFound("No cleaned file in this session".to_string()))
    }

    /// Drop the session; returns whether it existed
    pub fn close(&self, token: &str) -> Result<bool> {
        Ok(self.lock()?.remove(token).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let store = SessionStore::new();
        let token = store.open(7, "alice").unwrap();

        let session = store.get(&token).unwrap();
        assert_eq!(session.user_id, 7);
        assert!(matches!(store.cleaned(&token), Err(AppError::NotFound(_))));

        store
            .store_cleaned(
                &token,
                CleanedArtifact {
                    filename: "data.csv".to_string(),
                    csv: "a\n1\n".to_string(),
                },
            )
            .unwrap();
        let artifact = store.cleaned(&token).unwrap();
        assert_eq!(artifact.download_name(), "cleaned_data.csv");

        assert!(store.close(&token).unwrap());
        assert!(matches!(store.get(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_idle_sessions_are_evicted() {
        let store = SessionStore::with_idle_timeout(Duration::ZERO);
        let token = store.open(7, "alice").unwrap();

        assert!(matches!(store.get(&token), Err(AppError::Unauthorized(_))));
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn test_active_sessions_survive_eviction() {
        let store = SessionStore::new();
        let first = store.open(1, "alice").unwrap();
        store.open(2, "bob").unwrap();

        assert_eq!(store.get(&first).unwrap().username, "alice");
        assert_eq!(store.len().unwrap(), 2);
    }
}
