use std::time::Duration;

use tracing::error;

use crate::application::{AuthUseCase, CleanFileUseCase};
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::connect_store;
use crate::infrastructure::session_store::SessionStore;
use crate::interfaces::http::HttpState;

/// Connect the history store and wire the use cases behind the HTTP API
pub async fn build_state(config: &AppConfig) -> Result<HttpState> {
    let store = connect_store(&config.database).await.map_err(|err| {
        error!(error = %err, "Failed to connect history store");
        err
    })?;

    let sessions =
        SessionStore::with_idle_timeout(Duration::from_secs(config.server.session_idle_secs));

    Ok(HttpState {
        auth: AuthUseCase::new(store.clone(), sessions.clone()),
        cleaner: CleanFileUseCase::new(store, config.cleaner.clone()),
        sessions,
    })
}
