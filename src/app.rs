use std::error::Error;
use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::bootstrap::build_state;
use crate::infrastructure::config::load_config;
use crate::interfaces::http::start_server;

pub async fn run() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();

    let config = load_config(Path::new("."))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let state = build_state(&config).await?;

    info!(
        host = %config.server.host,
        port = config.server.port,
        backend = state.cleaner.backend_name(),
        "Starting CSV cleaner"
    );

    start_server(
        state,
        &config.server.host,
        config.server.port,
        config.server.max_upload_bytes,
    )?
    .await?;

    Ok(())
}
