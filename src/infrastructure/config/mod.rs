use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::domain::csv::DEFAULT_PREVIEW_ROWS;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::session_store::DEFAULT_IDLE_TIMEOUT;

pub const CONFIG_FILE: &str = "csv-cleaner.toml";
pub const ENV_PREFIX: &str = "CSV_CLEANER_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cleaner: CleanerConfig,
    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// Sessions unused for this many seconds are dropped
    pub session_idle_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// A postgres:// URL selects PostgreSQL; anything else uses SQLite
    pub url: Option<String>,
    pub sqlite_path: PathBuf,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanerConfig {
    pub preview_rows: usize,
    pub history_limit: i64,
    /// Load numeric-looking fields as numbers; string operations then skip them
    pub coerce_numeric: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cleaner: CleanerConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 16 * 1024 * 1024, // 16MB
            session_idle_secs: DEFAULT_IDLE_TIMEOUT.as_secs(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            sqlite_path: PathBuf::from("csv_cleaner.db"),
            max_connections: 5,
        }
    }
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
            history_limit: 10,
            coerce_numeric: false,
        }
    }
}

impl AppConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::ConfigError("server.port must be > 0".to_string()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(AppError::ConfigError(
                "server.max_upload_bytes must be > 0".to_string(),
            ));
        }
        if self.server.session_idle_secs == 0 {
            return Err(AppError::ConfigError(
                "server.session_idle_secs must be > 0".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(AppError::ConfigError(
                "database.max_connections must be > 0".to_string(),
            ));
        }
        if self.cleaner.preview_rows == 0 {
            return Err(AppError::ConfigError(
                "cleaner.preview_rows must be > 0".to_string(),
            ));
        }
        if self.cleaner.history_limit <= 0 {
            return Err(AppError::ConfigError(
                "cleaner.history_limit must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. `DATABASE_URL` and `PORT`
/// 2. Environment variables prefixed with `CSV_CLEANER_` (`CSV_CLEANER_CLEANER__PREVIEW_ROWS`)
/// 3. `csv-cleaner.toml` in `dir`
/// 4. Built-in defaults
pub fn load_config(dir: &Path) -> Result<AppConfig> {
    figment_for(dir)
        .extract::<AppConfig>()
        .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))
        .and_then(|config| {
            config.validate()?;
            Ok(config)
        })
}

fn figment_for(dir: &Path) -> Figment {
    Figment::from(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(dir.join(CONFIG_FILE)))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .merge(
            Env::raw()
                .only(&["DATABASE_URL"])
                .map(|_| "database.url".into()),
        )
        .merge(Env::raw().only(&["PORT"]).map(|_| "server.port".into()))
}
