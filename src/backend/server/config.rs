/**
 * Server Configuration
 *
 * This module loads the server configuration and opens the optional
 * PostgreSQL connection.
 *
 * # Configuration Sources
 *
 * In order of precedence:
 * 1. Environment variables (a `.env` file is loaded by the binary)
 * 2. The TOML file named by `PIXELCOLLAB_CONFIG`, if set
 * 3. Built-in defaults
 *
 * | Variable                     | Field                   |
 * |------------------------------|-------------------------|
 * | `SERVER_PORT`                | `port`                  |
 * | `DATABASE_URL`               | `database_url`          |
 * | `JWT_SECRET`                 | `jwt_secret`            |
 * | `PIXELCOLLAB_LENIENT_TIMERS` | `lenient_timers`        |
 * | `PIXELCOLLAB_ROOM_CAPACITY`  | `room_capacity`         |
 * | `PIXELCOLLAB_CLEANUP_SECS`   | `cleanup_interval_secs` |
 *
 * # Error Handling
 *
 * A malformed value is a configuration error. A database that cannot be
 * reached is not: it is logged and the server falls back to the in-memory
 * store.
 */

use sqlx::PgPool;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::backend::store::{MemoryStore, PgStore, ProjectStoreAdapter};
use crate::shared::{ConfigError, FileConfig, ServerConfig};

pub const CONFIG_FILE_VAR: &str = "PIXELCOLLAB_CONFIG";

/// Database configuration result
///
/// Contains the database connection pool if successfully configured,
/// or `None` if the database is not available.
pub type DatabaseConfig = Option<PgPool>;

/// Read one environment variable and parse it
fn env_value<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| ConfigError::Invalid {
            field: name,
            message: e.to_string(),
        }),
        Err(_) => Ok(None),
    }
}

/// Read a TOML configuration file
pub fn load_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let text = std::fs::read_to_string(path)?;
    FileConfig::from_toml_str(&text)
}

/// Build the server configuration from the environment and optional file
pub fn load_config() -> Result<ServerConfig, ConfigError> {
    let mut builder = ServerConfig::builder();

    if let Some(port) = env_value::<u16>("SERVER_PORT")? {
        builder = builder.port(port);
    }
    if let Some(url) = env_value::<String>("DATABASE_URL")? {
        builder = builder.database_url(url);
    }
    if let Some(secret) = env_value::<String>("JWT_SECRET")? {
        builder = builder.jwt_secret(secret);
    }
    if let Some(lenient) = env_value::<bool>("PIXELCOLLAB_LENIENT_TIMERS")? {
        builder = builder.lenient_timers(lenient);
    }
    if let Some(capacity) = env_value::<usize>("PIXELCOLLAB_ROOM_CAPACITY")? {
        builder = builder.room_capacity(capacity);
    }
    if let Some(secs) = env_value::<u64>("PIXELCOLLAB_CLEANUP_SECS")? {
        builder = builder.cleanup_interval_secs(secs);
    }

    if let Some(path) = env_value::<String>(CONFIG_FILE_VAR)? {
        tracing::info!("Reading configuration file {}", path);
        builder = builder.with_file(load_config_file(Path::new(&path))?);
    }

    let config = builder.build()?;
    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set. Using the development secret.");
    }
    Ok(config)
}

/// Load and initialize database connection pool
///
/// This function:
/// 1. Reads the database URL from the configuration
/// 2. Creates a PostgreSQL connection pool
/// 3. Runs database migrations
///
/// # Returns
///
/// - `Some(PgPool)` if database is successfully configured
/// - `None` if no URL is configured or connection fails
pub async fn load_database(config: &ServerConfig) -> DatabaseConfig {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set. Projects will only be kept in memory.");
        return None;
    };

    tracing::info!("Connecting to database...");

    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Projects will only be kept in memory.");
            return None;
        }
    };

    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => {
            tracing::info!("Database migrations completed successfully");
        }
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }

    Some(pool)
}

/// Pick the store backend: PostgreSQL when a pool is available, memory otherwise
pub fn select_store(pool: DatabaseConfig) -> ProjectStoreAdapter {
    match pool {
        Some(pool) => ProjectStoreAdapter::new(Arc::new(PgStore::new(pool))),
        None => ProjectStoreAdapter::new(Arc::new(MemoryStore::new())),
    }
}
