//! Server configuration module
//!
//! Provides the configuration type for the PixelCollab server, its builder,
//! and the TOML file format. Environment handling lives in
//! `backend::server::config`.

use serde::Deserialize;
use thiserror::Error;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 3000;

/// Default per-room broadcast channel capacity
pub const DEFAULT_ROOM_CAPACITY: usize = 256;

/// Default interval between room channel cleanups, in seconds
pub const DEFAULT_CLEANUP_SECS: u64 = 300;

/// Secret used when none is configured; development only
pub const DEV_JWT_SECRET: &str = "pixelcollab-dev-secret-change-in-production";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Port the HTTP server listens on
    pub port: u16,
    /// PostgreSQL connection string; the in-memory store is used when absent
    pub database_url: Option<String>,
    /// HMAC secret for bearer tokens
    pub jwt_secret: String,
    /// Map unknown timer selectors to "unlimited" instead of rejecting them
    pub lenient_timers: bool,
    /// Capacity of each room's broadcast channel
    pub room_capacity: usize,
    /// Seconds between sweeps of rooms without subscribers
    pub cleanup_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            lenient_timers: true,
            room_capacity: DEFAULT_ROOM_CAPACITY,
            cleanup_interval_secs: DEFAULT_CLEANUP_SECS,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfigBuilder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingValue("jwt_secret"));
        }
        if self.room_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "room_capacity",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "cleanup_interval_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// True when the development secret is in use
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Optional settings read from a TOML file
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub database_url: Option<String>,
    pub jwt_secret: Option<String>,
    pub lenient_timers: Option<bool>,
    pub room_capacity: Option<usize>,
    pub cleanup_interval_secs: Option<u64>,
}

impl FileConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    port: Option<u16>,
    database_url: Option<String>,
    jwt_secret: Option<String>,
    lenient_timers: Option<bool>,
    room_capacity: Option<usize>,
    cleanup_interval_secs: Option<u64>,
}

impl ServerConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    pub fn lenient_timers(mut self, lenient: bool) -> Self {
        self.lenient_timers = Some(lenient);
        self
    }

    pub fn room_capacity(mut self, capacity: usize) -> Self {
        self.room_capacity = Some(capacity);
        self
    }

    pub fn cleanup_interval_secs(mut self, secs: u64) -> Self {
        self.cleanup_interval_secs = Some(secs);
        self
    }

    /// Fill every unset value from a file
    pub fn with_file(mut self, file: FileConfig) -> Self {
        self.port = self.port.or(file.port);
        self.database_url = self.database_url.or(file.database_url);
        self.jwt_secret = self.jwt_secret.or(file.jwt_secret);
        self.lenient_timers = self.lenient_timers.or(file.lenient_timers);
        self.room_capacity = self.room_capacity.or(file.room_capacity);
        self.cleanup_interval_secs = self.cleanup_interval_secs.or(file.cleanup_interval_secs);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let defaults = ServerConfig::default();
        let config = ServerConfig {
            port: self.port.unwrap_or(defaults.port),
            database_url: self.database_url.filter(|url| !url.is_empty()),
            jwt_secret: self.jwt_secret.unwrap_or(defaults.jwt_secret),
            lenient_timers: self.lenient_timers.unwrap_or(defaults.lenient_timers),
            room_capacity: self.room_capacity.unwrap_or(defaults.room_capacity),
            cleanup_interval_secs: self
                .cleanup_interval_secs
                .unwrap_or(defaults.cleanup_interval_secs),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
    #[error("failed to parse config file: {0}")]
    Parse(String),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
}
