//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Environment variable consulted when no shared secret is configured.
pub const SHARED_SECRET_ENV: &str = "MANCALA_SHARED_SECRET";

/// Configuration for the turn server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind to.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database path; in-memory store when absent.
    #[serde(default)]
    database: Option<String>,

    /// Matches a player may have waiting on opponents before new ones are refused.
    #[serde(default = "default_max_waiting_matches")]
    max_waiting_matches: usize,

    /// Default number of players returned by the leaderboard.
    #[serde(default = "default_leaderboard_size")]
    leaderboard_size: usize,

    /// Bearer token required on every request when set.
    #[serde(default)]
    shared_secret: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_waiting_matches() -> usize {
    10
}

fn default_leaderboard_size() -> usize {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: None,
            max_waiting_matches: default_max_waiting_matches(),
            leaderboard_size: default_leaderboard_size(),
            shared_secret: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing fields take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml(&content)?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Fills the shared secret from [`SHARED_SECRET_ENV`] when none is set.
    #[instrument(skip(self))]
    pub fn with_env_secret(mut self) -> Self {
        if self.shared_secret.is_none() {
            if let Ok(secret) = std::env::var(SHARED_SECRET_ENV) {
                if !secret.is_empty() {
                    debug!("Shared secret taken from environment");
                    self.shared_secret = Some(secret);
                }
            }
        }
        self
    }

    /// Overrides the bind host.
    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    /// Overrides the bind port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Selects a SQLite database.
    pub fn with_database(mut self, database: String) -> Self {
        self.database = Some(database);
        self
    }

    /// Overrides the waiting-match ceiling.
    pub fn with_max_waiting_matches(mut self, ceiling: usize) -> Self {
        self.max_waiting_matches = ceiling;
        self
    }

    /// Requires `secret` as a bearer token.
    pub fn with_shared_secret(mut self, secret: String) -> Self {
        self.shared_secret = Some(secret);
        self
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new config error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
