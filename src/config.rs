//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::hub::{HubConfig, MessageLimits};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub hub: HubSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow any origin (the event stream is usually consumed cross-origin in dev)
    #[serde(default = "default_cors_permissive")]
    pub cors_permissive: bool,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_permissive() -> bool {
    true
}

fn default_max_body_size() -> usize {
    64 * 1024 // 64 KB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_permissive: default_cors_permissive(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Event hub settings as they appear in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct HubSettings {
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_secs: u64,

    #[serde(default = "default_sink_buffer")]
    pub sink_buffer: usize,

    #[serde(default = "default_max_user_len")]
    pub max_user_len: usize,

    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
}

fn default_history_capacity() -> usize {
    200
}

fn default_keepalive_interval() -> u64 {
    30
}

fn default_sink_buffer() -> usize {
    256
}

fn default_max_user_len() -> usize {
    64
}

fn default_max_text_len() -> usize {
    2000
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            keepalive_interval_secs: default_keepalive_interval(),
            sink_buffer: default_sink_buffer(),
            max_user_len: default_max_user_len(),
            max_text_len: default_max_text_len(),
        }
    }
}

impl HubSettings {
    /// Runtime hub configuration for these settings
    pub fn to_hub_config(&self) -> HubConfig {
        HubConfig {
            history_capacity: self.history_capacity,
            keepalive_interval: Duration::from_secs(self.keepalive_interval_secs),
            sink_buffer: self.sink_buffer,
            limits: MessageLimits {
                max_user_len: self.max_user_len,
                max_text_len: self.max_text_len,
            },
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Whether structured JSON output was requested
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    /// Filter directive for `tracing_subscriber::EnvFilter`
    ///
    /// A bare level is scoped to this crate and the HTTP trace layer; a
    /// full directive (anything containing `=` or `,`) is used as given.
    pub fn filter_directive(&self) -> String {
        if self.level.contains('=') || self.level.contains(',') {
            self.level.clone()
        } else {
            format!("chat_hub={0},tower_http={0}", self.level)
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// Runs before logging is set up, so the outcome is returned for the
    /// caller to report with [`ConfigLoad::log`].
    pub fn load_default() -> (Self, ConfigLoad) {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("chat-hub").join("config.toml")),
            Some(PathBuf::from("/etc/chat-hub/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths)
    }

    /// Load the first existing file in `paths` that parses
    fn load_first(paths: &[PathBuf]) -> (Self, ConfigLoad) {
        let mut outcome = ConfigLoad::default();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok(config) => {
                    outcome.source = Some(path.clone());
                    return (config, outcome);
                }
                Err(e) => outcome.skipped.push(e),
            }
        }

        (Self::from_env(), outcome)
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(host) = lookup("CHAT_HUB_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("CHAT_HUB_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        // Hub overrides
        if let Some(capacity) = lookup("CHAT_HUB_HISTORY_CAPACITY").and_then(|c| c.parse().ok()) {
            self.hub.history_capacity = capacity;
        }
        if let Some(secs) = lookup("CHAT_HUB_KEEPALIVE_SECS").and_then(|s| s.parse().ok()) {
            self.hub.keepalive_interval_secs = secs;
        }

        // Logging overrides
        if let Some(level) = lookup("CHAT_HUB_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("CHAT_HUB_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Where [`Config::load_default`] found its settings
#[derive(Debug, Default)]
pub struct ConfigLoad {
    /// File the config came from, `None` for built-in defaults
    pub source: Option<PathBuf>,
    /// Files that exist but failed to load
    pub skipped: Vec<ConfigError>,
}

impl ConfigLoad {
    /// Report the outcome through tracing
    pub fn log(&self) {
        for error in &self.skipped {
            tracing::warn!(error = %error, "Skipping config file");
        }
        match &self.source {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::info!("Using default config with environment overrides"),
        }
    }
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# chat-hub Configuration
#
# Environment variables override these settings:
# - CHAT_HUB_HOST
# - CHAT_HUB_PORT
# - CHAT_HUB_HISTORY_CAPACITY
# - CHAT_HUB_KEEPALIVE_SECS
# - CHAT_HUB_LOG_LEVEL
# - CHAT_HUB_LOG_FORMAT

[server]
# HTTP server host
host = "0.0.0.0"

# HTTP server port
port = 3000

# Allow cross-origin requests from any origin
cors_permissive = true

# Maximum publish request body size (bytes)
max_body_size = 65536

[hub]
# Number of recent messages replayed to new subscribers
history_capacity = 200

# Seconds between keep-alive pings on each event stream
keepalive_interval_secs = 30

# Frames buffered per subscriber before it is dropped as stalled
sink_buffer = 256

# Maximum author name length (characters)
max_user_len = 64

# Maximum message length (characters)
max_text_len = 2000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
