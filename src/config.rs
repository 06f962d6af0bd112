use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::types::LoadMode;

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV: &str = "ANNWIRE_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub loading: LoadingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Unix socket the server listens on.
    pub socket_path: PathBuf,
    /// How often to check whether the socket exists.
    pub poll_interval_ms: u64,
    /// Give up waiting for the socket after this long. Waits forever if unset.
    pub connect_timeout_secs: Option<u64>,
    /// Limit on waiting for a complete response frame. Unlimited if unset.
    pub response_timeout_secs: Option<u64>,
    pub max_frame_bytes: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/jvector.sock"),
            poll_interval_ms: 1000,
            connect_timeout_secs: None,
            response_timeout_secs: None,
            max_frame_bytes: 64 * 1024 * 1024,
        }
    }
}

impl ConnectionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }

    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    pub mode: LoadMode,
    /// Vectors per WRITE command in incremental mode.
    pub write_batch_size: usize,
    /// File the vectors are written to before BULKLOAD. The server reads it
    /// directly, so it must be visible to the server process.
    pub bulk_file_path: PathBuf,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            mode: LoadMode::Bulk,
            write_batch_size: 1000,
            bulk_file_path: PathBuf::from("/tmp/data.bin"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Reads `path`, or the file named by `ANNWIRE_CONFIG`, or starts from
    /// defaults. `ANNWIRE_*` environment variables are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV).map(PathBuf::from),
        };

        let mut config = match file {
            Some(file) => {
                let contents = std::fs::read_to_string(&file).map_err(|e| {
                    ClientError::Config(format!("failed to read {}: {e}", file.display()))
                })?;
                Self::from_toml(&contents)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ClientError::Config(e.to_string()))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = env("ANNWIRE_SOCKET_PATH") {
            self.connection.socket_path = PathBuf::from(v);
        }
        if let Some(v) = env("ANNWIRE_CONNECT_TIMEOUT_SECS") {
            self.connection.connect_timeout_secs =
                Some(parse_env("ANNWIRE_CONNECT_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = env("ANNWIRE_BULK_FILE") {
            self.loading.bulk_file_path = PathBuf::from(v);
        }
        if let Some(v) = env("ANNWIRE_WRITE_BATCH_SIZE") {
            self.loading.write_batch_size = parse_env("ANNWIRE_WRITE_BATCH_SIZE", &v)?;
        }
        if let Some(v) = env("ANNWIRE_LOAD_MODE") {
            self.loading.mode = v.parse()?;
        }
        if let Some(v) = env("ANNWIRE_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env("ANNWIRE_LOG_FORMAT") {
            self.logging.format = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.connection.poll_interval_ms == 0 {
            return Err(ClientError::Config("poll_interval_ms must be > 0".into()));
        }
        if self.connection.max_frame_bytes == 0 {
            return Err(ClientError::Config("max_frame_bytes must be > 0".into()));
        }
        if self.loading.write_batch_size == 0 {
            return Err(ClientError::Config("write_batch_size must be > 0".into()));
        }
        match self.logging.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(ClientError::Config(format!("unknown log format: {other}"))),
        }
    }
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ClientError::Config(format!("invalid value for {key}: {value}")))
}
