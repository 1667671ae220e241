//! Writer configuration.
//!
//! Loaded from a JSON file with camelCase keys:
//!
//! ```json
//! {
//!   "selfId": "urn:mrn:signalk:uuid:c0d79334-4e25-4245-8892-54e8ccc8021d",
//!   "influx": {
//!     "url": "http://localhost:8086",
//!     "database": "signalk"
//!   },
//!   "batchSize": 100
//! }
//! ```
//!
//! Setting `influx.org` switches the sink to the InfluxDB v2 write API, in
//! which case `database` names the bucket.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Points buffered before a write is dispatched.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Concurrent writes allowed against the sink.
pub const DEFAULT_MAX_INFLIGHT_WRITES: usize = 4;

/// Upper bound on a single write, in milliseconds.
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 10_000;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level writer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterConfig {
    /// Identifier of the vessel whose deltas are written.
    pub self_id: String,

    /// InfluxDB connection settings.
    pub influx: InfluxConfig,

    /// The batch is written once it holds more than this many points.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum number of concurrent writes.
    #[serde(default = "default_max_inflight_writes")]
    pub max_inflight_writes: usize,

    /// Per-write timeout in milliseconds.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

/// InfluxDB connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluxConfig {
    /// Base URL (e.g., "http://localhost:8086").
    pub url: String,

    /// Database (v1) or bucket (v2).
    pub database: String,

    /// Organization. Selects the v2 API when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,

    /// Authentication token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Retention policy (v1 only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_policy: Option<String>,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_inflight_writes() -> usize {
    DEFAULT_MAX_INFLIGHT_WRITES
}

fn default_write_timeout_ms() -> u64 {
    DEFAULT_WRITE_TIMEOUT_MS
}

impl WriterConfig {
    /// Configuration with default batching for the given vessel and database.
    pub fn new(self_id: impl Into<String>, influx: InfluxConfig) -> Self {
        Self {
            self_id: self_id.into(),
            influx,
            batch_size: DEFAULT_BATCH_SIZE,
            max_inflight_writes: DEFAULT_MAX_INFLIGHT_WRITES,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
        }
    }

    /// Parse and validate configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: WriterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.self_id.trim().is_empty() {
            return Err(ConfigError::Invalid("selfId must not be empty".to_string()));
        }
        if self.influx.url.trim().is_empty() {
            return Err(ConfigError::Invalid("influx.url must not be empty".to_string()));
        }
        if self.influx.database.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "influx.database must not be empty".to_string(),
            ));
        }
        if self.max_inflight_writes == 0 {
            return Err(ConfigError::Invalid(
                "maxInflightWrites must be at least 1".to_string(),
            ));
        }
        if self.write_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "writeTimeoutMs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-write timeout.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

impl InfluxConfig {
    /// v1 connection to `database` at `url`.
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            org: None,
            token: None,
            retention_policy: None,
        }
    }
}
