//! Registry configuration.
//!
//! Values can come from defaults, a YAML document, or the environment:
//!
//! - `FIELD_REGISTRY_LOCK_TIMEOUT_MS` — bound on registry lock acquisition
//! - `FIELD_REGISTRY_FIRST_ID` — first field id handed out
//! - `FIELD_REGISTRY_CATALOG_PATH` — path stem served by the field listing

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default bound on field registry lock acquisition.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

/// Default path stem for the field listing endpoint.
pub const DEFAULT_CATALOG_PATH: &str = "/system/tracked_fields";

/// Configuration for a [`FieldTracker`](crate::tracker::FieldTracker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// How long a caller waits for the field registry lock before the
    /// holder is reported as stuck.
    pub lock_timeout_ms: u64,
    /// First id assigned by the field registry.
    pub first_field_id: u32,
    /// Path stem answered by the field listing, without extension.
    pub catalog_path: String,
    /// Bind the built-in JSON serializer under the `json` token.
    pub register_json: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            first_field_id: 1,
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
            register_json: true,
        }
    }
}

impl RegistryConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from YAML. Missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Build a configuration from `FIELD_REGISTRY_*` environment variables
    /// layered over the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_parse("FIELD_REGISTRY_LOCK_TIMEOUT_MS") {
            config.lock_timeout_ms = ms;
        }
        if let Some(id) = env_parse("FIELD_REGISTRY_FIRST_ID") {
            config.first_field_id = id;
        }
        if let Ok(path) = std::env::var("FIELD_REGISTRY_CATALOG_PATH") {
            if !path.is_empty() {
                config.catalog_path = path;
            }
        }
        config
    }

    /// Lock timeout as a [`Duration`].
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Override the lock timeout.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Override the first field id.
    pub fn with_first_field_id(mut self, id: u32) -> Self {
        self.first_field_id = id;
        self
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a valid number, using default", key, raw);
            None
        }
    }
}
