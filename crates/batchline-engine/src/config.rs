//! # Engine Configuration
//!
//! Configuration management for batch runs.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BATCHLINE_CHUNK_SIZE=250                                           │
//! │     BATCHLINE_PERSIST=false                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/batchline/batchline.toml (Linux)                         │
//! │     ~/Library/Application Support/dev.batchline.batchline/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     chunk_size 100, pacing 50ms, cache 1000 entries                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # batchline.toml
//! [batch]
//! validate_emails = true
//! send_notifications = true
//! persist = true
//! generate_report = true
//! enable_caching = true
//! log_activity = true
//! notification_template = "welcome"
//! chunk_size = 100
//!
//! [engine]
//! pacing_ms = 50
//! max_concurrency = 8
//! cache_capacity = 1000
//! max_records = 100000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};

/// Chunk size used when the configured one is zero or negative.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

// =============================================================================
// Batch Options
// =============================================================================

/// Named options for one batch invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Check email length and shape (presence is always required).
    #[serde(default = "default_true")]
    pub validate_emails: bool,

    /// Notify once per successful record.
    #[serde(default = "default_true")]
    pub send_notifications: bool,

    /// Save each successful entity.
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Build and store a report when the batch completes.
    #[serde(default = "default_true")]
    pub generate_report: bool,

    /// Keep processed entities in the engine cache.
    #[serde(default = "default_true")]
    pub enable_caching: bool,

    /// Emit one audit event per successful record.
    #[serde(default = "default_true")]
    pub log_activity: bool,

    /// Template name handed to the notifier.
    #[serde(default = "default_template")]
    pub notification_template: String,

    /// Records per chunk. Zero or negative means the default of 100.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i64,
}

fn default_true() -> bool {
    true
}

fn default_template() -> String {
    "welcome".to_string()
}

fn default_chunk_size() -> i64 {
    DEFAULT_CHUNK_SIZE as i64
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            validate_emails: true,
            send_notifications: true,
            persist: true,
            generate_report: true,
            enable_caching: true,
            log_activity: true,
            notification_template: default_template(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl BatchConfig {
    /// Chunk size after applying the "≤ 0 means default" rule.
    pub fn effective_chunk_size(&self) -> usize {
        if self.chunk_size <= 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            usize::try_from(self.chunk_size).unwrap_or(DEFAULT_CHUNK_SIZE)
        }
    }
}

// =============================================================================
// Engine Settings
// =============================================================================

/// Runtime limits of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Pause between chunks (milliseconds).
    #[serde(default = "default_pacing")]
    pub pacing_ms: u64,

    /// Records processed in parallel within a chunk.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Entity cache size; exceeding it clears the whole cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Largest accepted batch.
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_pacing() -> u64 {
    50
}

fn default_max_concurrency() -> usize {
    8
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_max_records() -> usize {
    100_000
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            pacing_ms: default_pacing(),
            max_concurrency: default_max_concurrency(),
            cache_capacity: default_cache_capacity(),
            max_records: default_max_records(),
        }
    }
}

impl EngineSettings {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-batch options.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Orchestrator limits.
    #[serde(default)]
    pub engine: EngineSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (batchline.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml(contents: &str) -> EngineResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.engine.max_concurrency == 0 {
            return Err(EngineError::InvalidConfig(
                "max_concurrency must be greater than 0".into(),
            ));
        }

        if self.engine.max_records == 0 {
            return Err(EngineError::InvalidConfig(
                "max_records must be greater than 0".into(),
            ));
        }

        if self.batch.send_notifications && self.batch.notification_template.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "notification_template is required when send_notifications is enabled".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides read through `lookup`.
    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str, target: &mut bool| {
            if let Some(value) = lookup(key) {
                match parse_bool(&value) {
                    Some(b) => *target = b,
                    None => warn!(key, value = %value, "Ignoring non-boolean environment override"),
                }
            }
        };
        flag("BATCHLINE_VALIDATE_EMAILS", &mut self.batch.validate_emails);
        flag("BATCHLINE_SEND_NOTIFICATIONS", &mut self.batch.send_notifications);
        flag("BATCHLINE_PERSIST", &mut self.batch.persist);
        flag("BATCHLINE_GENERATE_REPORT", &mut self.batch.generate_report);
        flag("BATCHLINE_ENABLE_CACHING", &mut self.batch.enable_caching);
        flag("BATCHLINE_LOG_ACTIVITY", &mut self.batch.log_activity);

        if let Some(template) = lookup("BATCHLINE_NOTIFICATION_TEMPLATE") {
            debug!(template = %template, "Overriding notification template from environment");
            self.batch.notification_template = template;
        }

        if let Some(size) = lookup("BATCHLINE_CHUNK_SIZE") {
            if let Ok(n) = size.parse::<i64>() {
                debug!(chunk_size = n, "Overriding chunk size from environment");
                self.batch.chunk_size = n;
            }
        }

        if let Some(pacing) = lookup("BATCHLINE_PACING_MS") {
            if let Ok(ms) = pacing.parse::<u64>() {
                self.engine.pacing_ms = ms;
            }
        }

        if let Some(concurrency) = lookup("BATCHLINE_MAX_CONCURRENCY") {
            if let Ok(n) = concurrency.parse::<usize>() {
                self.engine.max_concurrency = n;
            }
        }

        if let Some(capacity) = lookup("BATCHLINE_CACHE_CAPACITY") {
            if let Ok(n) = capacity.parse::<usize>() {
                self.engine.cache_capacity = n;
            }
        }

        if let Some(max) = lookup("BATCHLINE_MAX_RECORDS") {
            if let Ok(n) = max.parse::<usize>() {
                self.engine.max_records = n;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "batchline", "batchline")
            .map(|dirs| dirs.config_dir().join("batchline.toml"))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.batch.persist);
        assert_eq!(config.batch.notification_template, "welcome");
        assert_eq!(config.batch.effective_chunk_size(), 100);
        assert_eq!(config.engine.pacing(), Duration::from_millis(50));
        assert_eq!(config.engine.cache_capacity, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_positive_chunk_size_uses_default() {
        let mut batch = BatchConfig::default();
        batch.chunk_size = 0;
        assert_eq!(batch.effective_chunk_size(), 100);
        batch.chunk_size = -5;
        assert_eq!(batch.effective_chunk_size(), 100);
        batch.chunk_size = 3;
        assert_eq!(batch.effective_chunk_size(), 3);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.engine.max_concurrency = 0;
        assert!(config.validate().unwrap_err().is_config_error());

        config.engine.max_concurrency = 4;
        config.engine.max_records = 0;
        assert!(config.validate().is_err());

        config.engine.max_records = 10;
        config.batch.notification_template = "  ".into();
        assert!(config.validate().is_err());

        // An empty template is fine when nothing is sent.
        config.batch.send_notifications = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [batch]
            persist = false
            chunk_size = 25

            [engine]
            pacing_ms = 0
            "#,
        )
        .unwrap();

        assert!(!config.batch.persist);
        assert!(config.batch.send_notifications);
        assert_eq!(config.batch.effective_chunk_size(), 25);
        assert_eq!(config.engine.pacing_ms, 0);
        assert_eq!(config.engine.max_concurrency, 8);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = EngineConfig::from_toml("[batch]\nchunk_size = \"many\"").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("BATCHLINE_CHUNK_SIZE", "7"),
            ("BATCHLINE_PERSIST", "false"),
            ("BATCHLINE_PACING_MS", "5"),
            ("BATCHLINE_NOTIFICATION_TEMPLATE", "order_confirmation"),
            ("BATCHLINE_LOG_ACTIVITY", "maybe"),
        ]);
        let mut config = EngineConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.batch.chunk_size, 7);
        assert!(!config.batch.persist);
        assert_eq!(config.engine.pacing_ms, 5);
        assert_eq!(config.batch.notification_template, "order_confirmation");
        // Unparseable values are ignored.
        assert!(config.batch.log_activity);
    }
}
