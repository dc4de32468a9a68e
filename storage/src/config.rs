//! Storage configuration
//!
//! Loaded from `SPANLOG_*` environment variables. Every value has a default,
//! so an empty environment yields a usable configuration.

use crate::error::{Result, StorageError};
use std::path::PathBuf;

/// Minimum index writer memory budget accepted by the index library
pub const MIN_WRITER_MEMORY: usize = 15_000_000;

/// Index writer memory budget used when none is configured
pub const DEFAULT_WRITER_MEMORY: usize = 50_000_000;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Machine-readable JSON lines
    Json,
    /// Human-readable output
    #[default]
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(StorageError::Config(format!(
                "unknown log format '{other}', expected 'json' or 'pretty'"
            ))),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Topic receiving encoded spans, keyed by trace id
    pub spans_topic: String,
    /// Topic receiving span names, keyed by service name
    pub span_services_topic: String,
    /// Directory backing a persistent index
    pub index_dir: PathBuf,
    /// Keep the index on disk (`true`) or in memory (`false`)
    pub index_persistent: bool,
    /// Index writer memory budget in bytes
    pub index_writer_memory: usize,
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            spans_topic: "zipkin-spans".to_string(),
            span_services_topic: "zipkin-span-services".to_string(),
            index_dir: PathBuf::from("/tmp/spanlog/index"),
            index_persistent: true,
            index_writer_memory: DEFAULT_WRITER_MEMORY,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl StorageConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Used by [`StorageConfig::from_env`]; tests pass a map instead of
    /// mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            spans_topic: lookup("SPANLOG_SPANS_TOPIC").unwrap_or(defaults.spans_topic),
            span_services_topic: lookup("SPANLOG_SPAN_SERVICES_TOPIC")
                .unwrap_or(defaults.span_services_topic),
            index_dir: lookup("SPANLOG_INDEX_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_dir),
            index_persistent: match lookup("SPANLOG_INDEX_PERSISTENT") {
                Some(v) => parse_bool("SPANLOG_INDEX_PERSISTENT", &v)?,
                None => defaults.index_persistent,
            },
            index_writer_memory: match lookup("SPANLOG_INDEX_WRITER_MEMORY") {
                Some(v) => v.parse().map_err(|e| {
                    StorageError::Config(format!("SPANLOG_INDEX_WRITER_MEMORY '{v}': {e}"))
                })?,
                None => defaults.index_writer_memory,
            },
            log_level: lookup("SPANLOG_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: match lookup("SPANLOG_LOG_FORMAT") {
                Some(v) => v.parse()?,
                None => defaults.log_format,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check invariants between fields
    pub fn validate(&self) -> Result<()> {
        if self.spans_topic.is_empty() || self.span_services_topic.is_empty() {
            return Err(StorageError::Config("topic names must not be empty".into()));
        }
        if self.spans_topic == self.span_services_topic {
            return Err(StorageError::Config(format!(
                "spans and span-services topics must differ (both '{}')",
                self.spans_topic
            )));
        }
        if self.index_writer_memory < MIN_WRITER_MEMORY {
            return Err(StorageError::Config(format!(
                "index writer memory {} below minimum {MIN_WRITER_MEMORY}",
                self.index_writer_memory
            )));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(StorageError::Config(format!(
            "{key} '{value}' is not a boolean"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = StorageConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StorageConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = StorageConfig::from_lookup(lookup(&[
            ("SPANLOG_SPANS_TOPIC", "spans"),
            ("SPANLOG_SPAN_SERVICES_TOPIC", "services"),
            ("SPANLOG_INDEX_DIR", "/var/lib/spanlog"),
            ("SPANLOG_INDEX_PERSISTENT", "false"),
            ("SPANLOG_INDEX_WRITER_MEMORY", "20000000"),
            ("SPANLOG_LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.spans_topic, "spans");
        assert_eq!(config.span_services_topic, "services");
        assert_eq!(config.index_dir, PathBuf::from("/var/lib/spanlog"));
        assert!(!config.index_persistent);
        assert_eq!(config.index_writer_memory, 20_000_000);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let err = StorageConfig::from_lookup(lookup(&[("SPANLOG_INDEX_PERSISTENT", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }

    #[test]
    fn test_same_topic_rejected() {
        let err = StorageConfig::from_lookup(lookup(&[
            ("SPANLOG_SPANS_TOPIC", "one"),
            ("SPANLOG_SPAN_SERVICES_TOPIC", "one"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_small_writer_memory_rejected() {
        let err = StorageConfig::from_lookup(lookup(&[("SPANLOG_INDEX_WRITER_MEMORY", "1024")]))
            .unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
    }
}
