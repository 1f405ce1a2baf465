//! Run configuration.
//!
//! Configuration is a JSON document with three sections:
//!
//! ```json
//! {
//!   "source": {
//!     "file_path": "events.jsonl",
//!     "fields": { "user_id": ["user", "id"], "app_id": "payload.app" }
//!   },
//!   "als": { "num_features": 10, "num_iterations": 10 },
//!   "execution": { "num_threads": 4, "num_partitions": 8 }
//! }
//! ```
//!
//! Only `source.fields` is mandatory; everything else has defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AffinityError, Result};
use crate::model::AlsConfig;
use crate::record::{APP_ID_FIELD, FieldPath, FieldPaths, USER_ID_FIELD};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "affinity.json";

/// Complete configuration of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffinityConfig {
    /// Where events come from and how to read them.
    pub source: SourceConfig,
    /// Factorization hyperparameters.
    #[serde(default)]
    pub als: AlsConfig,
    /// Parallelism settings.
    #[serde(default)]
    pub execution: ExecutionConfig,
}

/// Event source configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    /// JSONL event log. May be supplied on the command line instead.
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    /// Logical field name to path in each event.
    pub fields: FieldPaths,
}

/// Configuration for parallel execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Name used for worker threads.
    pub app_name: String,
    /// Thread pool size for parallel processing.
    /// If None, uses the number of CPU cores.
    pub num_threads: Option<usize>,
    /// Number of partitions the aggregation input is split into.
    pub num_partitions: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            app_name: "affinity".to_string(),
            num_threads: None,
            num_partitions: num_cpus::get(),
        }
    }
}

impl ExecutionConfig {
    /// Effective thread count.
    pub fn threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get)
    }
}

impl AffinityConfig {
    /// Build a configuration from the two mandatory field paths.
    pub fn new(user_id_path: FieldPath, app_id_path: FieldPath) -> Self {
        let mut fields = FieldPaths::new();
        fields.insert(USER_ID_FIELD.to_string(), user_id_path);
        fields.insert(APP_ID_FIELD.to_string(), app_id_path);

        AffinityConfig {
            source: SourceConfig {
                file_path: None,
                fields,
            },
            als: AlsConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }

    /// Load and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AffinityError::invalid_config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a configuration document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: AffinityConfig = serde_json::from_str(content)
            .map_err(|e| AffinityError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set the event log path.
    pub fn with_file_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.source.file_path = Some(path.into());
        self
    }

    /// Add an extra field to extract from every event.
    pub fn with_field<S: Into<String>>(mut self, name: S, path: FieldPath) -> Self {
        self.source.fields.insert(name.into(), path);
        self
    }

    /// Set the factorization hyperparameters.
    pub fn with_als(mut self, als: AlsConfig) -> Self {
        self.als = als;
        self
    }

    /// Set the thread pool size.
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.execution.num_threads = Some(num_threads);
        self
    }

    /// Set the aggregation partition count.
    pub fn with_num_partitions(mut self, num_partitions: usize) -> Self {
        self.execution.num_partitions = num_partitions;
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        for field in [USER_ID_FIELD, APP_ID_FIELD] {
            if !self.source.fields.contains_key(field) {
                return Err(AffinityError::invalid_config(format!(
                    "source.fields.{field} is required"
                )));
            }
        }
        if self.execution.num_threads == Some(0) {
            return Err(AffinityError::invalid_config(
                "execution.num_threads must be at least 1",
            ));
        }
        if self.execution.num_partitions == 0 {
            return Err(AffinityError::invalid_config(
                "execution.num_partitions must be at least 1",
            ));
        }
        self.als.validate()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const MINIMAL: &str = r#"{
        "source": {"fields": {"user_id": "user", "app_id": ["payload", "app"]}}
    }"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AffinityConfig::from_json_str(MINIMAL).unwrap();

        assert!(config.source.file_path.is_none());
        assert_eq!(config.source.fields[APP_ID_FIELD].to_string(), "payload.app");
        assert_eq!(config.als, AlsConfig::default());
        assert_eq!(config.execution.app_name, "affinity");
        assert!(config.execution.num_partitions >= 1);
    }

    #[test]
    fn test_full_config() {
        let config = AffinityConfig::from_json_str(
            r#"{
                "source": {
                    "file_path": "events.jsonl",
                    "fields": {"user_id": "u", "app_id": "a", "country": "geo.country"}
                },
                "als": {"num_features": 4, "num_iterations": 3, "implicit_prefs": true, "alpha": 5.0},
                "execution": {"app_name": "recs", "num_threads": 2, "num_partitions": 16}
            }"#,
        )
        .unwrap();

        assert_eq!(config.source.file_path, Some(PathBuf::from("events.jsonl")));
        assert_eq!(config.source.fields.len(), 3);
        assert_eq!(config.als.num_features, 4);
        assert!(config.als.implicit_prefs);
        assert_eq!(config.execution.threads(), 2);
        assert_eq!(config.execution.num_partitions, 16);
    }

    #[test]
    fn test_missing_mandatory_field() {
        let result = AffinityConfig::from_json_str(r#"{"source": {"fields": {"user_id": "u"}}}"#);
        assert!(matches!(result, Err(AffinityError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_values() {
        let zero_threads = AffinityConfig::new(
            FieldPath::parse("u").unwrap(),
            FieldPath::parse("a").unwrap(),
        )
        .with_num_threads(0);
        assert!(zero_threads.validate().is_err());

        let bad_path = AffinityConfig::from_json_str(
            r#"{"source": {"fields": {"user_id": "", "app_id": "a"}}}"#,
        );
        assert!(bad_path.is_err());

        let bad_als = AffinityConfig::from_json_str(
            r#"{"source": {"fields": {"user_id": "u", "app_id": "a"}}, "als": {"num_features": 0}}"#,
        );
        assert!(bad_als.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{MINIMAL}").unwrap();
        file.flush().unwrap();

        let config = AffinityConfig::load(file.path()).unwrap();
        assert_eq!(config.source.fields[USER_ID_FIELD].to_string(), "user");

        assert!(AffinityConfig::load("/nonexistent/affinity.json").is_err());
    }

    #[test]
    fn test_builder() {
        let config = AffinityConfig::new(
            FieldPath::parse("user.id").unwrap(),
            FieldPath::parse("app").unwrap(),
        )
        .with_file_path("log.jsonl")
        .with_field("ts", FieldPath::parse("meta.ts").unwrap())
        .with_num_partitions(3);

        assert!(config.validate().is_ok());
        assert_eq!(config.source.fields.len(), 3);
        assert_eq!(config.execution.num_partitions, 3);
    }
}
