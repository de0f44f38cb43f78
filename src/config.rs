//! Embedder-facing configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging setup for a process embedding this layer.
///
/// Deserialized from the embedder's config file and handed to
/// [`setup_global_logging`](crate::logging::setup_global_logging).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level for the process and for this crate's own targets
    pub level: String,

    /// Optional log file; parent directories are created as needed
    pub log_path: Option<PathBuf>,

    /// Mirror log output to stdout
    pub with_stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_path: None,
            with_stdout: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.log_path.is_none());
        assert!(config.with_stdout);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: LoggingConfig = serde_json::from_str(r#"{"level": "debug"}"#).unwrap();
        assert_eq!(config.level, "debug");
        assert!(config.with_stdout);
    }
}
