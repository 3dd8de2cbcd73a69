//! Configuration file structures for crocon.
//!
//! The CLI reads one TOML file holding both the converter settings and the
//! log output settings. Every section and key is optional.
//! - [`ConfigFile`]: The whole file
//! - [`LoggingConfig`]: Log filter and output format

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ConverterConfig;

/// Contents of a `crocon.toml` file.
///
/// # Example
///
/// ```toml
/// [converter.executor]
/// thread_name = "crocon-executor"
/// stack_size_mb = 16
///
/// [converter.cache]
/// enabled = true
/// initial_capacity = 1024
///
/// [logging]
/// filter = "info,crocon=debug"
/// json = false
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    /// Converter configuration (executor + cache settings).
    #[serde(default)]
    pub converter: ConverterConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Read and parse `path`.
    ///
    /// # Errors
    ///
    /// [`ConfigFileError::Io`] if the file is unreadable,
    /// [`ConfigFileError::Parse`] if it is not valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), bytes = text.len(), "Loaded config file");

        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigFileError> {
        toml::from_str(text).map_err(|e| ConfigFileError::Parse {
            message: e.message().to_string(),
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "defaults::filter")]
    pub filter: String,

    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: defaults::filter(),
            json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Cannot read '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {message}")]
    Parse { message: String },
}

mod defaults {
    pub fn filter() -> String {
        "info,crocon=debug".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();

        assert_eq!(config.logging.filter, "info,crocon=debug");
        assert!(!config.logging.json);
        assert!(config.converter.cache.enabled);
    }

    #[test]
    fn test_partial_sections() {
        let config = ConfigFile::from_toml("[logging]\njson = true\n").unwrap();

        assert!(config.logging.json);
        assert_eq!(config.logging.filter, "info,crocon=debug");
        assert_eq!(config.converter.executor.thread_name, "crocon-executor");
    }

    #[test]
    fn test_every_key() {
        let text = r#"
            [converter.executor]
            thread_name = "graal-worker"
            stack_size_mb = 64

            [converter.cache]
            enabled = false
            initial_capacity = 16

            [logging]
            filter = "warn"
            json = true
        "#;

        let config = ConfigFile::from_toml(text).unwrap();

        assert_eq!(config.converter.executor.thread_name, "graal-worker");
        assert_eq!(config.converter.executor.stack_size_mb, 64);
        assert!(!config.converter.cache.enabled);
        assert_eq!(config.converter.cache.initial_capacity, 16);
        assert_eq!(config.logging.filter, "warn");
        assert!(config.logging.json);
    }

    #[test]
    fn test_wrong_value_type() {
        let err = ConfigFile::from_toml("[converter.cache]\nenabled = \"yes\"\n").unwrap_err();
        assert!(matches!(err, ConfigFileError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigFile::from_file("/nonexistent/crocon.toml").unwrap_err();
        assert!(matches!(err, ConfigFileError::Io { ref path, .. } if path.ends_with("crocon.toml")));
    }
}
