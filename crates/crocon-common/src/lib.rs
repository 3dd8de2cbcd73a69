//! Common errors and configuration for crocon.
//!
//! This crate provides shared functionality used across the crocon workspace:
//! - Error types using `thiserror` for type-safe error handling
//! - Configuration structures for the converter and its worker thread

pub mod config;
pub mod config_file;
pub mod error;

pub use config::{CacheConfig, ConverterConfig, ExecutorConfig};
pub use config_file::{ConfigFile, ConfigFileError, LoggingConfig};
pub use error::ConverterError;
