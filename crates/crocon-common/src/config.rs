//! Configuration structures for crocon.
//!
//! This module defines configuration options for the converter:
//! - [`ConverterConfig`]: Top-level configuration containing all settings
//! - [`ExecutorConfig`]: Native worker thread settings
//! - [`CacheConfig`]: Result cache settings

use serde::{Deserialize, Serialize};

/// Top-level converter configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConverterConfig {
    /// Native worker thread configuration.
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Result cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Native worker thread configuration.
///
/// The worker is the only thread that ever enters the native engine, so these
/// settings apply to exactly one OS thread per converter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExecutorConfig {
    /// Name given to the worker thread.
    #[serde(default = "defaults::thread_name")]
    pub thread_name: String,

    /// Stack size of the worker thread in megabytes.
    ///
    /// The native isolate runs on this stack and needs more than the platform default.
    #[serde(default = "defaults::stack_size_mb")]
    pub stack_size_mb: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            thread_name: defaults::thread_name(),
            stack_size_mb: defaults::stack_size_mb(),
        }
    }
}

impl ExecutorConfig {
    /// Get the stack size in bytes, saturating at `usize::MAX`.
    pub fn stack_size_bytes(&self) -> usize {
        self.stack_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Result cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Enable memoization of engine replies.
    ///
    /// When disabled, every conversion reaches the native engine.
    #[serde(default = "defaults::cache_enabled")]
    pub enabled: bool,

    /// Number of entries to pre-allocate.
    #[serde(default = "defaults::initial_capacity")]
    pub initial_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::cache_enabled(),
            initial_capacity: defaults::initial_capacity(),
        }
    }
}

/// Default value functions for serde.
mod defaults {
    pub fn thread_name() -> String {
        "crocon-executor".to_string()
    }

    pub const fn stack_size_mb() -> usize {
        16
    }

    pub const fn cache_enabled() -> bool {
        true
    }

    pub const fn initial_capacity() -> usize {
        1024
    }
}
