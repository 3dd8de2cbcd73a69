//! Memoization of engine replies.
//!
//! The [`ResultCache`] maps an exact encoded request to the raw encoded reply
//! the engine produced for it. Entries are never evicted; they live as long
//! as the converter that owns the cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

use crocon_common::CacheConfig;

use crate::types::DataKind;

/// Cache key: the data kind plus the canonical encoded request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: DataKind,
    request: Arc<str>,
}

impl CacheKey {
    pub fn new(kind: DataKind, request: impl Into<Arc<str>>) -> Self {
        Self {
            kind,
            request: request.into(),
        }
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    /// The encoded request envelope.
    pub fn request(&self) -> &Arc<str> {
        &self.request
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, or `0.0` before any lookup.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Concurrent reply cache.
///
/// Lookups and stores are independent: two callers missing on the same key
/// may both reach the engine and both store the (identical) reply.
#[derive(Debug)]
pub struct ResultCache {
    entries: DashMap<CacheKey, Arc<str>>,
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: DashMap::with_capacity(if config.enabled {
                config.initial_capacity
            } else {
                0
            }),
            enabled: config.enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up the reply stored for `key`.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<str>> {
        let found = if self.enabled {
            self.entries.get(key).map(|entry| Arc::clone(entry.value()))
        } else {
            None
        };

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Store the reply for `key`, replacing any earlier (identical) reply.
    pub fn put(&self, key: CacheKey, reply: Arc<str>) {
        if self.enabled {
            self.entries.insert(key, reply);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}
