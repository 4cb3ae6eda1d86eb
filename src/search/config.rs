//! Search configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Search subsystem configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Path to the search catalog directory
    pub index_path: PathBuf,

    /// Index writer heap size in bytes (default: 50MB)
    pub writer_heap_size: usize,

    /// Upper bound on a single backend call, in milliseconds
    pub query_timeout_ms: u64,

    /// Size of the result window the backend will page through
    pub max_matches: usize,

    /// Results per page
    pub per_page: usize,

    /// Start serving queries as soon as the service boots
    pub autostart: bool,

    /// Rebuild the catalog from the store when the service boots
    pub reindex_on_start: bool,
}

impl SearchConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("./data/search_index"),
            writer_heap_size: 50_000_000, // 50MB
            query_timeout_ms: 2_000,
            max_matches: 1_000,
            per_page: 20,
            autostart: true,
            reindex_on_start: true,
        }
    }
}

/// Builder for SearchConfig
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
        }
    }

    pub fn index_path(mut self, path: PathBuf) -> Self {
        self.config.index_path = path;
        self
    }

    pub fn writer_heap_size(mut self, size: usize) -> Self {
        self.config.writer_heap_size = size;
        self
    }

    pub fn query_timeout_ms(mut self, millis: u64) -> Self {
        self.config.query_timeout_ms = millis;
        self
    }

    pub fn max_matches(mut self, max: usize) -> Self {
        self.config.max_matches = max;
        self
    }

    pub fn per_page(mut self, per_page: usize) -> Self {
        self.config.per_page = per_page.max(1);
        self
    }

    pub fn autostart(mut self, enabled: bool) -> Self {
        self.config.autostart = enabled;
        self
    }

    pub fn reindex_on_start(mut self, enabled: bool) -> Self {
        self.config.reindex_on_start = enabled;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

impl Default for SearchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
