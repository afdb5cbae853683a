//! Configuration for StrataKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a StrataKV engine instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all run files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── run-000000.sst
    ///     ├── run-000001.sst
    ///     └── ...
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Write Buffer Configuration
    // -------------------------------------------------------------------------
    /// Number of distinct keys the memtable holds before a flush is triggered
    pub flush_threshold: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./stratakv_data"),
            flush_threshold: 1024,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all run files)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the memtable flush threshold (distinct key count)
    pub fn flush_threshold(mut self, count: usize) -> Self {
        self.config.flush_threshold = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
