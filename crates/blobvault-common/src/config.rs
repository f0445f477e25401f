//! Configuration types for BlobVault
//!
//! The TTL table and cache bounds that govern the lifecycle engine are
//! explicit configuration handed to the constructors rather than module
//! constants, so tests can run with alternate tables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration for BlobVault
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Byte store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// Lifecycle engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
    /// Cache-aside decorator configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Byte store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory backing the disk store
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/blobvault/data"),
        }
    }
}

/// Lifecycle engine configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Queue on which deletion jobs are published and consumed
    pub deletion_queue: String,
    /// Fallback duration for unrecognized TTL specs (seconds)
    pub default_ttl_secs: u64,
    /// TTL-spec grammar: spec string to duration in seconds
    ///
    /// Empty means "use the standard table" (5m/30m/1h/60m/1d/24h/1w/7d).
    #[serde(default)]
    pub ttl_table: HashMap<String, u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            deletion_queue: "blobvault/delete-file".to_string(),
            default_ttl_secs: 3600,
            ttl_table: HashMap::new(),
        }
    }
}

/// Cache-aside decorator configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Namespace prefix for cache keys
    pub key_prefix: String,
    /// Upper bound on any cache entry's TTL (seconds)
    ///
    /// Content that never expires is still capped at this ceiling.
    pub ttl_ceiling_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "blobvault".to_string(),
            ttl_ceiling_secs: 3600,
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter directive (overridden by `RUST_LOG`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.deletion_queue, "blobvault/delete-file");
        assert_eq!(config.engine.default_ttl_secs, 3600);
        assert_eq!(config.cache.key_prefix, "blobvault");
        assert_eq!(config.cache.ttl_ceiling_secs, 3600);
        assert!(config.engine.ttl_table.is_empty());
    }
}
