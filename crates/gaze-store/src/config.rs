//! Store configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::SubjectStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the cached image files referenced by the files
    /// table. Created on open if missing.
    pub cache_dir: PathBuf,
    /// Rounds of synchronous remote fetch attempted when a next-item read
    /// finds the local cache empty. Bounds the blocking time on cold start.
    pub fetch_rounds: u32,
    /// Subjects requested per fallback round.
    pub fetch_count: usize,
}

impl StoreConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            fetch_rounds: 3,
            fetch_count: 1,
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_rounds == 0 {
            return Err(ConfigError::OutOfRange(
                "fetch_rounds must be at least 1".to_string(),
            ));
        }
        if self.fetch_count == 0 {
            return Err(ConfigError::OutOfRange(
                "fetch_count must be at least 1".to_string(),
            ));
        }
        if self.cache_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("cache_dir".to_string()));
        }
        Ok(())
    }
}

/// Configuration validation error
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Missing field: {0}")]
    MissingField(String),
}
