//! Runtime configuration for the networking core.

use std::path::PathBuf;

/// Queue bound enforced at insertion time
const DEFAULT_MAX_QUEUE_SIZE: usize = 50;

/// Replay attempts before a request is terminally failed
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for the network manager.
///
/// The defaults match the shipped client; embedders override fields for
/// tests or unusual hosts.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Hard cap on persisted queue entries
    pub max_queue_size: usize,
    /// Retry cap per request; beyond it a request is dropped as failed
    pub max_retries: u32,
    /// Directory holding the persisted queue. `None` resolves to the
    /// platform data directory at store construction.
    pub storage_dir: Option<PathBuf>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let storage_dir = std::env::var("STRIDE_DATA_DIR").ok().map(PathBuf::from);
        Self {
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            storage_dir,
        }
    }
}

impl NetworkConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the queue bound
    pub fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Override the retry cap
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Pin the storage directory instead of resolving the platform default
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }
}
