use std::time::Duration;

use finsync_infrastructure::config::CacheConfig;

use super::KeyPrefix;

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long a fetched value counts as fresh
    pub stale_time: Duration,
    /// Background polling period while the slot exists
    pub refetch_interval: Option<Duration>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            refetch_interval: None,
        }
    }
}

impl QueryOptions {
    pub fn fresh_for(stale_time: Duration) -> Self {
        Self {
            stale_time,
            refetch_interval: None,
        }
    }

    pub fn with_refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval);
        self
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::fresh_for(config.default_stale_time)
    }
}

/// Cache maintenance applied after a successful write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOptions {
    pub invalidates: Vec<KeyPrefix>,
    pub removes: Vec<KeyPrefix>,
}

impl MutationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(mut self, prefix: impl Into<KeyPrefix>) -> Self {
        self.invalidates.push(prefix.into());
        self
    }

    pub fn remove(mut self, prefix: impl Into<KeyPrefix>) -> Self {
        self.removes.push(prefix.into());
        self
    }
}
