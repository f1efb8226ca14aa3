mod timeouts;

use std::path::PathBuf;
use std::time::Duration;

use finsync_domain::shared::DomainError;
use serde::{Deserialize, Serialize};
use url::Url;

pub use timeouts::TimeoutConfig;

pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/v1";

pub const ENV_API_URL: &str = "FINSYNC_API_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "FINSYNC_HTTP_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "FINSYNC_DATA_DIR";
pub const ENV_TOKEN_SECRET: &str = "FINSYNC_TOKEN_SECRET";

/// Freshness and polling defaults for cached resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub default_stale_time: Duration,
    pub dashboard_stale_time: Duration,
    pub analytics_stale_time: Duration,
    /// Background polling period for the dashboard summary
    pub dashboard_refetch_interval: Option<Duration>,
    pub default_per_page: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_stale_time: Duration::from_secs(30),
            dashboard_stale_time: Duration::from_secs(60),
            analytics_stale_time: Duration::from_secs(300),
            dashboard_refetch_interval: Some(Duration::from_secs(300)),
            default_per_page: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    /// Encrypt the access token at rest
    pub encrypt_token: bool,
    /// Secret the token key is derived from. Required when `encrypt_token` is set.
    #[serde(skip_serializing)]
    pub token_secret: Option<String>,
}

impl StorageConfig {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("finsync");
        Self {
            data_dir,
            database_file: "finsync.db".to_string(),
            encrypt_token: false,
            token_secret: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceConfig {
    pub api_base_url: Url,
    pub timeouts: TimeoutConfig,
    pub cache: CacheConfig,
    pub storage: StorageConfig,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            timeouts: TimeoutConfig::default(),
            cache: CacheConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl FinanceConfig {
    /// Defaults overlaid with `FINSYNC_*` environment variables
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_API_URL) {
            config.api_base_url = Url::parse(&raw).map_err(|e| {
                DomainError::InvalidInput(format!("{} '{}': {}", ENV_API_URL, raw, e))
            })?;
        }

        if let Some(raw) = lookup(ENV_HTTP_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                DomainError::InvalidInput(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    ENV_HTTP_TIMEOUT_SECS, raw
                ))
            })?;
            if secs == 0 {
                return Err(DomainError::InvalidInput(format!(
                    "{} must be greater than zero",
                    ENV_HTTP_TIMEOUT_SECS
                )));
            }
            config.timeouts.http_request = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(ENV_DATA_DIR) {
            config.storage.data_dir = PathBuf::from(raw);
        }

        if let Some(secret) = lookup(ENV_TOKEN_SECRET).filter(|s| !s.is_empty()) {
            config.storage.encrypt_token = true;
            config.storage.token_secret = Some(secret);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !matches!(self.api_base_url.scheme(), "http" | "https") {
            return Err(DomainError::InvalidInput(format!(
                "API URL must be http or https, got '{}'",
                self.api_base_url
            )));
        }
        if self.storage.encrypt_token && self.storage.token_secret.is_none() {
            return Err(DomainError::InvalidInput(
                "Token encryption requires a token secret".to_string(),
            ));
        }
        if self.cache.default_per_page == 0 {
            return Err(DomainError::InvalidInput(
                "Page size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
