use async_trait::async_trait;

use crate::shared::DomainError;

/// Well-known keys in the device key-value store
pub mod keys {
    pub const AUTH_TOKEN: &str = "auth.token";
    pub const LOCALE: &str = "prefs.locale";
    pub const THEME: &str = "prefs.theme";
    pub const ONBOARDING_PREFIX: &str = "onboarding.";
}

/// Persistent key-value store on the device
///
/// Single writer per key; no cross-process locking.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;
    async fn remove(&self, key: &str) -> Result<(), DomainError>;
}
