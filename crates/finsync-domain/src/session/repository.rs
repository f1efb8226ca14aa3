use async_trait::async_trait;

use crate::shared::DomainError;

/// Durable storage for the session access token
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, DomainError>;
    async fn save(&self, token: &str) -> Result<(), DomainError>;
    async fn clear(&self) -> Result<(), DomainError>;
}
