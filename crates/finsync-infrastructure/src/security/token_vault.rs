use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};

use finsync_domain::session::TokenStore;
use finsync_domain::shared::DomainError;
use finsync_domain::storage::{keys, KeyValueStore};

use super::encryption::SALT_LEN;
use super::EncryptionService;

const SALT_KEY: &str = "security.token_salt";

/// Access-token persistence over the device key-value store.
///
/// Plain text by default; with a secret the token is sealed with
/// AES-256-GCM, matching a platform secure store.
pub struct TokenVault {
    store: Arc<dyn KeyValueStore>,
    cipher: Option<EncryptionService>,
}

impl TokenVault {
    pub fn plain(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cipher: None,
        }
    }

    /// Encrypting vault; the salt is created on first use and kept in the store
    pub async fn encrypted(store: Arc<dyn KeyValueStore>, secret: &str) -> Result<Self, DomainError> {
        let salt = match store.get(SALT_KEY).await? {
            Some(encoded) => decode_salt(&encoded)?,
            None => {
                let salt = EncryptionService::generate_salt();
                store
                    .set(SALT_KEY, &general_purpose::STANDARD.encode(salt))
                    .await?;
                salt
            }
        };
        let cipher = EncryptionService::from_secret(secret, &salt)?;
        Ok(Self {
            store,
            cipher: Some(cipher),
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }
}

fn decode_salt(encoded: &str) -> Result<[u8; SALT_LEN], DomainError> {
    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| DomainError::Encryption(format!("Corrupt token salt: {}", e)))?;
    bytes
        .try_into()
        .map_err(|_| DomainError::Encryption("Token salt has the wrong length".to_string()))
}

#[async_trait]
impl TokenStore for TokenVault {
    async fn load(&self) -> Result<Option<String>, DomainError> {
        let Some(stored) = self.store.get(keys::AUTH_TOKEN).await? else {
            return Ok(None);
        };

        match &self.cipher {
            None => Ok(Some(stored)),
            Some(cipher) => match cipher.decrypt(&stored) {
                Ok(token) => Ok(Some(token)),
                Err(e) => {
                    // Written under another secret or tampered with: unusable either way
                    log::warn!("Discarding unreadable stored token: {}", e);
                    self.store.remove(keys::AUTH_TOKEN).await?;
                    Ok(None)
                }
            },
        }
    }

    async fn save(&self, token: &str) -> Result<(), DomainError> {
        let value = match &self.cipher {
            Some(cipher) => cipher.encrypt(token)?,
            None => token.to_string(),
        };
        self.store.set(keys::AUTH_TOKEN, &value).await
    }

    async fn clear(&self) -> Result<(), DomainError> {
        self.store.remove(keys::AUTH_TOKEN).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryKeyValueStore;

    #[tokio::test]
    async fn test_plain_vault_roundtrip() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let vault = TokenVault::plain(store.clone());

        assert!(vault.load().await.unwrap().is_none());
        vault.save("tok").await.unwrap();
        assert_eq!(vault.load().await.unwrap().as_deref(), Some("tok"));
        assert_eq!(
            store.get(keys::AUTH_TOKEN).await.unwrap().as_deref(),
            Some("tok")
        );

        vault.clear().await.unwrap();
        assert!(vault.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_encrypted_vault_hides_token_at_rest() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let vault = TokenVault::encrypted(store.clone(), "device-secret")
            .await
            .unwrap();
        assert!(vault.is_encrypted());

        vault.save("tok-123").await.unwrap();
        let at_rest = store.get(keys::AUTH_TOKEN).await.unwrap().unwrap();
        assert!(!at_rest.contains("tok-123"));

        // A second vault over the same store reuses the persisted salt
        let reopened = TokenVault::encrypted(store.clone(), "device-secret")
            .await
            .unwrap();
        assert_eq!(reopened.load().await.unwrap().as_deref(), Some("tok-123"));
    }

    #[tokio::test]
    async fn test_unreadable_token_is_discarded() {
        let store = Arc::new(MemoryKeyValueStore::new());
        TokenVault::encrypted(store.clone(), "first")
            .await
            .unwrap()
            .save("tok")
            .await
            .unwrap();

        let other = TokenVault::encrypted(store.clone(), "second").await.unwrap();
        assert!(other.load().await.unwrap().is_none());
        assert!(store.get(keys::AUTH_TOKEN).await.unwrap().is_none());
    }
}
