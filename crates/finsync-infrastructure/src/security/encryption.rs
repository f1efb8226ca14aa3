use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use argon2::Argon2;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;

use finsync_domain::shared::DomainError;

/// 96-bit GCM nonce
const NONCE_LEN: usize = 12;
/// GCM authentication tag appended to every ciphertext
const TAG_LEN: usize = 16;
pub const SALT_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncryptionError {
    #[error("Could not derive token key: {0}")]
    KeyDerivation(String),

    #[error("Token cipher failed: {0}")]
    Cipher(String),

    #[error("Stored token is malformed: {0}")]
    Malformed(String),
}

impl From<EncryptionError> for DomainError {
    fn from(err: EncryptionError) -> Self {
        DomainError::Encryption(err.to_string())
    }
}

/// Seals short secrets (the access token) for storage at rest.
///
/// AES-256-GCM, keyed by Argon2id over a device secret and a stored salt.
/// Sealed form is base64 of `nonce || ciphertext || tag`.
pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl EncryptionService {
    pub fn from_secret(secret: &str, salt: &[u8; SALT_LEN]) -> Result<Self, EncryptionError> {
        let key = derive_key(secret, salt)?;
        Ok(Self {
            cipher: Aes256Gcm::new(&key),
        })
    }

    pub fn generate_salt() -> [u8; SALT_LEN] {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        salt
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| EncryptionError::Cipher(e.to_string()))?;
        Ok(STANDARD.encode([nonce.as_slice(), &sealed].concat()))
    }

    pub fn decrypt(&self, sealed: &str) -> Result<String, EncryptionError> {
        let raw = STANDARD
            .decode(sealed.trim())
            .map_err(|e| EncryptionError::Malformed(e.to_string()))?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(EncryptionError::Malformed(format!(
                "{} bytes is shorter than nonce and tag",
                raw.len()
            )));
        }

        let (nonce, body) = raw.split_at(NONCE_LEN);
        let opened = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|e| EncryptionError::Cipher(e.to_string()))?;
        String::from_utf8(opened).map_err(|e| EncryptionError::Malformed(e.to_string()))
    }
}

fn derive_key(secret: &str, salt: &[u8]) -> Result<Key<Aes256Gcm>, EncryptionError> {
    if secret.is_empty() {
        return Err(EncryptionError::KeyDerivation(
            "secret cannot be empty".to_string(),
        ));
    }
    let mut key = Key::<Aes256Gcm>::default();
    Argon2::default()
        .hash_password_into(secret.as_bytes(), salt, &mut key)
        .map_err(|e| EncryptionError::KeyDerivation(e.to_string()))?;
    Ok(key)
}
