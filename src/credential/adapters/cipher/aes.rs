//! AES-256-GCM cipher storing `base64(nonce || ciphertext)`.

use crate::credential::{
    domain::EncryptedSecret,
    ports::{CipherError, SecretCipher},
};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use secrecy::SecretString;

/// Required key length in bytes.
pub const ENCRYPTION_KEY_LEN: usize = 32;

/// Nonce length for AES-256-GCM (96 bits).
const NONCE_LEN: usize = 12;

/// AES-256-GCM cipher with a fresh random nonce per encryption.
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    /// Creates a cipher from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKey`] unless `key` is exactly 32 bytes.
    pub fn from_key(key: &[u8]) -> Result<Self, CipherError> {
        if key.len() != ENCRYPTION_KEY_LEN {
            return Err(CipherError::InvalidKey(format!(
                "key must be {ENCRYPTION_KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|err| CipherError::InvalidKey(err.to_string()))?;
        Ok(Self { cipher })
    }

    /// Creates a cipher from a base64-encoded 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKey`] when the text is not base64 or
    /// does not decode to 32 bytes.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CipherError> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|err| CipherError::InvalidKey(err.to_string()))?;
        Self::from_key(&key)
    }
}

impl SecretCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<EncryptedSecret, CipherError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|err| CipherError::Encrypt(err.to_string()))?;

        let mut combined = nonce.to_vec();
        combined.extend(ciphertext);
        Ok(EncryptedSecret::new(STANDARD.encode(combined)))
    }

    fn decrypt(&self, secret: &EncryptedSecret) -> Result<SecretString, CipherError> {
        let combined = STANDARD
            .decode(secret.as_str())
            .map_err(|err| CipherError::Decrypt(err.to_string()))?;
        let (nonce_bytes, ciphertext) = combined
            .split_at_checked(NONCE_LEN)
            .ok_or_else(|| CipherError::Decrypt("ciphertext too short".to_owned()))?;

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|err| CipherError::Decrypt(err.to_string()))?;
        let text =
            String::from_utf8(plaintext).map_err(|err| CipherError::Decrypt(err.to_string()))?;
        Ok(SecretString::from(text))
    }
}
