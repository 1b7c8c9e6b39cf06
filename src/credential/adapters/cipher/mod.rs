//! Cipher adapters for credentials at rest.

mod aes;

pub use aes::{AesGcmCipher, ENCRYPTION_KEY_LEN};
