//! Masked credential status reported back to owners.

use serde::Serialize;

/// Preview shown when a key is too short to mask or cannot be decrypted.
pub const UNREADABLE_PREVIEW: &str = "****";

/// Number of characters revealed at each end of a masked key.
const VISIBLE_CHARS: usize = 4;

/// Whether an owner has a key stored, with a masked preview of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    /// Whether a key is stored.
    pub has_key: bool,
    /// Masked preview of the stored key.
    pub preview: Option<String>,
}

impl CredentialStatus {
    /// Status of an owner with no stored key.
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            has_key: false,
            preview: None,
        }
    }

    /// Status of an owner whose key masks to `preview`.
    #[must_use]
    pub const fn present(preview: String) -> Self {
        Self {
            has_key: true,
            preview: Some(preview),
        }
    }
}

/// Masks a key to its first and last four characters.
///
/// Keys of eight characters or fewer are fully masked.
#[must_use]
pub fn key_preview(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let visible = VISIBLE_CHARS.saturating_mul(2);
    if chars.len() <= visible {
        return UNREADABLE_PREVIEW.to_owned();
    }
    let head: String = chars.iter().take(VISIBLE_CHARS).collect();
    let tail: String = chars
        .iter()
        .skip(chars.len().saturating_sub(VISIBLE_CHARS))
        .collect();
    format!("{head}...{tail}")
}
