//! Thumbnail derivation for published diagrams.

use image::ImageFormat;
use image::imageops::FilterType;
use std::io::Cursor;
use std::num::NonZeroU32;
use thiserror::Error;

/// Failure to decode the source image or encode the thumbnail.
#[derive(Debug, Error)]
#[error("thumbnail rendering failed: {0}")]
pub struct ThumbnailError(#[from] image::ImageError);

/// Renders a PNG thumbnail at most `max_width` pixels wide.
///
/// The aspect ratio is preserved and Lanczos3 resampling is used. Images
/// already narrower than `max_width` are re-encoded at their own size.
///
/// # Errors
///
/// Returns [`ThumbnailError`] when `bytes` is not a decodable image.
pub fn render_thumbnail(bytes: &[u8], max_width: NonZeroU32) -> Result<Vec<u8>, ThumbnailError> {
    let source = image::load_from_memory(bytes)?;
    let thumbnail = if source.width() > max_width.get() {
        source.resize(max_width.get(), u32::MAX, FilterType::Lanczos3)
    } else {
        source
    };

    let mut encoded = Cursor::new(Vec::new());
    thumbnail.write_to(&mut encoded, ImageFormat::Png)?;
    Ok(encoded.into_inner())
}
