//! Image decoding and grayscale conversion.
//!
//! First pipeline step: raw encoded bytes in, single-channel intensity
//! image out. Every downstream stage operates on the `GrayImage`
//! produced here; the color original is never consulted again.

use image::GrayImage;

use crate::types::PipelineError;

/// Decode raw image bytes and convert to single-channel intensity.
///
/// Accepts whatever the `image` crate can decode (PNG, JPEG, BMP, WebP).
/// Color input is reduced with the standard luminance weighting
/// `0.299·R + 0.587·G + 0.114·B`; grayscale input passes through.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] for an empty byte slice and
/// [`PipelineError::ImageDecode`] for unrecognized or corrupt data. Both
/// are fatal to the whole pipeline: there is no partial preprocessing
/// result.
pub fn decode_and_grayscale(bytes: &[u8]) -> Result<GrayImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    let decoded = image::load_from_memory(bytes)?;
    Ok(decoded.to_luma8())
}
