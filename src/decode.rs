//! Turning the base 64 request payload into bytes, and bytes into pixels

use crate::error::DetectError;
use base64::{engine::general_purpose, Engine as _};
use image::RgbImage;

/// Decode a standard (padded) base 64 string. ASCII whitespace anywhere in
/// the text is ignored, so line-wrapped (MIME style) payloads decode too. An
/// empty result is rejected
pub fn decode_base64(data: &str) -> Result<Vec<u8>, DetectError> {
    let data: String = data.split_ascii_whitespace().collect();
    let bytes = general_purpose::STANDARD.decode(data)?;
    if bytes.is_empty() {
        return Err(DetectError::Decode("image_data is empty".into()));
    }
    Ok(bytes)
}

/// Decode an in-memory image of any supported format into RGB8
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, DetectError> {
    let image = image::load_from_memory(bytes)?.to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(DetectError::Decode("image has no pixels".into()));
    }
    Ok(image)
}
