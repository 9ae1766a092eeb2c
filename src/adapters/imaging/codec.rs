//! Image decoding for uploads and JPEG data-URL encoding for previews.

use base64::{prelude::BASE64_STANDARD, Engine};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, RgbImage};
use thiserror::Error;

/// Quality used for annotated previews.
pub const PREVIEW_JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is empty")]
    EmptyData,

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Failed to encode image: {0}")]
    EncodeFailed(String),
}

/// Drops a `data:image/...;base64,` header if present.
pub fn strip_data_url(data: &str) -> &str {
    match data.split_once(',') {
        Some((_, payload)) => payload,
        None => data,
    }
}

/// Decodes a base64 image, with or without a data-URL header. Line breaks
/// and other ASCII whitespace from wrapping encoders are ignored.
pub fn decode_base64_image(data: &str) -> Result<DynamicImage, ImageError> {
    let payload: String = strip_data_url(data)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if payload.is_empty() {
        return Err(ImageError::EmptyData);
    }
    let bytes = BASE64_STANDARD.decode(payload)?;
    decode_image_bytes(&bytes)
}

/// Decode raw image bytes, guessing the container format from magic bytes.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }
    image::load_from_memory(bytes).map_err(|e| ImageError::DecodeFailed(e.to_string()))
}

pub fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode_image(rgb)
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
    Ok(buf)
}

pub fn jpeg_data_url(rgb: &RgbImage, quality: u8) -> Result<String, ImageError> {
    let jpeg = encode_jpeg(rgb, quality)?;
    Ok(format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(jpeg)))
}
