// Copyright (c) 2025 InstaDetect
// SPDX-License-Identifier: BUSL-1.1
//! Upload decoding and validation

use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Maximum accepted upload (10MB)
const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Errors while turning uploaded bytes into a bitmap
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload is empty")]
    EmptyData,

    #[error("upload is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("unsupported image format")]
    UnsupportedFormat,

    #[error("failed to decode image: {0}")]
    DecodeFailed(String),
}

/// Metadata extracted while decoding an upload
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub size_bytes: usize,
}

/// Decode raw multipart upload bytes into a bitmap.
///
/// The format is sniffed from magic bytes rather than trusted from the
/// upload's filename or content type.
pub fn decode_upload(bytes: &[u8]) -> Result<(DynamicImage, ImageInfo), UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::EmptyData);
    }
    if bytes.len() > MAX_UPLOAD_SIZE {
        return Err(UploadError::TooLarge(bytes.len(), MAX_UPLOAD_SIZE));
    }

    let format = sniff_format(bytes)?;
    let image = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| UploadError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: image.width(),
        height: image.height(),
        format,
        size_bytes: bytes.len(),
    };
    Ok((image, info))
}

/// Detect the image format from magic bytes.
fn sniff_format(bytes: &[u8]) -> Result<ImageFormat, UploadError> {
    if bytes.len() < 4 {
        return Err(UploadError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 P N G
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),
        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),
        // GIF87a / GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),
        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),
        _ => Err(UploadError::UnsupportedFormat),
    }
}
