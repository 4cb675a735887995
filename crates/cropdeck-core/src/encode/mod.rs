//! Image encoding for Cropdeck exports.
//!
//! This module provides functionality for:
//! - Encoding saved crops to JPEG with configurable quality
//! - Encoding the quick-download preview to PNG
//! - The [`Blob`] type that carries encoded bytes with their format
//!
//! Encoding is synchronous; [`to_blob`](crate::transform::to_blob) wraps it in
//! the async surface-to-blob step.

mod jpeg;
mod png;

pub use jpeg::{encode_jpeg, quality_to_percent};
pub use png::encode_png;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while encoding pixels.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The encoder itself failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// The encoder finished without producing any bytes
    #[error("Encoder produced no data")]
    NoData,
}

/// Output encodings supported by exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }
}

/// Encoded image bytes tagged with their format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(format: OutputFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode RGB pixels in the requested format.
///
/// `quality` follows the canvas convention (`0.0..=1.0`) and only affects JPEG.
/// An encoder that returns an empty buffer is reported as `EncodeError::NoData`.
pub fn encode(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: OutputFormat,
    quality: f32,
) -> Result<Blob, EncodeError> {
    let bytes = match format {
        OutputFormat::Jpeg => encode_jpeg(pixels, width, height, quality_to_percent(quality))?,
        OutputFormat::Png => encode_png(pixels, width, height)?,
    };

    if bytes.is_empty() {
        return Err(EncodeError::NoData);
    }
    Ok(Blob::new(format, bytes))
}

pub(crate) fn validate_rgb(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_names() {
        assert_eq!(OutputFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpeg");
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
        assert_eq!(OutputFormat::Png.extension(), "png");
    }

    #[test]
    fn test_encode_dispatches_by_format() {
        let pixels = vec![200u8; 4 * 4 * 3];

        let jpeg = encode(&pixels, 4, 4, OutputFormat::Jpeg, 1.0).unwrap();
        assert_eq!(jpeg.mime_type(), "image/jpeg");
        assert_eq!(&jpeg.bytes[0..2], &[0xFF, 0xD8]);

        let png = encode(&pixels, 4, 4, OutputFormat::Png, 1.0).unwrap();
        assert_eq!(png.mime_type(), "image/png");
        assert_eq!(&png.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_encode_zero_sized_fails() {
        assert!(encode(&[], 0, 0, OutputFormat::Jpeg, 1.0).is_err());
        assert!(encode(&[], 0, 0, OutputFormat::Png, 1.0).is_err());
    }
}
