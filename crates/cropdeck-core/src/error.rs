//! Error taxonomy shared by sessions, the batch and exports.

use thiserror::Error;

use crate::decode::DecodeError;
use crate::encode::EncodeError;
use crate::export::ExportError;

/// Everything a crop workflow operation can fail with.
#[derive(Debug, Error)]
pub enum CropError {
    /// Unreadable or unsupported image bytes.
    #[error("Decode failure: {0}")]
    DecodeFailure(#[from] DecodeError),

    /// A transform was asked for with an unusable geometry.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A surface could not be turned into encoded bytes.
    #[error("Encode failure: {0}")]
    EncodeFailure(#[from] EncodeError),

    /// An archive was requested before anything was saved.
    #[error("Nothing to export: no crops have been saved")]
    EmptyExportSet,

    /// The archive writer failed.
    #[error("Archive failure: {0}")]
    ArchiveFailure(#[from] ExportError),

    /// Save or preview requested without a committed crop.
    #[error("No committed crop for this image")]
    MissingCrop,

    /// The batch holds no images.
    #[error("No image is loaded")]
    NoActiveImage,

    /// Another save is still in flight on this batch.
    #[error("A save is already in progress")]
    Busy,

    /// A result arrived for a batch that has since been replaced.
    #[error("Result belongs to a replaced batch (epoch {ticket}, current {current})")]
    StaleResult { ticket: u64, current: u64 },
}

impl CropError {
    /// Whether retrying the same operation could succeed without other changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CropError::EncodeFailure(_) | CropError::Busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            CropError::EmptyExportSet.to_string(),
            "Nothing to export: no crops have been saved"
        );
        assert_eq!(
            CropError::StaleResult {
                ticket: 1,
                current: 2
            }
            .to_string(),
            "Result belongs to a replaced batch (epoch 1, current 2)"
        );
    }

    #[test]
    fn test_from_decode_error() {
        let err: CropError = DecodeError::InvalidFormat.into();
        assert!(matches!(err, CropError::DecodeFailure(_)));
        assert_eq!(err.to_string(), "Decode failure: Invalid or unsupported image format");
    }

    #[test]
    fn test_retryable() {
        assert!(CropError::EncodeFailure(EncodeError::NoData).is_retryable());
        assert!(!CropError::EmptyExportSet.is_retryable());
        assert!(!CropError::MissingCrop.is_retryable());
    }
}
