//! Result and error types for Cotejar.

use crate::image::ImageKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for Cotejar operations
pub type CotejarResult<T> = Result<T, CotejarError>;

/// Errors that can occur in Cotejar
#[derive(Debug, Error)]
pub enum CotejarError {
    /// Invalid parameter passed to a metric or kernel builder
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Error message
        message: String,
    },

    /// Two images differ in height, width or channel count
    #[error("Image shapes don't match: {left:?} vs {right:?}")]
    ShapeMismatch {
        /// Shape of the first image (H, W, C)
        left: [usize; 3],
        /// Shape of the second image (H, W, C)
        right: [usize; 3],
    },

    /// One image is RGB, the other hyperspectral
    #[error("Cannot compare different image types: {left} vs {right}")]
    TypeMismatch {
        /// Kind of the first image
        left: ImageKind,
        /// Kind of the second image
        right: ImageKind,
    },

    /// Channel count matches neither RGB nor the hyperspectral band count
    #[error("Unknown image type with {channels} channel(s). Expected 3 (RGB) or {expected} (HSI)")]
    UnsupportedChannelCount {
        /// Channel count found in the array
        channels: usize,
        /// Expected hyperspectral band count
        expected: usize,
    },

    /// Input path does not resolve to a file
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that failed to resolve
        path: PathBuf,
    },

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode a .npy array
    #[error("Failed to read array from {path}: {message}")]
    ArrayRead {
        /// Path of the offending file
        path: PathBuf,
        /// Decoder error message
        message: String,
    },

    /// Malformed persisted report
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Aggregate CSV export error
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),
}

impl CotejarError {
    /// Create an invalid-parameter error
    #[must_use]
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a shape-mismatch error from two (H, W, C) shapes
    #[must_use]
    pub fn shape_mismatch(left: [usize; 3], right: [usize; 3]) -> Self {
        Self::ShapeMismatch { left, right }
    }

    /// Create an array-read error for a path
    #[must_use]
    pub fn array_read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ArrayRead {
            path: path.into(),
            message: message.into(),
        }
    }
}
