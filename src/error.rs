//! Custom error types for tensorbatch.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the tensorbatch library.
#[derive(Error, Debug)]
pub enum Error {
    /// A tensor has a rank other than 3 (CHW) or 4 (NCHW).
    #[error("expected tensor to have 3 or 4 dimensions, got {rank}{}", at_index(.index))]
    InvalidShape { rank: usize, index: Option<usize> },

    /// A sequence element is not a tensor.
    #[error("expected tensor, got {type_name} at index {index}")]
    InvalidElementType {
        type_name: &'static str,
        index: usize,
    },

    /// The top-level input is neither a tensor nor a sequence.
    #[error("expected tensor or sequence of tensors, got {type_name}")]
    InvalidInputType { type_name: &'static str },

    /// A normalized entry does not have the configured channel count.
    #[error("expected {expected} channels, got {actual} at index {index}")]
    ChannelMismatch {
        expected: usize,
        actual: usize,
        index: usize,
    },

    /// Normalization produced no entries where at least one was required.
    #[error("input contains no images")]
    EmptyInput,

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Tensor shape cannot be written as an image.
    #[error("cannot save tensor of shape {shape:?} as an image")]
    UnsupportedShape { shape: Vec<usize> },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[allow(clippy::ref_option)]
fn at_index(index: &Option<usize>) -> String {
    index.map_or_else(String::new, |i| format!(" at index {i}"))
}

/// Result type alias for tensorbatch operations.
pub type Result<T> = std::result::Result<T, Error>;
