//! Error types for model loading, corruption and snapshot writing

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for corruptor operations
pub type Result<T> = std::result::Result<T, CorruptorError>;

/// Errors that can occur while loading, corrupting or saving a model
#[derive(Debug, Error)]
pub enum CorruptorError {
    /// Model file not found
    #[error("Model file not found: {path}")]
    FileNotFound {
        /// Path that was attempted
        path: PathBuf,
    },

    /// Container parsing failed
    #[error("Failed to parse model: {reason}")]
    ParseError {
        /// Reason for failure
        reason: String,
    },

    /// Tensor dtype not understood by the container codec
    #[error("Unsupported tensor dtype: {dtype}")]
    UnsupportedDtype {
        /// Dtype tag from the header
        dtype: String,
    },

    /// Tensor header or payload is inconsistent
    #[error("Invalid tensor '{name}': {reason}")]
    InvalidTensor {
        /// Tensor name
        name: String,
        /// Reason for failure
        reason: String,
    },

    /// Corruption schedule cannot produce increasing factors
    #[error("Invalid corruption schedule: {reason}")]
    InvalidSchedule {
        /// Reason for failure
        reason: String,
    },

    /// Model file name yields no usable output directory stem
    #[error("Cannot derive output directory from model name: {name}")]
    InvalidModelName {
        /// Model name as given
        name: String,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Header JSON error
    #[error("Header JSON error: {source}")]
    Json {
        /// Underlying JSON error
        #[from]
        source: serde_json::Error,
    },
}

impl CorruptorError {
    /// Create a parse error
    pub fn parse_error(reason: impl Into<String>) -> Self {
        Self::ParseError {
            reason: reason.into(),
        }
    }

    /// Create an invalid tensor error
    pub fn invalid_tensor(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTensor {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid schedule error
    pub fn invalid_schedule(reason: impl Into<String>) -> Self {
        Self::InvalidSchedule {
            reason: reason.into(),
        }
    }

    /// Create an unsupported dtype error
    pub fn unsupported_dtype(dtype: impl Into<String>) -> Self {
        Self::UnsupportedDtype {
            dtype: dtype.into(),
        }
    }
}
