//! Error types for OxiLZMA operations.
//!
//! The codec distinguishes two failure classes:
//!
//! - [`LzmaError::InvalidParameter`]: malformed configuration (properties out
//!   of range, short property buffer). Raised before any data is processed.
//! - [`LzmaError::DataError`]: corrupt or truncated compressed input (illegal
//!   back-reference distance, premature end of input, misplaced end marker).
//!   Raised mid-stream and fatal for the current pass.
//!
//! Failures of the caller's own reader or writer surface as [`LzmaError::Io`].

use std::io;
use thiserror::Error;

/// The main error type for OxiLZMA operations.
#[derive(Debug, Error)]
pub enum LzmaError {
    /// I/O error from the underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid codec parameter.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of the rejected parameter.
        message: String,
    },

    /// Corrupted or truncated compressed data.
    #[error("Corrupted data at offset {offset}: {message}")]
    DataError {
        /// Stream position where the corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Buffer too small for operation.
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },
}

/// Result type alias for OxiLZMA operations.
pub type Result<T> = std::result::Result<T, LzmaError>;

impl LzmaError {
    /// Create an invalid parameter error.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a corrupted data error.
    pub fn data_error(offset: u64, message: impl Into<String>) -> Self {
        Self::DataError {
            offset,
            message: message.into(),
        }
    }

    /// Create the error raised when compressed input ends early.
    pub fn truncated(offset: u64) -> Self {
        Self::data_error(offset, "unexpected end of compressed input")
    }

    /// Create the error raised for a back-reference outside the window.
    pub fn invalid_distance(offset: u64, distance: u32, limit: u64) -> Self {
        Self::data_error(
            offset,
            format!("back-reference distance {distance} exceeds history size {limit}"),
        )
    }

    /// Create a buffer too small error.
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Self::BufferTooSmall { needed, available }
    }

    /// Whether this error reports corrupt compressed input.
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::DataError { .. })
    }

    /// Whether this error reports a rejected configuration.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LzmaError::invalid_parameter("lc = 9");
        assert!(err.to_string().contains("lc = 9"));

        let err = LzmaError::invalid_distance(10, 12, 10);
        assert!(err.to_string().contains("offset 10"));
        assert!(err.to_string().contains("distance 12"));

        let err = LzmaError::buffer_too_small(16, 4);
        assert!(err.to_string().contains("need 16"));
    }

    #[test]
    fn test_predicates() {
        assert!(LzmaError::truncated(0).is_data_error());
        assert!(!LzmaError::truncated(0).is_invalid_parameter());
        assert!(LzmaError::invalid_parameter("pb").is_invalid_parameter());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "closed");
        let err: LzmaError = io_err.into();
        assert!(matches!(err, LzmaError::Io(_)));
    }
}
