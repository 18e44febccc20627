//! Error types module
//!
//! All failures of the adjustment pipeline and the image service are unified
//! under [`MediaError`]. Each variant describes itself through [`ErrorMetadata`]
//! so callers can decide how to log it and whether a retry makes sense.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be reported
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "IMAGE_FILE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether the caller may retry the operation
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Source bytes are missing, unreadable or cannot be decoded.
    #[error("Image file error: {0}")]
    ImageFile(String),

    /// An adjustment was configured with a value outside its allowed domain.
    #[error("Invalid adjustment configuration for \"{field}\" (value \"{value}\"): {reason}")]
    InvalidAdjustmentConfiguration {
        field: String,
        value: String,
        reason: String,
    },

    /// Service level configuration (e.g. output quality) is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An item handed to the pipeline does not provide the image adjustment capability.
    #[error("Adjustment contract violation: {0}")]
    AdjustmentContractViolation(String),

    /// Encoding succeeded but the storage collaborator refused the result.
    #[error("Import failure: {0}")]
    ImportFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type used across the processing crates
pub type MediaResult<T> = Result<T, MediaError>;

impl MediaError {
    /// Shorthand for an adjustment configuration error on `field`.
    pub fn invalid_adjustment(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        MediaError::InvalidAdjustmentConfiguration {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<io::Error> for MediaError {
    fn from(err: io::Error) -> Self {
        MediaError::ImageFile(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for MediaError {
    fn from(err: serde_json::Error) -> Self {
        MediaError::InvalidConfiguration(format!("JSON parsing error: {}", err))
    }
}

impl ErrorMetadata for MediaError {
    fn error_code(&self) -> &'static str {
        match self {
            MediaError::ImageFile(_) => "IMAGE_FILE_ERROR",
            MediaError::InvalidAdjustmentConfiguration { .. } => {
                "INVALID_ADJUSTMENT_CONFIGURATION"
            }
            MediaError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            MediaError::AdjustmentContractViolation(_) => "ADJUSTMENT_CONTRACT_VIOLATION",
            MediaError::ImportFailure(_) => "IMPORT_FAILURE",
            MediaError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, MediaError::ImportFailure(_))
    }

    fn log_level(&self) -> LogLevel {
        match self {
            MediaError::InvalidAdjustmentConfiguration { .. }
            | MediaError::InvalidConfiguration(_) => LogLevel::Debug,
            MediaError::ImageFile(_) | MediaError::ImportFailure(_) => LogLevel::Warn,
            MediaError::AdjustmentContractViolation(_) | MediaError::Internal(_) => {
                LogLevel::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_adjustment_message_names_field_and_value() {
        let err = MediaError::invalid_adjustment("verticalPosition", "foo", "unknown anchor");
        let message = err.to_string();
        assert!(message.contains("verticalPosition"));
        assert!(message.contains("foo"));
        assert_eq!(err.error_code(), "INVALID_ADJUSTMENT_CONFIGURATION");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_only_import_failure_is_recoverable() {
        assert!(MediaError::ImportFailure("store offline".into()).is_recoverable());
        assert!(!MediaError::ImageFile("missing".into()).is_recoverable());
        assert!(!MediaError::AdjustmentContractViolation("x".into()).is_recoverable());
    }

    #[test]
    fn test_io_error_maps_to_image_file() {
        let err: MediaError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, MediaError::ImageFile(_)));
    }
}
