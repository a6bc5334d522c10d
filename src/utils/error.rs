//! Error types and handling
//!
//! Common error types used across the capture session, the edit coordinator
//! and the commit pipeline.

use crate::session::limits::MediaKind;
use crate::session::mode::CaptureMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Crate-wide error type
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Selection limit reached: at most {limit} {kind} item(s)")]
    LimitReached { kind: MediaKind, limit: u32 },

    #[error("Illegal transition: '{event}' is not allowed in mode {mode}")]
    IllegalTransition {
        event: &'static str,
        mode: CaptureMode,
    },

    #[error("Recording too short: {elapsed_ms}ms")]
    RecordingTooShort { elapsed_ms: u64 },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Merge error: {0}")]
    MergeFailure(String),

    #[error("An edit job is already running")]
    AlreadyRunning,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Unknown asset: {0}")]
    UnknownAsset(Uuid),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CaptureError {
    /// Wrap an IO error together with the path it happened on
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        CaptureError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn illegal(event: &'static str, mode: CaptureMode) -> Self {
        CaptureError::IllegalTransition { event, mode }
    }

    /// Stable machine-readable code for the frontend
    pub fn code(&self) -> &'static str {
        match self {
            CaptureError::LimitReached { .. } => "LIMIT_REACHED",
            CaptureError::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            CaptureError::RecordingTooShort { .. } => "RECORDING_TOO_SHORT",
            CaptureError::Io { .. } => "IO_FAILURE",
            CaptureError::MergeFailure(_) => "MERGE_FAILURE",
            CaptureError::AlreadyRunning => "ALREADY_RUNNING",
            CaptureError::Cancelled => "CANCELLED",
            CaptureError::UnknownAsset(_) => "UNKNOWN_ASSET",
            CaptureError::Config(_) => "CONFIG_ERROR",
            CaptureError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Error response for the UI collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&CaptureError> for ErrorResponse {
    fn from(error: &CaptureError) -> Self {
        ErrorResponse {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

impl From<CaptureError> for ErrorResponse {
    fn from(error: CaptureError) -> Self {
        ErrorResponse::from(&error)
    }
}

/// Result type alias using CaptureError
pub type CaptureResult<T> = Result<T, CaptureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_codes() {
        let err = CaptureError::LimitReached {
            kind: MediaKind::Image,
            limit: 1,
        };
        let response = ErrorResponse::from(&err);
        assert_eq!(response.code, "LIMIT_REACHED");
        assert!(response.message.contains("at most 1 image"));

        let err = CaptureError::illegal("start_recording", CaptureMode::MultiPhoto);
        assert_eq!(err.code(), "ILLEGAL_TRANSITION");
        assert!(err.to_string().contains("start_recording"));
    }

    #[test]
    fn test_io_error_carries_path() {
        let err = CaptureError::io(
            "/tmp/scratch/VIDEO_1.mp4",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "IO_FAILURE");
        assert!(err.to_string().contains("VIDEO_1.mp4"));
    }
}
