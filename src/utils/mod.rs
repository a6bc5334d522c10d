//! Shared utilities

pub mod error;
pub mod fs;

pub use error::{CaptureError, CaptureResult, ErrorResponse};
