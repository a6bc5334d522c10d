//! Capture mode
//!
//! The finite state of a capture session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Current mode of the capture surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureMode {
    /// Idle preview, nothing staged
    Preview,
    /// One photo staged, the image limit is 1
    SinglePhoto,
    /// One or more photos staged, more may follow
    MultiPhoto,
    /// Recording a single video
    VideoRecording,
    /// A recording ended below the minimum duration and is being rolled back
    VideoRecordingShort,
    /// Section recording: zero or more segments kept, possibly one in progress
    SectionRecording,
    /// Section recording merged into one file
    SectionComplete,
    /// A single video finished and is staged
    VideoComplete,
}

impl Default for CaptureMode {
    fn default() -> Self {
        Self::Preview
    }
}

impl CaptureMode {
    pub fn is_photo(&self) -> bool {
        matches!(self, CaptureMode::SinglePhoto | CaptureMode::MultiPhoto)
    }

    pub fn is_section(&self) -> bool {
        matches!(self, CaptureMode::SectionRecording | CaptureMode::SectionComplete)
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureMode::Preview => "Preview",
            CaptureMode::SinglePhoto => "SinglePhoto",
            CaptureMode::MultiPhoto => "MultiPhoto",
            CaptureMode::VideoRecording => "VideoRecording",
            CaptureMode::VideoRecordingShort => "VideoRecordingShort",
            CaptureMode::SectionRecording => "SectionRecording",
            CaptureMode::SectionComplete => "SectionComplete",
            CaptureMode::VideoComplete => "VideoComplete",
        };
        f.write_str(name)
    }
}
