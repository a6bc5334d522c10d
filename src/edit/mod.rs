//! Video edit module
//!
//! Merge of section segments and clip compression, coordinated as
//! single-flight background jobs.

pub mod coordinator;
pub mod ffmpeg;
pub mod tool;
pub mod types;

pub use coordinator::{EditCoordinator, JobTicket};
pub use ffmpeg::FfmpegTool;
pub use tool::VideoTool;
pub use types::{CompressQuality, JobControl, JobKind, JobOutcome, JobStatus, MergeJob, ToolError};
