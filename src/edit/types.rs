//! Edit job types
//!
//! Types shared by the merge/compress coordinator and the tools it drives.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// What an edit job does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Concatenate section segments into one file
    Merge,
    /// Re-encode one file
    Compress,
}

/// Lifecycle of an edit job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Running,
    Done,
    Cancelled,
    Failed,
}

/// Snapshot of the coordinator's job slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeJob {
    pub id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    /// 0..=100; 100 only once the job is done
    pub progress: u8,
    pub output_path: Option<PathBuf>,
}

impl MergeJob {
    pub fn idle() -> Self {
        Self {
            id: Uuid::nil(),
            kind: JobKind::Merge,
            status: JobStatus::Idle,
            progress: 0,
            output_path: None,
        }
    }

    pub fn running(kind: JobKind, output_path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: JobStatus::Running,
            progress: 0,
            output_path: Some(output_path),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }
}

/// How a job ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Finished(PathBuf),
    Cancelled,
    Failed(String),
}

/// Errors reported by a video tool
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Failed(String),

    #[error("cancelled")]
    Cancelled,
}

/// Compression quality levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressQuality {
    Low,
    Medium,
    High,
}

impl Default for CompressQuality {
    fn default() -> Self {
        Self::Medium
    }
}

impl CompressQuality {
    /// CRF value for H.264 encoding; lower is higher quality
    pub fn crf(&self) -> u8 {
        match self {
            CompressQuality::Low => 30,
            CompressQuality::Medium => 26,
            CompressQuality::High => 20,
        }
    }

    pub fn h264_preset(&self) -> &'static str {
        match self {
            CompressQuality::Low => "veryfast",
            CompressQuality::Medium => "faster",
            CompressQuality::High => "medium",
        }
    }
}

/// Handed to a tool while it runs: cancellation flag plus progress sink
pub struct JobControl {
    cancel_flag: Arc<AtomicBool>,
    /// Cancel flag of the caller that requested the job, if any
    linked: Option<Arc<AtomicBool>>,
    progress: Box<dyn FnMut(f64) + Send>,
}

impl JobControl {
    pub fn new(cancel_flag: Arc<AtomicBool>, progress: Box<dyn FnMut(f64) + Send>) -> Self {
        Self {
            cancel_flag,
            linked: None,
            progress,
        }
    }

    /// Also treat the job as cancelled once `linked` is set
    pub fn with_linked(mut self, linked: Option<Arc<AtomicBool>>) -> Self {
        self.linked = linked;
        self
    }

    /// Control that never cancels and drops progress
    pub fn detached() -> Self {
        Self::new(Arc::new(AtomicBool::new(false)), Box::new(|_| {}))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
            || self
                .linked
                .as_ref()
                .is_some_and(|linked| linked.load(Ordering::Relaxed))
    }

    /// Report completed fraction in `0.0..=1.0`
    pub fn report(&mut self, fraction: f64) {
        (self.progress)(fraction);
    }
}

/// Convert a completed fraction into an in-flight percentage.
///
/// 100 is never returned here: it is reserved for the finish event.
pub fn in_flight_percent(fraction: f64) -> u8 {
    if !fraction.is_finite() || fraction <= 0.0 {
        return 0;
    }
    ((fraction * 100.0).floor() as u32).min(99) as u8
}
