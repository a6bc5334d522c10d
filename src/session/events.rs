//! Session events
//!
//! Everything the capture subsystem tells its UI collaborator travels through
//! one tagged event enum on one channel.

use crate::commit::types::{CommitResult, CommittedFile};
use crate::session::assets::StagedAsset;
use crate::session::mode::CaptureMode;
use crate::utils::error::ErrorResponse;
use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Events emitted to the UI collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SessionEvent {
    ModeChanged { mode: CaptureMode },
    AssetAdded { asset: StagedAsset },
    AssetRemoved { asset: StagedAsset },
    /// A staged asset's file was replaced in place (photo edit)
    AssetUpdated { asset: StagedAsset },
    /// A scratch file was assigned to a new recording
    RecordingStarted { path: PathBuf },
    SegmentAppended { index: usize, duration_ms: u64 },
    SegmentRemoved { index: usize, duration_ms: u64 },
    RecordingTooShort { elapsed_ms: u64 },
    /// The recording hit the maximum duration; the camera should stop
    MaxDurationReached { path: PathBuf, duration_ms: u64 },
    RecordingFailed { message: String },
    /// Merge progress, always below 100
    MergeProgress { percent: u8 },
    /// Merge done; implies 100%
    MergeFinished { output_path: PathBuf },
    MergeCancelled,
    MergeError { message: String },
    CompressProgress { percent: u8 },
    CommitProgress { percent: u8 },
    CommitResult { result: CommitResult },
    CommitError {
        error: ErrorResponse,
        asset_id: Option<Uuid>,
        committed: Vec<CommittedFile>,
    },
    CommitCancelled { committed: Vec<CommittedFile> },
    /// Whether capture controls should accept input
    ControlsEnabled { enabled: bool },
}

/// Sending half of the event channel, shared with background workers
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: SessionEvent) {
        tracing::trace!(?event, "Emitting session event");
        if self.tx.send(event).is_err() {
            tracing::debug!("Session event dropped: no collaborator is listening");
        }
    }
}
