//! Commit types

use crate::session::assets::AssetKind;
use crate::utils::error::{CaptureError, CaptureResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One asset migrated into permanent storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedFile {
    /// Id of the staged asset this came from
    pub asset_id: Uuid,
    pub kind: AssetKind,
    pub permanent_path: PathBuf,
    pub content_uri: String,
}

/// Everything a commit persisted, in submission order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    pub files: Vec<CommittedFile>,
}

impl CommitResult {
    pub fn paths(&self) -> Vec<&Path> {
        self.files.iter().map(|f| f.permanent_path.as_path()).collect()
    }

    pub fn uris(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.content_uri.as_str()).collect()
    }
}

/// How a pipeline run ended
#[derive(Debug)]
pub enum CommitOutcome {
    Complete,
    /// Asset `asset_id` failed; nothing after it was attempted
    Failed {
        asset_id: Option<Uuid>,
        error: CaptureError,
    },
    Cancelled,
}

/// Files migrated by a pipeline run plus how the run ended
#[derive(Debug)]
pub struct CommitReport {
    pub committed: Vec<CommittedFile>,
    pub outcome: CommitOutcome,
}

impl CommitReport {
    pub fn is_complete(&self) -> bool {
        matches!(self.outcome, CommitOutcome::Complete)
    }
}

/// Optional photo compression collaborator.
///
/// Called on a blocking worker thread. Returns the path of the compressed
/// file, which may be `path` itself.
pub trait Compressor: Send + Sync {
    fn compress_file(&self, path: &Path) -> CaptureResult<PathBuf>;
}
