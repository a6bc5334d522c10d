//! Commit pipeline
//!
//! Migrates staged assets from scratch storage into permanent storage, one at
//! a time, on a blocking worker. Runs until the list is exhausted, an asset
//! fails, or the cancel flag is observed between file operations.

use crate::commit::types::{CommitOutcome, CommitReport, CommittedFile, Compressor};
use crate::edit::coordinator::EditCoordinator;
use crate::edit::types::JobOutcome;
use crate::session::assets::{AssetKind, StagedAsset};
use crate::session::events::{EventSink, SessionEvent};
use crate::storage::strategy::unique_path;
use crate::storage::{MediaIndex, StoragePaths};
use crate::utils::error::{CaptureError, CaptureResult};
use crate::utils::fs::{move_file, remove_file_best_effort};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Aggregate progress after `done` of `total` assets.
///
/// Each asset is worth `round(100 / total)`; the sum stays at or below 99
/// until the last asset is done.
pub fn commit_percent(done: usize, total: usize) -> u8 {
    if total == 0 || done >= total {
        return 100;
    }
    let step = (100.0 / total as f64).round() as usize;
    (step * done).min(99) as u8
}

pub struct CommitPipeline {
    assets: Vec<StagedAsset>,
    storage: Arc<dyn StoragePaths>,
    media_index: Arc<dyn MediaIndex>,
    compressor: Option<Arc<dyn Compressor>>,
    /// Set when staged videos should be re-encoded before migration
    video_compressor: Option<Arc<EditCoordinator>>,
    events: EventSink,
    cancel_flag: Arc<AtomicBool>,
}

impl CommitPipeline {
    pub fn new(
        assets: Vec<StagedAsset>,
        storage: Arc<dyn StoragePaths>,
        media_index: Arc<dyn MediaIndex>,
        events: EventSink,
        cancel_flag: Arc<AtomicBool>,
    ) -> Self {
        Self {
            assets,
            storage,
            media_index,
            compressor: None,
            video_compressor: None,
            events,
            cancel_flag,
        }
    }

    pub fn with_compressor(mut self, compressor: Option<Arc<dyn Compressor>>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_video_compressor(mut self, coordinator: Option<Arc<EditCoordinator>>) -> Self {
        self.video_compressor = coordinator;
        self
    }

    /// Run the pipeline. Blocks; call from a worker thread.
    pub fn run(&self) -> CommitReport {
        let total = self.assets.len();
        tracing::info!("Starting commit of {} asset(s)", total);

        let mut committed = Vec::with_capacity(total);
        for (index, asset) in self.assets.iter().enumerate() {
            if self.is_cancelled() {
                tracing::info!("Commit cancelled after {} asset(s)", committed.len());
                return CommitReport {
                    committed,
                    outcome: CommitOutcome::Cancelled,
                };
            }

            match self.commit_one(asset) {
                Ok(file) => {
                    tracing::debug!(
                        asset = %asset.id,
                        path = %file.permanent_path.display(),
                        "Committed asset"
                    );
                    committed.push(file);
                    // A registered file stays committed; stop before the next one
                    if index + 1 < total && self.is_cancelled() {
                        tracing::info!("Commit cancelled after {} asset(s)", committed.len());
                        return CommitReport {
                            committed,
                            outcome: CommitOutcome::Cancelled,
                        };
                    }
                    if index + 1 < total {
                        self.events.emit(SessionEvent::CommitProgress {
                            percent: commit_percent(index + 1, total),
                        });
                    }
                }
                Err(CaptureError::Cancelled) => {
                    tracing::info!("Commit cancelled during asset {}", asset.id);
                    return CommitReport {
                        committed,
                        outcome: CommitOutcome::Cancelled,
                    };
                }
                Err(error) => {
                    tracing::error!(asset = %asset.id, "Commit failed: {}", error);
                    return CommitReport {
                        committed,
                        outcome: CommitOutcome::Failed {
                            asset_id: Some(asset.id),
                            error,
                        },
                    };
                }
            }
        }

        self.events.emit(SessionEvent::CommitProgress { percent: 100 });
        tracing::info!("Commit complete: {} asset(s)", committed.len());
        CommitReport {
            committed,
            outcome: CommitOutcome::Complete,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    fn commit_one(&self, asset: &StagedAsset) -> CaptureResult<CommittedFile> {
        let file_name = asset
            .file_name()
            .ok_or_else(|| CaptureError::Config(format!("asset {} has no file name", asset.id)))?
            .to_string();
        let destination = unique_path(&self.storage.permanent_dir(asset.kind)?, &file_name);

        let source = self.prepare(asset)?;
        let compressed = source != asset.scratch_path;

        if self.is_cancelled() {
            if compressed {
                remove_file_best_effort(&source);
            }
            return Err(CaptureError::Cancelled);
        }

        if let Err(e) = move_file(&source, &destination) {
            if compressed {
                remove_file_best_effort(&source);
            }
            return Err(e);
        }
        if compressed {
            remove_file_best_effort(&asset.scratch_path);
        }

        if self.is_cancelled() {
            self.restore(asset, &destination);
            return Err(CaptureError::Cancelled);
        }

        if let Err(e) = self.media_index.register(&destination, asset.kind) {
            self.restore(asset, &destination);
            return Err(e);
        }

        Ok(CommittedFile {
            asset_id: asset.id,
            kind: asset.kind,
            content_uri: self.storage.content_uri(asset.kind, &destination),
            permanent_path: destination,
        })
    }

    /// Produce the file to migrate: the scratch file, or a compressed copy
    fn prepare(&self, asset: &StagedAsset) -> CaptureResult<PathBuf> {
        match asset.kind {
            AssetKind::Photo => match &self.compressor {
                Some(compressor) => compressor.compress_file(&asset.scratch_path),
                None => Ok(asset.scratch_path.clone()),
            },
            AssetKind::VideoSegment => match &self.video_compressor {
                Some(coordinator) => {
                    let output = compressed_path(&asset.scratch_path);
                    let ticket = coordinator.compress_linked(
                        &asset.scratch_path,
                        &output,
                        Some(self.cancel_flag.clone()),
                    )?;
                    match ticket.wait_blocking() {
                        JobOutcome::Finished(path) => Ok(path),
                        JobOutcome::Cancelled => Err(CaptureError::Cancelled),
                        JobOutcome::Failed(message) => Err(CaptureError::MergeFailure(message)),
                    }
                }
                None => Ok(asset.scratch_path.clone()),
            },
        }
    }

    /// Undo a migration whose asset must stay staged
    fn restore(&self, asset: &StagedAsset, destination: &Path) {
        if let Err(e) = move_file(destination, &asset.scratch_path) {
            tracing::warn!(
                path = %destination.display(),
                "Failed to return file to scratch storage: {}",
                e
            );
            remove_file_best_effort(destination);
        }
    }
}

fn compressed_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mp4".to_string());
    path.with_file_name(format!("{stem}_compressed.{extension}"))
}
