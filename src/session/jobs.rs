//! Background jobs of a capture session
//!
//! Starting section merges and commits, applying their reports, and tearing
//! down a session while workers may still hold its files.

use crate::commit::pipeline::CommitPipeline;
use crate::commit::types::{CommitOutcome, CommitReport, CommitResult};
use crate::edit::types::JobOutcome;
use crate::session::assets::{AssetKind, StagedAsset, StagedAssetStore};
use crate::session::events::SessionEvent;
use crate::session::machine::{CaptureSession, SessionInput};
use crate::session::mode::CaptureMode;
use crate::session::timeline::SectionTimeline;
use crate::storage::strategy::create_capture_path;
use crate::utils::error::{CaptureError, CaptureResult, ErrorResponse};
use crate::utils::fs::remove_file_best_effort;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::SendError;
use uuid::Uuid;

/// Manifest written next to the segments for a section merge
const SECTION_MANIFEST: &str = "section_manifest.txt";

/// A merge result and the timeline revision it was made from
#[derive(Debug, Clone)]
pub(super) struct MergedOutput {
    pub(super) asset: StagedAsset,
    pub(super) revision: u64,
}

#[derive(Debug)]
pub(super) enum PendingJob {
    Merge {
        job_id: Uuid,
        output: PathBuf,
    },
    Commit {
        commit_id: u64,
        cancel_flag: Arc<AtomicBool>,
        /// Scratch paths the pipeline is working on
        paths: Vec<PathBuf>,
    },
}

/// The event that tells the collaborator how a commit ended
fn commit_event(report: CommitReport) -> SessionEvent {
    match report.outcome {
        CommitOutcome::Complete => SessionEvent::CommitResult {
            result: CommitResult {
                files: report.committed,
            },
        },
        CommitOutcome::Failed { asset_id, error } => SessionEvent::CommitError {
            error: ErrorResponse::from(&error),
            asset_id,
            committed: report.committed,
        },
        CommitOutcome::Cancelled => SessionEvent::CommitCancelled {
            committed: report.committed,
        },
    }
}

impl CaptureSession {
    pub(super) fn start_merge(&mut self) -> CaptureResult<()> {
        let coordinator = self
            .coordinator
            .clone()
            .ok_or_else(|| CaptureError::Config("section merge needs a video tool".to_string()))?;
        let runtime = current_runtime()?;

        self.discard_merged();
        let scratch = self.storage.scratch_dir();
        let output = create_capture_path(&scratch, AssetKind::VideoSegment)?;
        let manifest = scratch.join(SECTION_MANIFEST);
        let ticket = coordinator.merge(&output, &self.timeline.paths(), &manifest)?;
        let job_id = ticket.job.id;

        self.pending = Some(PendingJob::Merge { job_id, output });
        self.outstanding += 1;
        self.set_controls_enabled(false);

        let tx = self.input_tx.clone();
        runtime.spawn(async move {
            let outcome = ticket.finished().await;
            let _ = tx.send(SessionInput::MergeDone { job_id, outcome });
        });
        Ok(())
    }

    pub(super) fn start_commit(&mut self, assets: Vec<StagedAsset>) -> CaptureResult<()> {
        let runtime = current_runtime()?;
        self.commit_seq += 1;
        let commit_id = self.commit_seq;
        let cancel_flag = Arc::new(AtomicBool::new(false));
        let paths = assets.iter().map(|a| a.scratch_path.clone()).collect();
        let total = assets.len();

        let video_compressor = if self.config.compress_videos {
            self.coordinator.clone()
        } else {
            None
        };
        let pipeline = CommitPipeline::new(
            assets,
            self.storage.clone(),
            self.media_index.clone(),
            self.events.clone(),
            cancel_flag.clone(),
        )
        .with_compressor(self.compressor.clone())
        .with_video_compressor(video_compressor);

        tracing::info!(commit = commit_id, total, "Starting commit");
        self.pending = Some(PendingJob::Commit {
            commit_id,
            cancel_flag,
            paths,
        });
        self.outstanding += 1;
        self.set_controls_enabled(false);

        let tx = self.input_tx.clone();
        let events = self.events.clone();
        runtime.spawn(async move {
            let report = match tokio::task::spawn_blocking(move || pipeline.run()).await {
                Ok(report) => report,
                Err(e) => CommitReport {
                    committed: Vec::new(),
                    outcome: CommitOutcome::Failed {
                        asset_id: None,
                        error: CaptureError::Io {
                            path: PathBuf::new(),
                            source: std::io::Error::other(format!("commit task panicked: {}", e)),
                        },
                    },
                },
            };
            // The session is gone; report straight to the collaborator
            if let Err(SendError(SessionInput::CommitDone { report, .. })) =
                tx.send(SessionInput::CommitDone { commit_id, report })
            {
                tracing::info!(commit = commit_id, "Commit finished after session was dropped");
                events.emit(commit_event(report));
            }
        });
        Ok(())
    }

    pub(super) fn on_merge_done(&mut self, job_id: Uuid, outcome: JobOutcome) {
        let output = match self.pending.take() {
            Some(PendingJob::Merge { job_id: id, output }) if id == job_id => output,
            other => {
                self.pending = other;
                tracing::debug!(job = %job_id, "Report from abandoned merge");
                if let JobOutcome::Finished(path) = &outcome {
                    remove_file_best_effort(path);
                }
                self.flush_deferred();
                return;
            }
        };

        match outcome {
            JobOutcome::Finished(path) => {
                debug_assert_eq!(path, output);
                let uri = self.storage.content_uri(AssetKind::VideoSegment, &path);
                let asset = StagedAsset::new(AssetKind::VideoSegment, path, uri);
                self.merged = Some(MergedOutput {
                    asset: asset.clone(),
                    revision: self.timeline.revision(),
                });
                self.set_mode(CaptureMode::SectionComplete);
                if let Err(e) = self.start_commit(vec![asset]) {
                    tracing::error!("Failed to start commit after merge: {}", e);
                    self.events.emit(SessionEvent::CommitError {
                        error: ErrorResponse::from(&e),
                        asset_id: None,
                        committed: Vec::new(),
                    });
                    self.set_controls_enabled(true);
                }
            }
            JobOutcome::Cancelled => {
                tracing::info!("Section merge cancelled");
                self.set_controls_enabled(true);
            }
            JobOutcome::Failed(message) => {
                tracing::error!("Section merge failed: {}", message);
                self.set_controls_enabled(true);
            }
        }
    }

    pub(super) fn on_commit_done(&mut self, commit_id: u64, report: CommitReport) {
        match self.pending.take() {
            Some(PendingJob::Commit { commit_id: id, .. }) if id == commit_id => {}
            other => {
                // Torn down mid-commit: staged state is gone, but whatever the
                // worker migrated is permanent and must still be reported
                self.pending = other;
                tracing::info!(
                    commit = commit_id,
                    committed = report.committed.len(),
                    "Report from abandoned commit"
                );
                self.events.emit(commit_event(report));
                self.flush_deferred();
                return;
            }
        }

        for file in &report.committed {
            self.assets.remove(file.asset_id);
            if self
                .merged
                .as_ref()
                .is_some_and(|m| m.asset.id == file.asset_id)
            {
                self.merged = None;
            }
        }

        match &report.outcome {
            CommitOutcome::Complete => {
                let segments = self.timeline.discard_all();
                self.discard_merged();
                for asset in self.assets.discard_all() {
                    tracing::warn!(asset = %asset.id, "Staged asset was not part of the commit");
                }
                tracing::info!(
                    files = report.committed.len(),
                    segments,
                    "Commit finished"
                );
                self.set_mode(CaptureMode::Preview);
            }
            CommitOutcome::Failed { .. } | CommitOutcome::Cancelled => self.reconcile_mode(),
        }
        self.events.emit(commit_event(report));
        self.set_controls_enabled(true);
    }

    /// After a partial commit, fall back to `Preview` if nothing is left
    fn reconcile_mode(&mut self) {
        let empty = match self.mode {
            CaptureMode::SinglePhoto | CaptureMode::MultiPhoto => self.assets.photo_count() == 0,
            CaptureMode::VideoComplete => self.assets.video_count() == 0,
            CaptureMode::SectionRecording | CaptureMode::SectionComplete => {
                self.timeline.is_empty()
            }
            _ => false,
        };
        if empty {
            self.assets.discard_all();
            self.timeline.discard_all();
            self.discard_merged();
            self.set_mode(CaptureMode::Preview);
        } else if self.mode == CaptureMode::SectionComplete && self.merged.is_none() {
            self.set_mode(CaptureMode::SectionRecording);
        }
    }

    pub(super) fn flush_deferred(&mut self) {
        if self.outstanding == 0 {
            for path in self.deferred_cleanup.drain(..) {
                remove_file_best_effort(&path);
            }
        }
    }

    /// Cancel jobs and timers and delete every uncommitted file
    pub(super) fn teardown(&mut self) {
        self.press.disarm();
        self.deadline.disarm();

        let mut in_flight = Vec::new();
        match self.pending.take() {
            Some(PendingJob::Merge { output, .. }) => {
                if let Some(coordinator) = &self.coordinator {
                    coordinator.cancel();
                }
                in_flight.push(output);
                // Segments are read by the merge until it stops
                in_flight.extend(self.timeline.paths());
            }
            Some(PendingJob::Commit {
                cancel_flag, paths, ..
            }) => {
                cancel_flag.store(true, Ordering::Relaxed);
                if let Some(coordinator) = &self.coordinator {
                    coordinator.cancel();
                }
                in_flight.extend(paths);
            }
            None => {}
        }

        if let Some(path) = self.active_recording.take() {
            remove_file_best_effort(&path);
        }
        if let Some(request) = self.editing.take() {
            remove_file_best_effort(&request.output_path);
        }

        let staged = self
            .assets
            .snapshot()
            .into_iter()
            .map(|a| a.scratch_path)
            .chain(self.timeline.paths())
            .chain(self.merged.take().map(|m| m.asset.scratch_path));
        for path in staged {
            if in_flight.contains(&path) {
                continue;
            }
            remove_file_best_effort(&path);
        }
        self.assets = StagedAssetStore::new();
        self.timeline = SectionTimeline::new();

        if !in_flight.is_empty() {
            tracing::debug!(files = in_flight.len(), "Deferring cleanup of in-flight files");
            self.deferred_cleanup.extend(in_flight);
            self.set_controls_enabled(true);
        }
        self.set_mode(CaptureMode::Preview);
    }
}

fn current_runtime() -> CaptureResult<Handle> {
    Handle::try_current()
        .map_err(|_| CaptureError::Config("background jobs need a running tokio runtime".to_string()))
}
