//! Capture session state machine
//!
//! Owns the capture mode, the staged assets and the section timeline. Every
//! transition happens on the caller's context; merge and commit work runs on
//! background workers whose results come back as [`SessionInput`] and are
//! applied by [`CaptureSession::handle_input`].

use crate::commit::types::{CommitReport, Compressor};
use crate::edit::coordinator::EditCoordinator;
use crate::edit::tool::VideoTool;
use crate::edit::types::JobOutcome;
use crate::session::assets::{AssetKind, StagedAsset, StagedAssetStore};
use crate::session::config::SessionConfig;
use crate::session::deadline::{RecordingDeadline, RecordingId};
use crate::session::events::{EventSink, SessionEvent};
use crate::session::jobs::{MergedOutput, PendingJob};
use crate::session::limits::{GestureMode, MediaKind};
use crate::session::mode::CaptureMode;
use crate::session::press::{PressId, PressRelease, PressTimer};
use crate::session::timeline::{SectionSegment, SectionTimeline};
use crate::storage::strategy::create_capture_path;
use crate::storage::{DirectoryStorage, MediaIndex, StoragePaths};
use crate::utils::error::{CaptureError, CaptureResult};
use crate::utils::fs::{is_non_empty_file, remove_file_best_effort};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Inputs produced by timers and background workers
#[derive(Debug)]
pub enum SessionInput {
    /// The long-press timer for this press fired
    LongPress(PressId),
    /// The recording hit the configured maximum duration
    MaxDurationReached(RecordingId),
    MergeDone { job_id: Uuid, outcome: JobOutcome },
    CommitDone { commit_id: u64, report: CommitReport },
}

/// Result of [`CaptureSession::stop_recording`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Too short; the scratch file was deleted
    RolledBack { elapsed_ms: u64 },
    SegmentAppended { index: usize, duration_ms: u64 },
    VideoFinalized(StagedAsset),
}

/// Handed to the edit collaborator by [`CaptureSession::edit_photo`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub asset_id: Uuid,
    pub source_path: PathBuf,
    /// Where the editor must write the edited photo
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Saved,
    Discarded,
}

pub struct CaptureSession {
    pub(super) config: SessionConfig,
    pub(super) mode: CaptureMode,
    section_enabled: bool,
    pub(super) assets: StagedAssetStore,
    pub(super) timeline: SectionTimeline,
    /// Scratch file of the recording in progress
    pub(super) active_recording: Option<PathBuf>,
    pub(super) merged: Option<MergedOutput>,
    pub(super) editing: Option<EditRequest>,
    pub(super) pending: Option<PendingJob>,
    /// Jobs whose report has not been handled yet, including abandoned ones
    pub(super) outstanding: usize,
    /// Files held by abandoned workers, deleted once their report arrives
    pub(super) deferred_cleanup: Vec<PathBuf>,
    pub(super) commit_seq: u64,
    pub(super) storage: Arc<dyn StoragePaths>,
    pub(super) media_index: Arc<dyn MediaIndex>,
    pub(super) compressor: Option<Arc<dyn Compressor>>,
    pub(super) coordinator: Option<Arc<EditCoordinator>>,
    pub(super) events: EventSink,
    pub(super) input_tx: mpsc::UnboundedSender<SessionInput>,
    input_rx: mpsc::UnboundedReceiver<SessionInput>,
    pub(super) press: PressTimer,
    pub(super) deadline: RecordingDeadline,
    closed: bool,
}

impl CaptureSession {
    /// Create a session in `Preview` whose files live where `config.storage`
    /// says.
    ///
    /// `tool` is needed for section merges and video compression; without it
    /// those operations fail with a configuration error. An invalid config
    /// (including a missing save strategy) is rejected here.
    pub fn new(
        config: SessionConfig,
        tool: Option<Arc<dyn VideoTool>>,
        compressor: Option<Arc<dyn Compressor>>,
        media_index: Arc<dyn MediaIndex>,
    ) -> CaptureResult<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        config.validate()?;
        let storage = Arc::new(DirectoryStorage::new(config.storage.clone())?);
        Self::with_storage(config, storage, tool, compressor, media_index)
    }

    /// Like [`new`](Self::new), but paths come from a custom storage
    /// collaborator and `config.storage` is not consulted
    pub fn with_storage(
        config: SessionConfig,
        storage: Arc<dyn StoragePaths>,
        tool: Option<Arc<dyn VideoTool>>,
        compressor: Option<Arc<dyn Compressor>>,
        media_index: Arc<dyn MediaIndex>,
    ) -> CaptureResult<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        config.validate_durations()?;
        let (events, events_rx) = EventSink::channel();
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let coordinator = tool.map(|tool| Arc::new(EditCoordinator::new(tool, events.clone())));
        let press = PressTimer::new(
            Duration::from_millis(config.long_press_delay_ms),
            config.min_duration_ms,
        );
        let deadline = RecordingDeadline::new(config.max_duration_ms);
        let section_enabled = config.section_recording && !config.limits.video_limit().is_disabled();

        tracing::debug!(?config.limits, section_enabled, "Capture session created");

        let session = Self {
            config,
            mode: CaptureMode::Preview,
            section_enabled,
            assets: StagedAssetStore::new(),
            timeline: SectionTimeline::new(),
            active_recording: None,
            merged: None,
            editing: None,
            pending: None,
            outstanding: 0,
            deferred_cleanup: Vec::new(),
            commit_seq: 0,
            storage,
            media_index,
            compressor,
            coordinator,
            events,
            input_tx,
            input_rx,
            press,
            deadline,
            closed: false,
        };
        Ok((session, events_rx))
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn staged_assets(&self) -> Vec<StagedAsset> {
        self.assets.snapshot()
    }

    pub fn photo_count(&self) -> usize {
        self.assets.photo_count()
    }

    pub fn segments(&self) -> &[SectionSegment] {
        self.timeline.segments()
    }

    pub fn is_section_mode(&self) -> bool {
        self.section_enabled
    }

    /// Path of the current merge result, if any
    pub fn merged_output(&self) -> Option<&Path> {
        self.merged.as_ref().map(|m| m.asset.scratch_path.as_path())
    }

    /// Whether a merge or commit is in flight
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_recording(&self) -> bool {
        self.active_recording.is_some()
    }

    /// Gestures the capture button accepts right now
    pub fn gesture_mode(&self) -> GestureMode {
        match self.mode {
            CaptureMode::MultiPhoto | CaptureMode::SinglePhoto => GestureMode::ClickOnly,
            CaptureMode::SectionRecording => GestureMode::LongPressOnly,
            _ => self.config.limits.gesture_mode(),
        }
    }

    // ---- capture ----

    /// Stage a photo from encoded image bytes
    pub fn capture_photo(&mut self, image: &[u8]) -> CaptureResult<StagedAsset> {
        const EVENT: &str = "capture_photo";
        self.ensure_idle(EVENT)?;
        match self.mode {
            CaptureMode::Preview | CaptureMode::SinglePhoto | CaptureMode::MultiPhoto
                if self.timeline.is_empty() => {}
            mode => return Err(self.reject(EVENT, mode)),
        }

        self.config
            .limits
            .check(MediaKind::Image, self.assets.photo_count(), self.assets.len())
            .inspect_err(|e| tracing::debug!("capture_photo rejected: {}", e))?;

        let path = create_capture_path(&self.storage.scratch_dir(), AssetKind::Photo)?;
        if let Err(e) = fs::write(&path, image) {
            remove_file_best_effort(&path);
            return Err(CaptureError::io(&path, e));
        }

        let asset = self.stage(AssetKind::Photo, path);
        let next = if self.config.limits.image_limit().is_exactly(1) {
            CaptureMode::SinglePhoto
        } else {
            CaptureMode::MultiPhoto
        };
        self.set_mode(next);
        Ok(asset)
    }

    /// Begin a recording and return the scratch file the camera should write
    pub fn start_recording(&mut self) -> CaptureResult<PathBuf> {
        const EVENT: &str = "start_recording";
        self.ensure_idle(EVENT)?;
        match self.mode {
            CaptureMode::Preview => {}
            CaptureMode::SectionRecording if self.active_recording.is_none() => {}
            mode => return Err(self.reject(EVENT, mode)),
        }

        self.config
            .limits
            .check(MediaKind::Video, self.assets.video_count(), self.assets.len())
            .inspect_err(|e| tracing::debug!("start_recording rejected: {}", e))?;

        let path = create_capture_path(&self.storage.scratch_dir(), AssetKind::VideoSegment)?;
        self.active_recording = Some(path.clone());
        self.deadline.arm(&self.input_tx);
        self.events.emit(SessionEvent::RecordingStarted { path: path.clone() });

        let next = if self.section_enabled {
            CaptureMode::SectionRecording
        } else {
            CaptureMode::VideoRecording
        };
        self.set_mode(next);
        Ok(path)
    }

    /// Flag the running recording as too short; it will be rolled back on stop
    pub fn mark_recording_short(&mut self, elapsed_ms: u64) -> CaptureResult<()> {
        if self.mode != CaptureMode::VideoRecording || self.active_recording.is_none() {
            return Err(self.reject("mark_recording_short", self.mode));
        }
        tracing::debug!(elapsed_ms, "Recording marked short");
        self.set_mode(CaptureMode::VideoRecordingShort);
        Ok(())
    }

    /// The camera finished writing the active recording
    pub fn stop_recording(&mut self, elapsed_ms: u64, short: bool) -> CaptureResult<StopOutcome> {
        const EVENT: &str = "stop_recording";
        let in_recording_mode = matches!(
            self.mode,
            CaptureMode::VideoRecording
                | CaptureMode::VideoRecordingShort
                | CaptureMode::SectionRecording
        );
        let path = match self.active_recording.take() {
            Some(path) if in_recording_mode => path,
            other => {
                self.active_recording = other;
                return Err(self.reject(EVENT, self.mode));
            }
        };
        self.deadline.disarm();

        if short || self.mode == CaptureMode::VideoRecordingShort {
            tracing::debug!(elapsed_ms, "Recording too short, rolling back");
            remove_file_best_effort(&path);
            self.revert_after_recording();
            self.events.emit(SessionEvent::RecordingTooShort { elapsed_ms });
            return Ok(StopOutcome::RolledBack { elapsed_ms });
        }

        if !is_non_empty_file(&path) {
            remove_file_best_effort(&path);
            self.revert_after_recording();
            let message = format!("recording produced no data at {}", path.display());
            self.events.emit(SessionEvent::RecordingFailed {
                message: message.clone(),
            });
            return Err(CaptureError::io(
                &path,
                std::io::Error::new(std::io::ErrorKind::NotFound, message),
            ));
        }

        if self.mode == CaptureMode::SectionRecording {
            let segment = self.timeline.push(path, elapsed_ms);
            let (index, duration_ms) = (segment.index, segment.duration_ms);
            tracing::debug!(index, duration_ms, "Segment appended");
            self.events
                .emit(SessionEvent::SegmentAppended { index, duration_ms });
            return Ok(StopOutcome::SegmentAppended { index, duration_ms });
        }

        let asset = self.stage(AssetKind::VideoSegment, path);
        self.set_mode(CaptureMode::VideoComplete);
        Ok(StopOutcome::VideoFinalized(asset))
    }

    /// The camera reported an error while recording
    pub fn recording_failed(&mut self, message: &str) -> CaptureResult<()> {
        let Some(path) = self.active_recording.take() else {
            return Err(self.reject("recording_failed", self.mode));
        };
        self.deadline.disarm();
        tracing::warn!(path = %path.display(), "Recording failed: {}", message);
        remove_file_best_effort(&path);
        self.revert_after_recording();
        self.events.emit(SessionEvent::RecordingFailed {
            message: message.to_string(),
        });
        Ok(())
    }

    // ---- staged content ----

    /// Remove the most recent section segment
    pub fn delete_last_segment(&mut self) -> CaptureResult<SectionSegment> {
        const EVENT: &str = "delete_last_segment";
        self.ensure_idle(EVENT)?;
        if !self.mode.is_section() || self.active_recording.is_some() || self.timeline.is_empty() {
            return Err(self.reject(EVENT, self.mode));
        }

        let Some(segment) = self.timeline.discard_last() else {
            return Err(self.reject(EVENT, self.mode));
        };
        self.discard_merged();
        self.events.emit(SessionEvent::SegmentRemoved {
            index: segment.index,
            duration_ms: segment.duration_ms,
        });

        if self.timeline.is_empty() {
            self.set_mode(CaptureMode::Preview);
        } else {
            self.set_mode(CaptureMode::SectionRecording);
        }
        Ok(segment)
    }

    /// Remove one staged photo
    pub fn remove_photo(&mut self, asset_id: Uuid) -> CaptureResult<StagedAsset> {
        const EVENT: &str = "remove_photo";
        self.ensure_idle(EVENT)?;
        if !self.mode.is_photo() {
            return Err(self.reject(EVENT, self.mode));
        }
        match self.assets.get(asset_id) {
            Some(asset) if asset.kind == AssetKind::Photo => {}
            _ => return Err(CaptureError::UnknownAsset(asset_id)),
        }
        if self.editing.as_ref().is_some_and(|e| e.asset_id == asset_id) {
            return Err(self.reject(EVENT, self.mode));
        }

        let asset = self
            .assets
            .discard(asset_id)
            .ok_or(CaptureError::UnknownAsset(asset_id))?;
        self.events.emit(SessionEvent::AssetRemoved {
            asset: asset.clone(),
        });
        if self.assets.photo_count() == 0 {
            self.set_mode(CaptureMode::Preview);
        }
        Ok(asset)
    }

    /// Toggle section recording; only while idle in `Preview`
    pub fn set_section_mode(&mut self, enabled: bool) -> CaptureResult<()> {
        const EVENT: &str = "set_section_mode";
        self.ensure_idle(EVENT)?;
        if self.mode != CaptureMode::Preview {
            return Err(self.reject(EVENT, self.mode));
        }
        if enabled && self.config.limits.video_limit().is_disabled() {
            return Err(CaptureError::Config(
                "section recording needs video capture to be enabled".to_string(),
            ));
        }
        tracing::debug!(enabled, "Section recording toggled");
        self.section_enabled = enabled;
        Ok(())
    }

    /// Ask for the single staged photo to be edited
    pub fn edit_photo(&mut self, asset_id: Uuid) -> CaptureResult<EditRequest> {
        const EVENT: &str = "edit_photo";
        self.ensure_idle(EVENT)?;
        if !self.config.image_edit_enabled {
            return Err(CaptureError::Config("image editing is disabled".to_string()));
        }
        if !self.mode.is_photo() || self.assets.photo_count() != 1 || self.editing.is_some() {
            return Err(self.reject(EVENT, self.mode));
        }
        let source_path = match self.assets.get(asset_id) {
            Some(asset) if asset.kind == AssetKind::Photo => asset.scratch_path.clone(),
            _ => return Err(CaptureError::UnknownAsset(asset_id)),
        };

        let output_path = create_capture_path(&self.storage.scratch_dir(), AssetKind::Photo)?;
        let request = EditRequest {
            asset_id,
            source_path,
            output_path,
        };
        tracing::debug!(asset = %asset_id, "Photo edit requested");
        self.editing = Some(request.clone());
        Ok(request)
    }

    /// Apply (or drop) the result of an edit requested with `edit_photo`
    pub fn complete_edit(
        &mut self,
        request: &EditRequest,
        outcome: EditOutcome,
    ) -> CaptureResult<Option<StagedAsset>> {
        match &self.editing {
            Some(current) if current == request => {}
            _ => return Err(self.reject("complete_edit", self.mode)),
        }
        self.editing = None;

        if outcome == EditOutcome::Discarded {
            remove_file_best_effort(&request.output_path);
            return Ok(None);
        }

        if !is_non_empty_file(&request.output_path) {
            remove_file_best_effort(&request.output_path);
            return Err(CaptureError::io(
                &request.output_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "edited photo is missing"),
            ));
        }

        let uri = self
            .storage
            .content_uri(AssetKind::Photo, &request.output_path);
        let previous = self
            .assets
            .replace_file(request.asset_id, &request.output_path, uri)
            .ok_or(CaptureError::UnknownAsset(request.asset_id))?;
        remove_file_best_effort(&previous);

        let asset = self
            .assets
            .get(request.asset_id)
            .cloned()
            .ok_or(CaptureError::UnknownAsset(request.asset_id))?;
        self.events.emit(SessionEvent::AssetUpdated {
            asset: asset.clone(),
        });
        Ok(Some(asset))
    }

    // ---- commit ----

    /// Confirm the staged content; merges section segments first when needed
    pub fn request_commit(&mut self) -> CaptureResult<()> {
        const EVENT: &str = "request_commit";
        self.ensure_idle(EVENT)?;
        if self.active_recording.is_some() || self.editing.is_some() {
            return Err(self.reject(EVENT, self.mode));
        }

        match self.mode {
            CaptureMode::SinglePhoto | CaptureMode::MultiPhoto | CaptureMode::VideoComplete
                if !self.assets.is_empty() =>
            {
                let assets = self.assets.snapshot();
                self.start_commit(assets)
            }
            CaptureMode::SectionRecording | CaptureMode::SectionComplete
                if !self.timeline.is_empty() =>
            {
                let revision = self.timeline.revision();
                let fresh = self
                    .merged
                    .as_ref()
                    .filter(|merged| merged.revision == revision)
                    .map(|merged| merged.asset.clone());
                match fresh {
                    Some(asset) => {
                        tracing::debug!("Reusing merge result");
                        self.start_commit(vec![asset])
                    }
                    None => self.start_merge(),
                }
            }
            mode => Err(self.reject(EVENT, mode)),
        }
    }

    /// Cancel an in-flight merge or commit, keeping staged content
    pub fn cancel_commit(&mut self) -> CaptureResult<()> {
        match &self.pending {
            Some(PendingJob::Commit { cancel_flag, .. }) => {
                tracing::info!("Cancelling commit");
                cancel_flag.store(true, Ordering::Relaxed);
                if let Some(coordinator) = &self.coordinator {
                    coordinator.cancel();
                }
                Ok(())
            }
            Some(PendingJob::Merge { .. }) => {
                tracing::info!("Cancelling section merge");
                if let Some(coordinator) = &self.coordinator {
                    coordinator.cancel();
                }
                Ok(())
            }
            None => Err(self.reject("cancel_commit", self.mode)),
        }
    }

    /// Discard everything staged in this session and return to `Preview`.
    ///
    /// Cleanup is best-effort: failed deletes are logged.
    pub fn cancel(&mut self) -> CaptureResult<()> {
        if self.mode == CaptureMode::Preview
            && self.pending.is_none()
            && self.active_recording.is_none()
        {
            return Err(self.reject("cancel", self.mode));
        }
        tracing::debug!(mode = %self.mode, "Cancelling session");
        self.teardown();
        Ok(())
    }

    // ---- press gestures ----

    /// Capture button pressed; arms the long-press timer when recording is possible
    pub fn press_down(&mut self) -> CaptureResult<PressId> {
        const EVENT: &str = "press_down";
        self.ensure_idle(EVENT)?;
        if self.active_recording.is_some()
            || !matches!(
            self.mode,
            CaptureMode::Preview
                | CaptureMode::SinglePhoto
                | CaptureMode::MultiPhoto
                | CaptureMode::SectionRecording
        )
        {
            return Err(self.reject(EVENT, self.mode));
        }
        let long_press = self.gesture_mode() != GestureMode::ClickOnly;
        Ok(self.press.press_down(long_press, &self.input_tx))
    }

    /// Capture button released.
    ///
    /// A release after a short long press marks the recording short; the
    /// caller still stops the camera and calls `stop_recording`.
    pub fn press_up(&mut self) -> PressRelease {
        let release = self.press.press_up();
        if let PressRelease::LongPressEnded {
            elapsed_ms,
            short: true,
        } = release
        {
            if self.mode == CaptureMode::VideoRecording {
                if let Err(e) = self.mark_recording_short(elapsed_ms) {
                    tracing::debug!("Could not mark recording short: {}", e);
                }
            }
        }
        release
    }

    /// Long-press timer fired: start recording unless the press is stale
    pub fn handle_long_press(&mut self, id: PressId) -> CaptureResult<Option<PathBuf>> {
        if !self.press.fire(id) {
            return Ok(None);
        }
        match self.start_recording() {
            Ok(path) => Ok(Some(path)),
            Err(e) => {
                self.press.disarm();
                Err(e)
            }
        }
    }

    /// Deadline fired: ask the camera to stop. The recording is kept; the
    /// collaborator finishes it with `stop_recording` as usual.
    fn handle_max_duration(&mut self, id: RecordingId) {
        if !self.deadline.fire(id) {
            return;
        }
        let (Some(path), Some(duration_ms)) = (&self.active_recording, self.deadline.limit_ms())
        else {
            return;
        };
        tracing::info!(path = %path.display(), duration_ms, "Maximum recording duration reached");
        self.events.emit(SessionEvent::MaxDurationReached {
            path: path.clone(),
            duration_ms,
        });
    }

    // ---- input loop ----

    /// Wait for the next timer or worker input
    pub async fn next_input(&mut self) -> Option<SessionInput> {
        self.input_rx.recv().await
    }

    pub fn handle_input(&mut self, input: SessionInput) {
        match input {
            SessionInput::LongPress(id) => {
                if let Err(e) = self.handle_long_press(id) {
                    tracing::debug!("Long press did not start recording: {}", e);
                }
            }
            SessionInput::MaxDurationReached(id) => self.handle_max_duration(id),
            SessionInput::MergeDone { job_id, outcome } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                self.on_merge_done(job_id, outcome);
            }
            SessionInput::CommitDone { commit_id, report } => {
                self.outstanding = self.outstanding.saturating_sub(1);
                self.on_commit_done(commit_id, report);
            }
        }
    }

    /// Process inputs until no background job is outstanding
    pub async fn settle(&mut self) {
        while self.outstanding > 0 {
            match self.input_rx.recv().await {
                Some(input) => self.handle_input(input),
                None => break,
            }
        }
    }

    /// Cancel everything, wait for workers to stop, then close
    pub async fn shutdown(mut self) {
        self.teardown();
        self.settle().await;
        self.close();
    }

    /// Tear the session down: staged files are deleted and the coordinator
    /// disposed. Later calls are no-ops.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.teardown();
        for path in self.deferred_cleanup.drain(..) {
            remove_file_best_effort(&path);
        }
        if let Some(coordinator) = &self.coordinator {
            coordinator.dispose();
        }
        tracing::debug!("Capture session closed");
    }

    // ---- internals ----

    fn ensure_idle(&self, event: &'static str) -> CaptureResult<()> {
        if self.closed || self.pending.is_some() {
            return Err(self.reject(event, self.mode));
        }
        Ok(())
    }

    fn reject(&self, event: &'static str, mode: CaptureMode) -> CaptureError {
        tracing::debug!(event, %mode, "Rejected event");
        CaptureError::illegal(event, mode)
    }

    pub(super) fn set_mode(&mut self, mode: CaptureMode) {
        if self.mode == mode {
            return;
        }
        tracing::debug!(from = %self.mode, to = %mode, "Mode transition");
        self.mode = mode;
        self.events.emit(SessionEvent::ModeChanged { mode });
    }

    fn stage(&mut self, kind: AssetKind, path: PathBuf) -> StagedAsset {
        let uri = self.storage.content_uri(kind, &path);
        let asset = StagedAsset::new(kind, path, uri);
        self.assets.push(asset.clone());
        tracing::debug!(asset = %asset.id, ?kind, "Asset staged");
        self.events.emit(SessionEvent::AssetAdded {
            asset: asset.clone(),
        });
        asset
    }

    /// Mode after a recording ended without producing content
    fn revert_after_recording(&mut self) {
        if self.timeline.is_empty() {
            self.set_mode(CaptureMode::Preview);
        } else {
            self.set_mode(CaptureMode::SectionRecording);
        }
    }

    pub(super) fn discard_merged(&mut self) {
        if let Some(merged) = self.merged.take() {
            tracing::debug!(path = %merged.asset.scratch_path.display(), "Discarding stale merge");
            remove_file_best_effort(&merged.asset.scratch_path);
        }
    }

    pub(super) fn set_controls_enabled(&self, enabled: bool) {
        self.events.emit(SessionEvent::ControlsEnabled { enabled });
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}
