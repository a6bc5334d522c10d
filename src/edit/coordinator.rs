//! Merge/compress coordinator
//!
//! Runs at most one edit job at a time on the blocking pool. Progress, the
//! terminal event and partial-output cleanup are handled here so that tools
//! only have to do the work and watch the cancel flag.

use crate::edit::tool::{write_manifest, VideoTool};
use crate::edit::types::{
    in_flight_percent, JobControl, JobKind, JobOutcome, JobStatus, MergeJob, ToolError,
};
use crate::session::events::{EventSink, SessionEvent};
use crate::utils::error::{CaptureError, CaptureResult};
use crate::utils::fs::{is_non_empty_file, remove_file_best_effort};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// Handle to a started job
#[derive(Debug)]
pub struct JobTicket {
    /// Snapshot taken when the job started
    pub job: MergeJob,
    completion: oneshot::Receiver<JobOutcome>,
}

impl JobTicket {
    /// Wait for the job from async code
    pub async fn finished(self) -> JobOutcome {
        self.completion
            .await
            .unwrap_or_else(|_| JobOutcome::Failed("edit job was dropped".to_string()))
    }

    /// Wait for the job from a blocking worker thread
    pub fn wait_blocking(self) -> JobOutcome {
        self.completion
            .blocking_recv()
            .unwrap_or_else(|_| JobOutcome::Failed("edit job was dropped".to_string()))
    }
}

/// Shared between the coordinator and its workers
struct JobSlot {
    job: Mutex<MergeJob>,
    /// Cancel flag for the current job
    cancel_flag: Arc<AtomicBool>,
    events: EventSink,
}

impl JobSlot {
    fn progress(&self, job_id: uuid::Uuid, kind: JobKind, percent: u8) {
        {
            let mut job = self.job.lock();
            if job.id != job_id || !job.is_running() || percent <= job.progress {
                return;
            }
            job.progress = percent;
        }
        let event = match kind {
            JobKind::Merge => SessionEvent::MergeProgress { percent },
            JobKind::Compress => SessionEvent::CompressProgress { percent },
        };
        self.events.emit(event);
    }

    /// Settle the job: clean up partial output, record status, emit the
    /// terminal event. Returns the outcome handed to the ticket.
    fn finish(
        &self,
        started: &MergeJob,
        result: Result<(), ToolError>,
        manifest: Option<&Path>,
        linked: Option<&AtomicBool>,
    ) -> JobOutcome {
        let output = started.output_path.clone().unwrap_or_default();
        let cancelled = self.cancel_flag.load(Ordering::Relaxed)
            || linked.is_some_and(|flag| flag.load(Ordering::Relaxed));

        let outcome = match result {
            _ if cancelled => JobOutcome::Cancelled,
            Err(ToolError::Cancelled) => JobOutcome::Cancelled,
            Err(e) => JobOutcome::Failed(e.to_string()),
            Ok(()) if !is_non_empty_file(&output) => {
                JobOutcome::Failed(format!("no output produced at {}", output.display()))
            }
            Ok(()) => JobOutcome::Finished(output.clone()),
        };

        if !matches!(outcome, JobOutcome::Finished(_)) {
            remove_file_best_effort(&output);
        }
        if let Some(manifest) = manifest {
            remove_file_best_effort(manifest);
        }

        {
            let mut job = self.job.lock();
            if job.id == started.id {
                job.status = match &outcome {
                    JobOutcome::Finished(_) => JobStatus::Done,
                    JobOutcome::Cancelled => JobStatus::Cancelled,
                    JobOutcome::Failed(_) => JobStatus::Failed,
                };
                if job.status == JobStatus::Done {
                    job.progress = 100;
                }
            }
        }

        match &outcome {
            JobOutcome::Finished(path) => {
                tracing::info!(job = %started.id, "Edit job finished: {}", path.display());
            }
            JobOutcome::Cancelled => tracing::info!(job = %started.id, "Edit job cancelled"),
            JobOutcome::Failed(message) => {
                tracing::error!(job = %started.id, "Edit job failed: {}", message)
            }
        }

        if started.kind == JobKind::Merge {
            self.events.emit(match &outcome {
                JobOutcome::Finished(path) => SessionEvent::MergeFinished {
                    output_path: path.clone(),
                },
                JobOutcome::Cancelled => SessionEvent::MergeCancelled,
                JobOutcome::Failed(message) => SessionEvent::MergeError {
                    message: message.clone(),
                },
            });
        }

        outcome
    }
}

pub struct EditCoordinator {
    tool: Arc<dyn VideoTool>,
    slot: Arc<JobSlot>,
    disposed: AtomicBool,
}

impl EditCoordinator {
    pub fn new(tool: Arc<dyn VideoTool>, events: EventSink) -> Self {
        Self {
            tool,
            slot: Arc::new(JobSlot {
                job: Mutex::new(MergeJob::idle()),
                cancel_flag: Arc::new(AtomicBool::new(false)),
                events,
            }),
            disposed: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current (or last) job
    pub fn job(&self) -> MergeJob {
        self.slot.job.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.slot.job.lock().is_running()
    }

    /// Concatenate `segments` into `output_path`, writing the manifest first.
    ///
    /// Fails with [`CaptureError::AlreadyRunning`] while another job is live;
    /// the running job is left untouched.
    pub fn merge(
        &self,
        output_path: &Path,
        segments: &[PathBuf],
        manifest_path: &Path,
    ) -> CaptureResult<JobTicket> {
        if segments.is_empty() {
            return Err(CaptureError::MergeFailure("no segments to merge".to_string()));
        }
        let runtime = current_runtime()?;
        let job = self.begin(JobKind::Merge, output_path)?;

        if let Err(e) = write_manifest(manifest_path, segments) {
            self.slot.finish(
                &job,
                Err(ToolError::Failed(e.to_string())),
                Some(manifest_path),
                None,
            );
            return Err(e);
        }

        let tool = self.tool.clone();
        let segments = segments.to_vec();
        let manifest = manifest_path.to_path_buf();
        let output = output_path.to_path_buf();
        Ok(self.spawn(runtime, job, Some(manifest.clone()), None, move |control| {
            tool.concat(&manifest, &segments, &output, control)
        }))
    }

    /// Re-encode `input` into `output_path`
    pub fn compress(&self, input: &Path, output_path: &Path) -> CaptureResult<JobTicket> {
        self.compress_linked(input, output_path, None)
    }

    /// Like [`compress`](Self::compress), but the job also stops once the
    /// caller's `linked` cancel flag is set
    pub fn compress_linked(
        &self,
        input: &Path,
        output_path: &Path,
        linked: Option<Arc<AtomicBool>>,
    ) -> CaptureResult<JobTicket> {
        let runtime = current_runtime()?;
        let job = self.begin(JobKind::Compress, output_path)?;

        let tool = self.tool.clone();
        let input = input.to_path_buf();
        let output = output_path.to_path_buf();
        Ok(self.spawn(runtime, job, None, linked, move |control| {
            tool.compress(&input, &output, control)
        }))
    }

    /// Request cancellation of the running job; no-op when idle
    pub fn cancel(&self) {
        if self.is_running() {
            tracing::info!("Cancelling edit job");
            self.slot.cancel_flag.store(true, Ordering::Relaxed);
        }
    }

    /// Cancel any running job and refuse new ones. Safe to call again.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            tracing::debug!("Edit coordinator already disposed");
            return;
        }
        tracing::info!("Disposing edit coordinator");
        self.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn begin(&self, kind: JobKind, output_path: &Path) -> CaptureResult<MergeJob> {
        if self.is_disposed() {
            return Err(CaptureError::Cancelled);
        }

        let mut current = self.slot.job.lock();
        if current.is_running() {
            return Err(CaptureError::AlreadyRunning);
        }

        self.slot.cancel_flag.store(false, Ordering::Relaxed);
        *current = MergeJob::running(kind, output_path.to_path_buf());
        tracing::info!(job = %current.id, ?kind, output = %output_path.display(), "Starting edit job");
        Ok(current.clone())
    }

    fn spawn<F>(
        &self,
        runtime: Handle,
        job: MergeJob,
        manifest: Option<PathBuf>,
        linked: Option<Arc<AtomicBool>>,
        work: F,
    ) -> JobTicket
    where
        F: FnOnce(&mut JobControl) -> Result<(), ToolError> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let slot = self.slot.clone();
        let started = job.clone();

        runtime.spawn(async move {
            let worker_slot = slot.clone();
            let job_id = started.id;
            let kind = started.kind;
            let worker_linked = linked.clone();
            let result = tokio::task::spawn_blocking(move || {
                let progress_slot = worker_slot.clone();
                let mut control = JobControl::new(
                    worker_slot.cancel_flag.clone(),
                    Box::new(move |fraction| {
                        progress_slot.progress(job_id, kind, in_flight_percent(fraction))
                    }),
                )
                .with_linked(worker_linked);
                work(&mut control)
            })
            .await;

            let result = match result {
                Ok(result) => result,
                Err(e) => Err(ToolError::Failed(format!("Edit task panicked: {}", e))),
            };

            let outcome = slot.finish(&started, result, manifest.as_deref(), linked.as_deref());
            let _ = done_tx.send(outcome);
        });

        JobTicket {
            job,
            completion: done_rx,
        }
    }
}

impl Drop for EditCoordinator {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn current_runtime() -> CaptureResult<Handle> {
    Handle::try_current()
        .map_err(|_| CaptureError::Config("edit jobs need a running tokio runtime".to_string()))
}
