//! Maximum recording duration
//!
//! Each recording arms one timer. When it fires the session receives
//! [`SessionInput::MaxDurationReached`] and asks the camera to stop.

use crate::session::machine::SessionInput;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Identifies one recording
pub type RecordingId = u64;

#[derive(Debug)]
struct ArmedDeadline {
    id: RecordingId,
    timer: JoinHandle<()>,
}

#[derive(Debug)]
pub struct RecordingDeadline {
    /// `None` means recordings are not capped
    limit: Option<Duration>,
    next_id: RecordingId,
    armed: Option<ArmedDeadline>,
}

impl RecordingDeadline {
    /// A `max_duration_ms` of 0 disables the cap
    pub fn new(max_duration_ms: u64) -> Self {
        Self {
            limit: (max_duration_ms > 0).then(|| Duration::from_millis(max_duration_ms)),
            next_id: 0,
            armed: None,
        }
    }

    pub fn limit_ms(&self) -> Option<u64> {
        self.limit.map(|limit| limit.as_millis() as u64)
    }

    /// Arm the timer for a new recording, replacing any armed one.
    ///
    /// Returns `None` when there is no cap or no runtime to run the timer on.
    pub fn arm(&mut self, input_tx: &mpsc::UnboundedSender<SessionInput>) -> Option<RecordingId> {
        self.disarm();
        let limit = self.limit?;
        let Ok(runtime) = Handle::try_current() else {
            tracing::debug!("No runtime, recording runs without a time limit");
            return None;
        };

        self.next_id += 1;
        let id = self.next_id;
        let tx = input_tx.clone();
        let timer = runtime.spawn(async move {
            tokio::time::sleep(limit).await;
            if tx.send(SessionInput::MaxDurationReached(id)).is_err() {
                tracing::debug!("Deadline {} fired after session closed", id);
            }
        });

        tracing::debug!(recording = id, limit_ms = limit.as_millis() as u64, "Deadline armed");
        self.armed = Some(ArmedDeadline { id, timer });
        Some(id)
    }

    /// Consume the deadline for `id`; `false` when it is stale
    pub fn fire(&mut self, id: RecordingId) -> bool {
        if self.armed.as_ref().is_some_and(|armed| armed.id == id) {
            self.armed = None;
            return true;
        }
        tracing::debug!(recording = id, "Ignoring stale deadline");
        false
    }

    pub fn disarm(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.timer.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}

impl Drop for RecordingDeadline {
    fn drop(&mut self) {
        self.disarm();
    }
}
