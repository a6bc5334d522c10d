//! Press gesture timer
//!
//! A press-down arms a cancellable timer. If it fires before the press is
//! released, the press becomes a long press and the session receives
//! [`SessionInput::LongPress`]; otherwise the release resolves to a tap.

use crate::session::machine::SessionInput;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Identifies one press-down
pub type PressId = u64;

/// What a press-up resolved to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressRelease {
    /// Released before the long-press delay
    Tap,
    /// Released after the long press started recording
    LongPressEnded { elapsed_ms: u64, short: bool },
    /// No press was armed
    Ignored,
}

#[derive(Debug)]
struct ArmedPress {
    id: PressId,
    timer: Option<JoinHandle<()>>,
    /// Set once the long press fired
    fired_at: Option<Instant>,
}

#[derive(Debug)]
pub struct PressTimer {
    delay: Duration,
    min_duration_ms: u64,
    next_id: PressId,
    armed: Option<ArmedPress>,
}

impl PressTimer {
    pub fn new(delay: Duration, min_duration_ms: u64) -> Self {
        Self {
            delay,
            min_duration_ms,
            next_id: 0,
            armed: None,
        }
    }

    /// Arm a new press, replacing any armed one.
    ///
    /// With `long_press == false` no timer is scheduled and the press can
    /// only resolve to a tap.
    pub fn press_down(
        &mut self,
        long_press: bool,
        input_tx: &mpsc::UnboundedSender<SessionInput>,
    ) -> PressId {
        self.disarm();
        self.next_id += 1;
        let id = self.next_id;

        let timer = long_press.then(|| {
            let tx = input_tx.clone();
            let delay = self.delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if tx.send(SessionInput::LongPress(id)).is_err() {
                    tracing::debug!("Long press {} fired after session closed", id);
                }
            })
        });

        tracing::debug!(press = id, long_press, "Press armed");
        self.armed = Some(ArmedPress {
            id,
            timer,
            fired_at: None,
        });
        id
    }

    /// Record that the timer for `id` fired.
    ///
    /// Returns `false` for a stale id (released or replaced meanwhile).
    pub fn fire(&mut self, id: PressId) -> bool {
        match self.armed.as_mut() {
            Some(armed) if armed.id == id && armed.fired_at.is_none() => {
                armed.timer = None;
                armed.fired_at = Some(Instant::now());
                true
            }
            _ => {
                tracing::debug!(press = id, "Ignoring stale long press");
                false
            }
        }
    }

    pub fn press_up(&mut self) -> PressRelease {
        let Some(mut armed) = self.armed.take() else {
            return PressRelease::Ignored;
        };
        if let Some(timer) = armed.timer.take() {
            timer.abort();
        }

        match armed.fired_at {
            Some(fired_at) => {
                let elapsed_ms = fired_at.elapsed().as_millis() as u64;
                PressRelease::LongPressEnded {
                    elapsed_ms,
                    short: elapsed_ms < self.min_duration_ms,
                }
            }
            None => PressRelease::Tap,
        }
    }

    /// Drop the armed press without resolving it
    pub fn disarm(&mut self) {
        if let Some(mut armed) = self.armed.take() {
            if let Some(timer) = armed.timer.take() {
                timer.abort();
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}

impl Drop for PressTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
