//! Capture session
//!
//! - `machine`: the capture state machine
//! - `mode`, `limits`, `config`: state, limits and configuration
//! - `assets`, `timeline`: staged photos/videos and section segments
//! - `events`: the event channel to the UI collaborator
//! - `press`, `deadline`: long-press and maximum-duration timers
//! - `jobs`: merge and commit orchestration, teardown

pub mod assets;
pub mod config;
pub mod deadline;
pub mod events;
mod jobs;
pub mod limits;
pub mod machine;
pub mod mode;
pub mod press;
pub mod timeline;

pub use assets::{AssetKind, StagedAsset, StagedAssetStore};
pub use config::SessionConfig;
pub use deadline::{RecordingDeadline, RecordingId};
pub use events::{EventSink, SessionEvent};
pub use limits::{GestureMode, Limit, MediaKind, SelectionLimits};
pub use machine::{CaptureSession, EditOutcome, EditRequest, SessionInput, StopOutcome};
pub use mode::CaptureMode;
pub use press::{PressId, PressRelease, PressTimer};
pub use timeline::{SectionSegment, SectionTimeline};
