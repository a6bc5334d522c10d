//! Capture Session - capture state machine, section merging and commit.
//!
//! Governs what a camera/recorder surface is doing, keeps captured files in
//! scratch storage until they are confirmed, merges section recordings and
//! migrates accepted captures into permanent storage.

pub mod commit;
pub mod edit;
pub mod session;
pub mod storage;
pub mod utils;

pub use commit::{CommitResult, CommittedFile, Compressor};
pub use edit::{EditCoordinator, FfmpegTool, VideoTool};
pub use session::{CaptureMode, CaptureSession, SessionConfig, SessionEvent};
pub use storage::{DirectoryStorage, MediaIndex, StoragePaths};
pub use utils::error::{CaptureError, CaptureResult, ErrorResponse};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the tracing subscriber.
///
/// Filter comes from `RUST_LOG`, defaulting to `capture_session=debug`.
/// Calling this again is a no-op.
pub fn init_logging() {
    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "capture_session=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::info!("Capture Session v{}", env!("CARGO_PKG_VERSION"));
    }
}
