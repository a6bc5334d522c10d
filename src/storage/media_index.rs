//! Media-index collaborator
//!
//! Committed files are registered with the platform's media index so that
//! galleries pick them up.

use crate::session::assets::AssetKind;
use crate::utils::error::CaptureResult;
use std::path::Path;

/// Registers permanent files with the platform media index
pub trait MediaIndex: Send + Sync {
    fn register(&self, path: &Path, kind: AssetKind) -> CaptureResult<()>;
}

/// Media index that only logs; used when the host has no index to notify
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMediaIndex;

impl MediaIndex for LoggingMediaIndex {
    fn register(&self, path: &Path, kind: AssetKind) -> CaptureResult<()> {
        tracing::info!(path = %path.display(), ?kind, "Registered media file");
        Ok(())
    }
}
