//! File helpers shared by the session, the edit coordinator and the commit pipeline

use crate::utils::error::{CaptureError, CaptureResult};
use std::fs;
use std::path::Path;

/// Delete a file, logging instead of failing.
///
/// Returns `true` when the file is gone afterwards (including when it never
/// existed). Cleanup paths use this so that teardown never blocks on IO errors.
pub fn remove_file_best_effort(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed scratch file");
            true
        }
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => true,
        Err(error) => {
            tracing::warn!(path = %path.display(), "Failed to remove file: {error}");
            false
        }
    }
}

/// Check that a file exists and has content
pub fn is_non_empty_file(path: &Path) -> bool {
    path.metadata().is_ok_and(|metadata| metadata.is_file() && metadata.len() > 0)
}

/// Move `source` to `destination`, replacing anything already there.
///
/// Tries a rename first and falls back to copy + remove when the two paths live
/// on different filesystems.
pub fn move_file(source: &Path, destination: &Path) -> CaptureResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| CaptureError::io(parent, e))?;
    }

    if destination.exists() {
        fs::remove_file(destination).map_err(|e| CaptureError::io(destination, e))?;
    }

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(rename_error) => {
            tracing::debug!(
                source = %source.display(),
                destination = %destination.display(),
                "Rename failed ({rename_error}), falling back to copy"
            );
            if let Err(copy_error) = fs::copy(source, destination) {
                remove_file_best_effort(destination);
                return Err(CaptureError::io(destination, copy_error));
            }
            fs::remove_file(source).map_err(|e| CaptureError::io(source, e))?;
            Ok(())
        }
    }
}
