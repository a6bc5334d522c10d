//! Video tool seam
//!
//! The coordinator drives merge and compress work through [`VideoTool`] so
//! the real ffmpeg backend can be swapped for a fake in tests.

use crate::edit::types::{JobControl, ToolError};
use crate::utils::error::{CaptureError, CaptureResult};
use std::fs;
use std::path::{Path, PathBuf};

pub trait VideoTool: Send + Sync {
    /// Concatenate the files listed in `manifest` into `output`.
    ///
    /// `segments` is the same list the manifest was written from, in order.
    fn concat(
        &self,
        manifest: &Path,
        segments: &[PathBuf],
        output: &Path,
        control: &mut JobControl,
    ) -> Result<(), ToolError>;

    /// Re-encode `input` into `output`
    fn compress(
        &self,
        input: &Path,
        output: &Path,
        control: &mut JobControl,
    ) -> Result<(), ToolError>;
}

fn format_manifest_entry(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    let escaped = normalized.replace('\'', "'\\''");
    format!("file '{escaped}'\n")
}

/// Render the concat manifest, one `file '<path>'` line per segment
pub fn render_manifest(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|segment| format_manifest_entry(segment))
        .collect()
}

/// Write the concat manifest, creating its parent directory
pub fn write_manifest(manifest: &Path, segments: &[PathBuf]) -> CaptureResult<()> {
    if let Some(parent) = manifest.parent() {
        fs::create_dir_all(parent).map_err(|e| CaptureError::io(parent, e))?;
    }
    fs::write(manifest, render_manifest(segments)).map_err(|e| CaptureError::io(manifest, e))
}

/// Read back the segment list from a manifest
pub fn read_manifest(manifest: &Path) -> CaptureResult<Vec<PathBuf>> {
    let contents = fs::read_to_string(manifest).map_err(|e| CaptureError::io(manifest, e))?;
    Ok(contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("file '"))
        .filter_map(|rest| rest.strip_suffix('\''))
        .map(|quoted| PathBuf::from(quoted.replace("'\\''", "'")))
        .collect())
}
