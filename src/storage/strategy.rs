//! Save strategies and scratch/permanent path resolution
//!
//! Captured files land in a scratch directory first. Only on commit are they
//! moved into the directory configured by the save strategy for their kind.

use crate::session::assets::AssetKind;
use crate::utils::error::{CaptureError, CaptureResult};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Where permanent files of one kind go, and how their URIs are formed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStrategy {
    /// Permanent directory
    pub directory: PathBuf,
    /// Content provider authority; `file://` URIs are used when absent
    #[serde(default)]
    pub authority: Option<String>,
}

impl SaveStrategy {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            authority: None,
        }
    }

    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }
}

/// Storage layout of a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Scratch directory for uncommitted captures
    pub scratch_dir: PathBuf,
    /// Fallback strategy for every kind
    pub save_strategy: Option<SaveStrategy>,
    /// Strategy for photos
    pub picture_strategy: Option<SaveStrategy>,
    /// Strategy for videos
    pub video_strategy: Option<SaveStrategy>,
}

impl StorageConfig {
    pub fn strategy_for(&self, kind: AssetKind) -> Option<&SaveStrategy> {
        let specific = match kind {
            AssetKind::Photo => self.picture_strategy.as_ref(),
            AssetKind::VideoSegment => self.video_strategy.as_ref(),
        };
        specific.or(self.save_strategy.as_ref())
    }

    pub fn validate(&self) -> CaptureResult<()> {
        if self.scratch_dir.as_os_str().is_empty() {
            return Err(CaptureError::Config("scratchDir must be set".to_string()));
        }
        for kind in [AssetKind::Photo, AssetKind::VideoSegment] {
            if self.strategy_for(kind).is_none() {
                return Err(CaptureError::Config(format!(
                    "no save strategy for {kind:?}; set saveStrategy"
                )));
            }
        }
        Ok(())
    }
}

/// Storage-path collaborator
pub trait StoragePaths: Send + Sync {
    /// Directory for uncommitted captures
    fn scratch_dir(&self) -> PathBuf;

    /// Permanent directory for a kind of asset
    fn permanent_dir(&self, kind: AssetKind) -> CaptureResult<PathBuf>;

    /// URI under which `path` is exposed to other components
    fn content_uri(&self, kind: AssetKind, path: &Path) -> String;
}

/// File-system backed storage driven by [`StorageConfig`]
#[derive(Debug, Clone)]
pub struct DirectoryStorage {
    config: StorageConfig,
}

impl DirectoryStorage {
    pub fn new(config: StorageConfig) -> CaptureResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

impl StoragePaths for DirectoryStorage {
    fn scratch_dir(&self) -> PathBuf {
        self.config.scratch_dir.clone()
    }

    fn permanent_dir(&self, kind: AssetKind) -> CaptureResult<PathBuf> {
        self.config
            .strategy_for(kind)
            .map(|strategy| strategy.directory.clone())
            .ok_or_else(|| CaptureError::Config(format!("no save strategy for {kind:?}")))
    }

    fn content_uri(&self, kind: AssetKind, path: &Path) -> String {
        let authority = self
            .config
            .strategy_for(kind)
            .and_then(|strategy| strategy.authority.as_deref());

        match authority {
            Some(authority) => {
                let relative = self
                    .config
                    .strategy_for(kind)
                    .and_then(|strategy| path.strip_prefix(&strategy.directory).ok())
                    .or_else(|| path.strip_prefix(&self.config.scratch_dir).ok())
                    .unwrap_or(path);
                format!("content://{}/{}", authority, encode_path(relative))
            }
            None => format!("file:///{}", encode_path(path)),
        }
    }
}

/// Percent-encode each path component and join them with '/'
fn encode_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(urlencoding::encode(&part.to_string_lossy()).into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Timestamped file name for a new capture, e.g. `JPEG_20240101_120000123.jpg`
pub fn capture_file_name(kind: AssetKind) -> String {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S%3f");
    match kind {
        AssetKind::Photo => format!("JPEG_{timestamp}.jpg"),
        AssetKind::VideoSegment => format!("VIDEO_{timestamp}.mp4"),
    }
}

/// Create a fresh, not yet existing path for a capture in `dir`
pub fn create_capture_path(dir: &Path, kind: AssetKind) -> CaptureResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| CaptureError::io(dir, e))?;
    Ok(unique_path(dir, &capture_file_name(kind)))
}

/// `dir/name`, or `dir/<stem>_<n>.<ext>` with the first free `n` when taken
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("capture");
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("bin");
    let mut suffix = 1u32;
    loop {
        let candidate = dir.join(format!("{stem}_{suffix}.{extension}"));
        if !candidate.exists() {
            return candidate;
        }
        suffix += 1;
    }
}
