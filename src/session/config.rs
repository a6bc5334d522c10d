//! Session configuration
//!
//! Everything a [`CaptureSession`](crate::session::CaptureSession) needs to
//! know up front. Loaded from JSON with camelCase keys; every field has a
//! default.

use crate::session::limits::SelectionLimits;
use crate::storage::StorageConfig;
use crate::utils::error::{CaptureError, CaptureResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_min_duration_ms() -> u64 {
    1500
}

fn default_max_duration_ms() -> u64 {
    10_000
}

fn default_long_press_delay_ms() -> u64 {
    500
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default)]
    pub limits: SelectionLimits,
    /// Recordings shorter than this are rolled back
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: u64,
    /// Recordings are stopped at this length; 0 disables the cap
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u64,
    /// How long a press must be held before it starts recording
    #[serde(default = "default_long_press_delay_ms")]
    pub long_press_delay_ms: u64,
    /// Initial state of the section-recording toggle
    #[serde(default)]
    pub section_recording: bool,
    #[serde(default)]
    pub image_edit_enabled: bool,
    /// Re-encode videos through the edit coordinator during commit
    #[serde(default)]
    pub compress_videos: bool,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            limits: SelectionLimits::default(),
            min_duration_ms: default_min_duration_ms(),
            max_duration_ms: default_max_duration_ms(),
            long_press_delay_ms: default_long_press_delay_ms(),
            section_recording: false,
            image_edit_enabled: false,
            compress_videos: false,
            storage: StorageConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> CaptureResult<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> CaptureResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| CaptureError::io(path, e))?;
        let config = Self::from_json_str(&content)?;
        tracing::debug!("Loaded session config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> CaptureResult<()> {
        self.validate_durations()?;
        self.storage.validate()
    }

    /// Checks everything except `storage`, for sessions given their own
    /// [`StoragePaths`](crate::storage::StoragePaths)
    pub fn validate_durations(&self) -> CaptureResult<()> {
        if self.max_duration_ms != 0 && self.max_duration_ms < self.min_duration_ms {
            return Err(CaptureError::Config(format!(
                "maxDurationMs ({}) is below minDurationMs ({})",
                self.max_duration_ms, self.min_duration_ms
            )));
        }
        Ok(())
    }

    /// Whether a recording of `elapsed_ms` is below the minimum duration
    pub fn is_short(&self, elapsed_ms: u64) -> bool {
        elapsed_ms < self.min_duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::limits::Limit;
    use crate::storage::SaveStrategy;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config = SessionConfig::from_json_str(
            r#"{ "storage": { "scratchDir": "/tmp/s", "saveStrategy": { "directory": "/tmp/p" } } }"#,
        )
        .unwrap();

        assert_eq!(config.min_duration_ms, 1500);
        assert_eq!(config.max_duration_ms, 10_000);
        assert_eq!(config.long_press_delay_ms, 500);
        assert!(!config.section_recording);
        assert_eq!(config.limits.image_limit(), Limit::Unlimited);
        assert_eq!(
            config.storage.save_strategy,
            Some(SaveStrategy::new("/tmp/p"))
        );
    }

    #[test]
    fn test_camel_case_keys() {
        let config = SessionConfig::from_json_str(
            r#"{
                "limits": { "maxImageSelectable": 3, "maxSelectable": 5 },
                "minDurationMs": 2000,
                "sectionRecording": true,
                "compressVideos": true,
                "storage": {
                    "scratchDir": "/tmp/s",
                    "pictureStrategy": { "directory": "/tmp/pics", "authority": "app.files" },
                    "videoStrategy": { "directory": "/tmp/vids" }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.limits.image_limit(), Limit::AtMost(3));
        assert_eq!(config.limits.video_limit(), Limit::AtMost(5));
        assert_eq!(config.min_duration_ms, 2000);
        assert!(config.section_recording);
        assert!(config.compress_videos);
        assert!(config.is_short(1999));
        assert!(!config.is_short(2000));
    }

    #[test]
    fn test_missing_strategy_rejected() {
        let result = SessionConfig::from_json_str(r#"{ "storage": { "scratchDir": "/tmp/s" } }"#);
        assert!(matches!(result, Err(CaptureError::Config(_))));
    }

    #[test]
    fn test_duration_bounds() {
        let mut config = SessionConfig::default();
        config.max_duration_ms = 1000;
        assert!(matches!(config.validate_durations(), Err(CaptureError::Config(_))));

        config.max_duration_ms = 0;
        assert!(config.validate_durations().is_ok());
        // default storage has no scratch dir
        assert!(matches!(config.validate(), Err(CaptureError::Config(_))));
    }

    #[test]
    fn test_bad_json_is_serialization_error() {
        let result = SessionConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(CaptureError::Serialization(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut config = SessionConfig::default();
        config.storage.scratch_dir = PathBuf::from("/tmp/scratch");
        config.storage.save_strategy = Some(SaveStrategy::new("/tmp/out"));
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(SessionConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = SessionConfig::from_json_file(Path::new("/nonexistent/session.json"));
        assert!(matches!(result, Err(CaptureError::Io { .. })));
    }
}
