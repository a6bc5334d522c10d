//! Section timeline
//!
//! Ordered segments of a section recording. Only non-empty while the session
//! is in `SectionRecording` or `SectionComplete`.

use crate::utils::fs::remove_file_best_effort;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One recorded section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSegment {
    /// Segment index (0, 1, 2, ...)
    pub index: usize,

    /// Scratch file holding the segment
    pub path: PathBuf,

    /// Duration of this segment in milliseconds
    pub duration_ms: u64,

    /// When the segment was appended
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SectionTimeline {
    segments: Vec<SectionSegment>,
    /// Bumped on every change; a merge made at an older revision is stale
    revision: u64,
}

impl SectionTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: PathBuf, duration_ms: u64) -> &SectionSegment {
        let index = self.segments.len();
        self.segments.push(SectionSegment {
            index,
            path,
            duration_ms,
            recorded_at: Utc::now(),
        });
        self.revision += 1;
        &self.segments[index]
    }

    /// Remove the last segment and delete its file
    pub fn discard_last(&mut self) -> Option<SectionSegment> {
        let segment = self.segments.pop()?;
        remove_file_best_effort(&segment.path);
        self.revision += 1;
        Some(segment)
    }

    /// Remove every segment and delete every file
    pub fn discard_all(&mut self) -> usize {
        let count = self.segments.len();
        for segment in self.segments.drain(..) {
            remove_file_best_effort(&segment.path);
        }
        if count > 0 {
            self.revision += 1;
        }
        count
    }

    pub fn segments(&self) -> &[SectionSegment] {
        &self.segments
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.segments.iter().map(|s| s.path.clone()).collect()
    }

    pub fn durations(&self) -> Vec<u64> {
        self.segments.iter().map(|s| s.duration_ms).collect()
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.segments.iter().map(|s| s.duration_ms).sum()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_discard_last_deletes_segment_file() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("VIDEO_0.mp4");
        let second = dir.path().join("VIDEO_1.mp4");
        fs::write(&first, b"a").unwrap();
        fs::write(&second, b"b").unwrap();

        let mut timeline = SectionTimeline::new();
        timeline.push(first.clone(), 1200);
        timeline.push(second.clone(), 800);
        let revision = timeline.revision();

        let removed = timeline.discard_last().unwrap();
        assert_eq!(removed.duration_ms, 800);
        assert!(!second.exists());
        assert!(first.exists());
        assert_eq!(timeline.durations(), vec![1200]);
        assert!(timeline.revision() > revision);
    }

    #[test]
    fn test_discard_all() {
        let dir = tempdir().unwrap();
        let mut timeline = SectionTimeline::new();
        for i in 0..3 {
            let path = dir.path().join(format!("VIDEO_{i}.mp4"));
            fs::write(&path, b"x").unwrap();
            timeline.push(path, 1000);
        }
        assert_eq!(timeline.total_duration_ms(), 3000);
        assert_eq!(timeline.discard_all(), 3);
        assert!(timeline.is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
