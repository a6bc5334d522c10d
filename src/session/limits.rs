//! Selection limits
//!
//! How many photos, videos and audio clips a session may stage. A per-type
//! maximum that is unset falls back to the combined maximum; when neither is
//! set the type is unlimited. When both are set the per-type maximum bounds
//! that type and the combined maximum bounds the sum.

use crate::utils::error::{CaptureError, CaptureResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Media families counted against the limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        };
        f.write_str(name)
    }
}

/// A resolved maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Unlimited,
    AtMost(u32),
}

impl Limit {
    fn from_option(value: Option<u32>) -> Self {
        value.map(Limit::AtMost).unwrap_or(Limit::Unlimited)
    }

    /// Whether one more item may be added on top of `current`
    pub fn allows(&self, current: usize) -> bool {
        match self {
            Limit::Unlimited => true,
            Limit::AtMost(max) => current < *max as usize,
        }
    }

    /// A limit of zero disables that media type entirely
    pub fn is_disabled(&self) -> bool {
        matches!(self, Limit::AtMost(0))
    }

    pub fn is_exactly(&self, n: u32) -> bool {
        matches!(self, Limit::AtMost(max) if *max == n)
    }

    pub fn value(&self) -> Option<u32> {
        match self {
            Limit::Unlimited => None,
            Limit::AtMost(max) => Some(*max),
        }
    }
}

/// Which press gestures the capture button accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureMode {
    /// Tap takes a photo, long press records
    Both,
    /// Photos only
    ClickOnly,
    /// Recording only
    LongPressOnly,
}

/// Configured maxima
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectionLimits {
    pub max_selectable: Option<u32>,
    pub max_image_selectable: Option<u32>,
    pub max_video_selectable: Option<u32>,
    pub max_audio_selectable: Option<u32>,
}

impl SelectionLimits {
    /// Limits with only a combined maximum
    pub fn combined(max: u32) -> Self {
        Self {
            max_selectable: Some(max),
            ..Self::default()
        }
    }

    pub fn with_images(mut self, max: u32) -> Self {
        self.max_image_selectable = Some(max);
        self
    }

    pub fn with_videos(mut self, max: u32) -> Self {
        self.max_video_selectable = Some(max);
        self
    }

    pub fn with_audio(mut self, max: u32) -> Self {
        self.max_audio_selectable = Some(max);
        self
    }

    pub fn image_limit(&self) -> Limit {
        Limit::from_option(self.max_image_selectable.or(self.max_selectable))
    }

    pub fn video_limit(&self) -> Limit {
        Limit::from_option(self.max_video_selectable.or(self.max_selectable))
    }

    pub fn audio_limit(&self) -> Limit {
        Limit::from_option(self.max_audio_selectable.or(self.max_selectable))
    }

    pub fn limit_for(&self, kind: MediaKind) -> Limit {
        match kind {
            MediaKind::Image => self.image_limit(),
            MediaKind::Video => self.video_limit(),
            MediaKind::Audio => self.audio_limit(),
        }
    }

    /// Validate that one more item of `kind` may be staged.
    ///
    /// `kind_count` is the number already staged of that kind, `total_count`
    /// the number staged across all kinds.
    pub fn check(&self, kind: MediaKind, kind_count: usize, total_count: usize) -> CaptureResult<()> {
        let limit = self.limit_for(kind);
        if !limit.allows(kind_count) {
            return Err(CaptureError::LimitReached {
                kind,
                limit: limit.value().unwrap_or_default(),
            });
        }

        if let Some(max) = self.max_selectable {
            if total_count >= max as usize {
                return Err(CaptureError::LimitReached { kind, limit: max });
            }
        }

        Ok(())
    }

    /// Whether photos or videos can be captured at all
    pub fn camera_enabled(&self) -> bool {
        !self.image_limit().is_disabled() || !self.video_limit().is_disabled()
    }

    /// Whether audio can be recorded at all
    pub fn recorder_enabled(&self) -> bool {
        !self.audio_limit().is_disabled()
    }

    /// Whether exactly one image/video can be selected
    pub fn single_image_video(&self) -> bool {
        match (self.max_image_selectable, self.max_video_selectable) {
            (Some(images), Some(videos)) => images == 1 && videos == 1,
            (Some(images), None) => images == 1,
            (None, Some(videos)) => videos == 1,
            (None, None) => self.max_selectable == Some(1),
        }
    }

    /// Maximum number of photos + videos together
    pub fn image_video_max(&self) -> Limit {
        match (self.max_image_selectable, self.max_video_selectable) {
            (Some(images), Some(videos)) => Limit::AtMost(images.saturating_add(videos)),
            (Some(images), None) => Limit::AtMost(images),
            (None, Some(videos)) => Limit::AtMost(videos),
            (None, None) => Limit::from_option(self.max_selectable),
        }
    }

    /// Gestures the capture button should accept before anything is staged
    pub fn gesture_mode(&self) -> GestureMode {
        if self.image_limit().is_disabled() {
            GestureMode::LongPressOnly
        } else if self.video_limit().is_disabled() {
            GestureMode::ClickOnly
        } else {
            GestureMode::Both
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_type_falls_back_to_combined() {
        let limits = SelectionLimits::combined(5).with_images(2);
        assert_eq!(limits.image_limit(), Limit::AtMost(2));
        assert_eq!(limits.video_limit(), Limit::AtMost(5));
        assert_eq!(limits.audio_limit(), Limit::AtMost(5));
    }

    #[test]
    fn test_unset_is_unlimited() {
        let limits = SelectionLimits::default();
        assert_eq!(limits.image_limit(), Limit::Unlimited);
        assert!(limits.check(MediaKind::Image, 10_000, 10_000).is_ok());
        assert!(limits.camera_enabled());
    }

    #[test]
    fn test_combined_bounds_the_sum() {
        let limits = SelectionLimits::combined(3).with_images(3).with_videos(3);
        assert!(limits.check(MediaKind::Image, 2, 2).is_ok());
        let err = limits.check(MediaKind::Image, 2, 3).unwrap_err();
        assert!(matches!(err, CaptureError::LimitReached { limit: 3, .. }));
    }

    #[test]
    fn test_check_reports_type_limit() {
        let limits = SelectionLimits::default().with_images(1);
        let err = limits.check(MediaKind::Image, 1, 1).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::LimitReached {
                kind: MediaKind::Image,
                limit: 1
            }
        ));
    }

    #[test]
    fn test_gesture_mode() {
        assert_eq!(SelectionLimits::default().gesture_mode(), GestureMode::Both);
        assert_eq!(
            SelectionLimits::default().with_images(0).gesture_mode(),
            GestureMode::LongPressOnly
        );
        assert_eq!(
            SelectionLimits::default().with_videos(0).gesture_mode(),
            GestureMode::ClickOnly
        );
    }

    #[test]
    fn test_single_and_combined_helpers() {
        assert!(SelectionLimits::combined(1).single_image_video());
        assert!(!SelectionLimits::default().with_images(1).with_videos(2).single_image_video());
        assert_eq!(
            SelectionLimits::default().with_images(3).with_videos(2).image_video_max(),
            Limit::AtMost(5)
        );
        assert!(!SelectionLimits::default().with_audio(0).recorder_enabled());
    }
}
