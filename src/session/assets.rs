//! Staged assets
//!
//! Files produced during the current session that still live in scratch
//! storage. The store is owned by the session and only mutated by it.

use crate::session::limits::MediaKind;
use crate::utils::fs::remove_file_best_effort;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Kind of staged file
///
/// `VideoSegment` covers every video a recording produces: a single take, one
/// section, or the merged result of a section recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    Photo,
    VideoSegment,
}

impl AssetKind {
    pub fn media_kind(&self) -> MediaKind {
        match self {
            AssetKind::Photo => MediaKind::Image,
            AssetKind::VideoSegment => MediaKind::Video,
        }
    }
}

/// A capture result held in scratch storage pending confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedAsset {
    pub id: Uuid,
    pub kind: AssetKind,
    pub scratch_path: PathBuf,
    pub content_uri: String,
    pub created_at: DateTime<Utc>,
}

impl StagedAsset {
    pub fn new(kind: AssetKind, scratch_path: PathBuf, content_uri: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            scratch_path,
            content_uri,
            created_at: Utc::now(),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.scratch_path.file_name().and_then(|name| name.to_str())
    }
}

/// Ordered collection of staged assets
#[derive(Debug, Default)]
pub struct StagedAssetStore {
    assets: Vec<StagedAsset>,
}

impl StagedAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, asset: StagedAsset) {
        self.assets.push(asset);
    }

    pub fn get(&self, id: Uuid) -> Option<&StagedAsset> {
        self.assets.iter().find(|asset| asset.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StagedAsset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn count(&self, kind: AssetKind) -> usize {
        self.assets.iter().filter(|asset| asset.kind == kind).count()
    }

    pub fn photo_count(&self) -> usize {
        self.count(AssetKind::Photo)
    }

    pub fn video_count(&self) -> usize {
        self.count(AssetKind::VideoSegment)
    }

    /// Snapshot of every staged asset, in staging order
    pub fn snapshot(&self) -> Vec<StagedAsset> {
        self.assets.clone()
    }

    /// Remove an asset from the store without touching its file
    pub fn remove(&mut self, id: Uuid) -> Option<StagedAsset> {
        let index = self.assets.iter().position(|asset| asset.id == id)?;
        Some(self.assets.remove(index))
    }

    /// Remove an asset and delete its scratch file
    pub fn discard(&mut self, id: Uuid) -> Option<StagedAsset> {
        let asset = self.remove(id)?;
        remove_file_best_effort(&asset.scratch_path);
        Some(asset)
    }

    /// Remove every asset and delete every scratch file
    pub fn discard_all(&mut self) -> Vec<StagedAsset> {
        let assets = std::mem::take(&mut self.assets);
        for asset in &assets {
            remove_file_best_effort(&asset.scratch_path);
        }
        assets
    }

    /// Point an asset at a new scratch file, keeping its id.
    ///
    /// Returns the previous path so the caller can delete it.
    pub fn replace_file(&mut self, id: Uuid, path: &Path, content_uri: String) -> Option<PathBuf> {
        let asset = self.assets.iter_mut().find(|asset| asset.id == id)?;
        let previous = std::mem::replace(&mut asset.scratch_path, path.to_path_buf());
        asset.content_uri = content_uri;
        Some(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_discard_deletes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("JPEG_1.jpg");
        fs::write(&path, b"jpeg").unwrap();

        let mut store = StagedAssetStore::new();
        let asset = StagedAsset::new(AssetKind::Photo, path.clone(), "file:///JPEG_1.jpg".into());
        let id = asset.id;
        store.push(asset);
        assert_eq!(store.photo_count(), 1);

        let removed = store.discard(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(!path.exists());
        assert!(store.is_empty());
    }

    #[test]
    fn test_replace_file_keeps_id() {
        let mut store = StagedAssetStore::new();
        let asset = StagedAsset::new(AssetKind::Photo, PathBuf::from("/s/a.jpg"), "uri-a".into());
        let id = asset.id;
        store.push(asset);

        let old = store.replace_file(id, Path::new("/s/b.jpg"), "uri-b".into()).unwrap();
        assert_eq!(old, PathBuf::from("/s/a.jpg"));
        let current = store.get(id).unwrap();
        assert_eq!(current.scratch_path, PathBuf::from("/s/b.jpg"));
        assert_eq!(current.content_uri, "uri-b");
    }
}
