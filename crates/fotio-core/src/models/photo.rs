//! Photo storage records.
//!
//! A `PhotoStorageRecord` is the per-photo slice of the persistence layer
//! this subsystem reads: which provider holds the asset, under what
//! canonical key, and which thumbnail variants exist. The record is owned
//! by the photo's lifecycle - created at upload time, updated when
//! thumbnails are (re)generated, deleted with the photo.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provider::ProviderKind;

/// Storage location of one photo and its derived variants.
///
/// The canonical key is always present for a well-formed record; thumbnail
/// entries are best-effort and may be absent even when the provider
/// nominally supports them (Drive in particular).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoStorageRecord {
    pub photo_id: Uuid,
    pub provider: ProviderKind,
    /// Canonical key / file id / path of the full-size asset.
    pub key: String,
    /// Canonical URL; may be empty or relative.
    #[serde(default)]
    pub url: String,
    /// Thumbnail-size-name -> provider key. BTreeMap keeps variant
    /// selection deterministic when no preferred size is present.
    #[serde(default)]
    pub thumbnails: BTreeMap<String, String>,
    /// Bucket for S3-compatible providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Folder id for Google Drive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PhotoStorageRecord {
    pub fn new(photo_id: Uuid, provider: ProviderKind, key: impl Into<String>) -> Self {
        let now = Utc::now();
        PhotoStorageRecord {
            photo_id,
            provider,
            key: key.into(),
            url: String::new(),
            thumbnails: BTreeMap::new(),
            bucket: None,
            folder_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a (re)generated thumbnail variant under its size name.
    pub fn set_thumbnail(&mut self, size: impl Into<String>, key: impl Into<String>) {
        self.thumbnails.insert(size.into(), key.into());
        self.updated_at = Utc::now();
    }

    pub fn thumbnail(&self, size: &str) -> Option<&str> {
        self.thumbnails.get(size).map(String::as_str)
    }

    pub fn has_thumbnails(&self) -> bool {
        !self.thumbnails.is_empty()
    }

    /// Whether the record carries a usable full-size key.
    pub fn has_full_key(&self) -> bool {
        !self.key.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_round_trips_through_json() {
        let mut record =
            PhotoStorageRecord::new(Uuid::new_v4(), ProviderKind::S3, "albums/a1/p1.jpg");
        record.bucket = Some("photos".to_string());
        record.set_thumbnail("medium", "albums/a1/medium/p1.jpg");

        let json = serde_json::to_string(&record).unwrap();
        let back: PhotoStorageRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.thumbnail("medium"), Some("albums/a1/medium/p1.jpg"));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = format!(
            r#"{{"photo_id":"{}","provider":"local","key":"p.jpg","created_at":"2026-01-01T00:00:00Z","updated_at":"2026-01-01T00:00:00Z"}}"#,
            Uuid::new_v4()
        );
        let record: PhotoStorageRecord = serde_json::from_str(&json).unwrap();
        assert!(record.url.is_empty());
        assert!(!record.has_thumbnails());
        assert!(record.has_full_key());
    }
}
