//! Asset resolution.
//!
//! Turns a photo's storage record plus a caller preference into the one
//! physical key that should be served. The precedence deliberately prefers
//! a reliable full image over a path-derived thumbnail: on some providers
//! (Drive in particular) generated thumbnails can silently 404 while the
//! full asset is fine, and a little extra bandwidth beats a broken image.

use fotio_core::{PhotoStorageRecord, ProviderKind};

use crate::keys::{self, PLACEHOLDER_KEY};

/// Thumbnail sizes in selection order; any remaining map entry is the
/// deterministic fallback.
pub const PREFERRED_THUMBNAIL_SIZES: [&str; 2] = ["medium", "small"];

/// What the caller wants served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetPreference {
    Thumbnail,
    Original,
}

/// One servable key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub provider: ProviderKind,
    pub key: String,
    pub is_thumbnail: bool,
    pub is_placeholder: bool,
}

impl ResolvedAsset {
    fn asset(provider: ProviderKind, key: &str, is_thumbnail: bool) -> Self {
        ResolvedAsset {
            provider,
            key: key.to_string(),
            is_thumbnail,
            is_placeholder: false,
        }
    }

    /// Placeholders are platform assets; they always live on local storage
    /// regardless of where the photo itself does.
    fn placeholder() -> Self {
        ResolvedAsset {
            provider: ProviderKind::Local,
            key: PLACEHOLDER_KEY.to_string(),
            is_thumbnail: false,
            is_placeholder: true,
        }
    }
}

/// Pick one servable key for a photo record.
pub fn resolve(record: &PhotoStorageRecord, preference: AssetPreference) -> ResolvedAsset {
    match preference {
        AssetPreference::Thumbnail => resolve_thumbnail_first(record),
        AssetPreference::Original => resolve_original_first(record),
    }
}

/// Best thumbnail entry: preferred sizes first, then any remaining entry in
/// map order.
fn pick_thumbnail(record: &PhotoStorageRecord) -> Option<&str> {
    for size in PREFERRED_THUMBNAIL_SIZES {
        if let Some(key) = record.thumbnail(size) {
            return Some(key);
        }
    }
    record.thumbnails.values().next().map(String::as_str)
}

fn resolve_thumbnail_first(record: &PhotoStorageRecord) -> ResolvedAsset {
    let full_key = record.has_full_key().then_some(record.key.as_str());

    if let Some(thumb_key) = pick_thumbnail(record) {
        // Path-derived thumbnail keys mark providers whose derivatives can
        // silently 404; fall through to the full image when one exists and
        // is not itself a thumbnail path.
        if let Some(full) = full_key {
            if keys::is_thumbnail_key(thumb_key) && !keys::is_thumbnail_key(full) {
                return ResolvedAsset::asset(record.provider, full, false);
            }
        }
        return ResolvedAsset::asset(record.provider, thumb_key, true);
    }

    if let Some(full) = full_key {
        return ResolvedAsset::asset(record.provider, full, false);
    }

    ResolvedAsset::placeholder()
}

fn resolve_original_first(record: &PhotoStorageRecord) -> ResolvedAsset {
    if record.has_full_key() {
        return ResolvedAsset::asset(record.provider, &record.key, false);
    }

    if let Some(thumb_key) = pick_thumbnail(record) {
        return ResolvedAsset::asset(record.provider, thumb_key, true);
    }

    ResolvedAsset::placeholder()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record(provider: ProviderKind, key: &str) -> PhotoStorageRecord {
        PhotoStorageRecord::new(Uuid::new_v4(), provider, key)
    }

    #[test]
    fn test_path_derived_thumbnail_falls_back_to_full_image() {
        // The Drive-thumbnail-404 regression: a thumbnail whose key matches
        // the size-segment heuristic loses to a reliable full-image key.
        let mut rec = record(ProviderKind::GoogleDrive, "albums/a1/p1.jpg");
        rec.set_thumbnail("medium", "albums/a1/medium/p1.jpg");

        let resolved = resolve(&rec, AssetPreference::Thumbnail);
        assert_eq!(resolved.key, "albums/a1/p1.jpg");
        assert!(!resolved.is_thumbnail);
    }

    #[test]
    fn test_opaque_thumbnail_key_is_served() {
        // A thumbnail key that is not path-derived (an opaque file id) is
        // trusted and served directly.
        let mut rec = record(ProviderKind::GoogleDrive, "full-file-id");
        rec.set_thumbnail("medium", "thumb-file-id");

        let resolved = resolve(&rec, AssetPreference::Thumbnail);
        assert_eq!(resolved.key, "thumb-file-id");
        assert!(resolved.is_thumbnail);
    }

    #[test]
    fn test_thumbnail_size_precedence() {
        let mut rec = record(ProviderKind::S3, "full-id");
        rec.set_thumbnail("tiny", "tiny-id");
        rec.set_thumbnail("small", "small-id");
        rec.set_thumbnail("medium", "medium-id");

        let resolved = resolve(&rec, AssetPreference::Thumbnail);
        assert_eq!(resolved.key, "medium-id");

        rec.thumbnails.remove("medium");
        let resolved = resolve(&rec, AssetPreference::Thumbnail);
        assert_eq!(resolved.key, "small-id");

        rec.thumbnails.remove("small");
        let resolved = resolve(&rec, AssetPreference::Thumbnail);
        assert_eq!(resolved.key, "tiny-id");
    }

    #[test]
    fn test_full_key_only_resolves_identically_for_both_preferences() {
        let rec = record(ProviderKind::Local, "albums/a1/p1.jpg");

        let thumb = resolve(&rec, AssetPreference::Thumbnail);
        let original = resolve(&rec, AssetPreference::Original);
        assert_eq!(thumb.key, "albums/a1/p1.jpg");
        assert_eq!(original.key, thumb.key);
        assert!(!thumb.is_placeholder);
    }

    #[test]
    fn test_original_preference_only_falls_back_without_full_key() {
        let mut rec = record(ProviderKind::S3, "albums/a1/p1.jpg");
        rec.set_thumbnail("medium", "albums/a1/medium/p1.jpg");

        // Full key present: originals never serve a thumbnail.
        let resolved = resolve(&rec, AssetPreference::Original);
        assert_eq!(resolved.key, "albums/a1/p1.jpg");

        // No full key: the thumbnail is better than nothing.
        rec.key = String::new();
        let resolved = resolve(&rec, AssetPreference::Original);
        assert_eq!(resolved.key, "albums/a1/medium/p1.jpg");
        assert!(resolved.is_thumbnail);
    }

    #[test]
    fn test_empty_record_resolves_to_placeholder() {
        let rec = record(ProviderKind::GoogleDrive, "");

        for preference in [AssetPreference::Thumbnail, AssetPreference::Original] {
            let resolved = resolve(&rec, preference);
            assert!(resolved.is_placeholder);
            assert_eq!(resolved.key, PLACEHOLDER_KEY);
            assert_eq!(resolved.provider, ProviderKind::Local);
        }
    }
}
