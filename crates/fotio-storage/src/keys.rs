//! Key validation and path classification.
//!
//! Centralized so all backends and the serving layer agree on what a valid
//! key looks like and on the thumbnail-path heuristic.

use crate::traits::{StorageError, StorageResult};

/// Path segments that mark a key as a thumbnail variant. Membership in a
/// photo record's thumbnail map is the authoritative signal; this heuristic
/// classifies raw serve paths and legacy records that predate the map.
pub const THUMBNAIL_SEGMENTS: [&str; 3] = ["medium", "small", "thumb"];

/// Key served when a photo record resolves to nothing at all.
pub const PLACEHOLDER_KEY: &str = "placeholder.png";

/// Reject keys that could escape a backend's namespace.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("empty storage key".to_string()));
    }
    if key.split('/').any(|segment| segment == "..") || key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "storage key contains invalid path components".to_string(),
        ));
    }
    Ok(())
}

/// Whether a key looks like a thumbnail variant: any non-final path segment
/// is a known size marker (`albums/a1/medium/p1.jpg`).
pub fn is_thumbnail_key(key: &str) -> bool {
    let segments: Vec<&str> = key.split('/').collect();
    if segments.len() < 2 {
        return false;
    }
    segments[..segments.len() - 1]
        .iter()
        .any(|segment| THUMBNAIL_SEGMENTS.contains(segment))
}

/// File extension of a key, lowercased, if it has one.
pub fn extension(key: &str) -> Option<String> {
    let filename = key.rsplit('/').next()?;
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("../../etc/passwd").is_err());
        assert!(validate_key("albums/../../etc/passwd").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("").is_err());
    }

    #[test]
    fn test_validate_key_accepts_normal_paths() {
        assert!(validate_key("albums/a1/p1.jpg").is_ok());
        assert!(validate_key("albums/a1/medium/p1.jpg").is_ok());
        // dots inside a segment are fine, only a bare ".." segment escapes
        assert!(validate_key("albums/a..b/p1.jpg").is_ok());
    }

    #[test]
    fn test_thumbnail_heuristic() {
        assert!(is_thumbnail_key("albums/a1/medium/p1.jpg"));
        assert!(is_thumbnail_key("small/p1.jpg"));
        assert!(is_thumbnail_key("a/thumb/b/p1.jpg"));
        assert!(!is_thumbnail_key("albums/a1/p1.jpg"));
        // the filename itself is not a size segment
        assert!(!is_thumbnail_key("albums/a1/thumb.jpg"));
        assert!(!is_thumbnail_key("p1.jpg"));
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("albums/a1/p1.jpg").as_deref(), Some("jpg"));
        assert_eq!(extension("a/b/photo.JPEG").as_deref(), Some("jpeg"));
        assert_eq!(extension("a/b/noext"), None);
        assert_eq!(extension("a/b/.hidden"), None);
    }
}
