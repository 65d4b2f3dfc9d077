//! Content-type inference from storage keys.
//!
//! Serving infers `Content-Type` from the key's file extension; backend
//! hints are a fallback for extension-less keys (Drive file ids).

use fotio_storage::keys;

const FALLBACK: &str = "application/octet-stream";

/// MIME type for a file extension (lowercased, no dot).
pub fn from_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "heic" => "image/heic",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "json" => "application/json",
        "txt" => "text/plain; charset=utf-8",
        _ => return None,
    };
    Some(mime)
}

/// Content type for a storage key: extension first, then the backend's
/// hint, then octet-stream.
pub fn for_key(key: &str, backend_hint: Option<&str>) -> String {
    keys::extension(key)
        .as_deref()
        .and_then(from_extension)
        .map(String::from)
        .or_else(|| backend_hint.map(String::from))
        .unwrap_or_else(|| FALLBACK.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_image_extensions() {
        assert_eq!(for_key("albums/a1/p1.jpg", None), "image/jpeg");
        assert_eq!(for_key("albums/a1/p1.JPEG", None), "image/jpeg");
        assert_eq!(for_key("p.png", None), "image/png");
        assert_eq!(for_key("p.webp", None), "image/webp");
    }

    #[test]
    fn test_backend_hint_used_for_opaque_keys() {
        assert_eq!(
            for_key("1a2b3c4d5e6f", Some("image/jpeg")),
            "image/jpeg"
        );
    }

    #[test]
    fn test_extension_wins_over_hint() {
        assert_eq!(for_key("p.png", Some("image/jpeg")), "image/png");
    }

    #[test]
    fn test_fallback_is_octet_stream() {
        assert_eq!(for_key("no-extension", None), "application/octet-stream");
        assert_eq!(for_key("weird.xyz", None), "application/octet-stream");
    }
}
