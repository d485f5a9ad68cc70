use serde::{Deserialize, Serialize};

pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Sentinel stored in `posts.image` when a post has no uploaded image.
pub const DEFAULT_POST_IMAGE: &str = "default.jpg";
pub const DEFAULT_POST_IMAGE_URL: &str = "/static/images/blog/default.jpg";
pub const UPLOADED_POST_IMAGE_URL_PREFIX: &str = "/static/uploads/blog";

/// An image received from a form, not yet written anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub original_filename: String,
    pub bytes: Vec<u8>,
}

/// Lowercased extension of `filename` if it is one of the accepted image types.
pub fn allowed_image_extension(filename: &str) -> Option<String> {
    let (_, extension) = filename.rsplit_once('.')?;
    let extension = extension.to_ascii_lowercase();
    ALLOWED_IMAGE_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

/// Detects the MIME type of an image from its leading bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// True when the file content really is the image type its extension claims.
pub fn content_matches_extension(extension: &str, bytes: &[u8]) -> bool {
    let Some(sniffed) = sniff_image_mime(bytes) else {
        return false;
    };

    mime_guess::from_ext(extension)
        .iter()
        .any(|expected| expected.essence_str() == sniffed)
}

/// Reduces a user or database supplied filename to a flat, ASCII-only name.
///
/// Path separators become spaces, runs of whitespace become `_`, every other
/// character outside `[A-Za-z0-9._-]` is dropped and leading dots or
/// underscores are trimmed. The result may be empty.
pub fn secure_filename(filename: &str) -> String {
    let flattened: String = filename
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect::<String>()
        .trim_start_matches(['.', '_'])
        .to_string()
}

/// A stored filename is acceptable as-is only if sanitising leaves it unchanged.
pub fn is_safe_stored_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename.trim() == filename
        && !filename.contains("..")
        && secure_filename(filename) == filename
}

/// Public URL of a post image: the bundled default for the sentinel, the upload
/// directory for anything else.
pub fn resolve_post_image_url(image: &str) -> String {
    if image.is_empty() || image == DEFAULT_POST_IMAGE {
        return DEFAULT_POST_IMAGE_URL.to_string();
    }

    let safe = secure_filename(image);
    if safe.is_empty() {
        return DEFAULT_POST_IMAGE_URL.to_string();
    }

    format!("{UPLOADED_POST_IMAGE_URL_PREFIX}/{safe}")
}
