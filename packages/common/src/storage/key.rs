use super::error::StorageError;

/// Prefix under which certificate blobs are stored.
pub const CERTIFICATE_PREFIX: &str = "certificates";

const MAX_KEY_LEN: usize = 512;

/// Extensions accepted for certificate uploads, lowercased.
const CERTIFICATE_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "webp"];

/// Pick the stored extension for an uploaded certificate.
///
/// The file name's extension wins; the declared content type is the fallback
/// for uploads without one. Returns `None` for anything that is not a PDF or
/// an image.
pub fn certificate_extension(filename: Option<&str>, content_type: Option<&str>) -> Option<&'static str> {
    let from_name = filename
        .and_then(|name| name.trim().rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    if let Some(ext) = from_name {
        return CERTIFICATE_EXTENSIONS.iter().copied().find(|e| *e == ext);
    }

    match content_type?.split(';').next()?.trim() {
        "application/pdf" => Some("pdf"),
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// A fresh, collision-free key for a certificate blob:
/// `certificates/{uuid v7}.{ext}`.
pub fn certificate_key(extension: &str) -> String {
    format!("{CERTIFICATE_PREFIX}/{}.{extension}", uuid::Uuid::now_v7())
}

fn contains_path_traversal(path: &str) -> bool {
    path == ".." || path.starts_with("../") || path.contains("/../") || path.ends_with("/..")
}

/// Validate a storage key before it is mapped onto a filesystem path or an
/// object name.
pub fn validate_key(key: &str) -> Result<&str, StorageError> {
    let invalid = |msg: &str| Err(StorageError::InvalidKey(format!("{msg}: {key:?}")));

    if key.is_empty() {
        return invalid("key is empty");
    }
    if key.len() > MAX_KEY_LEN {
        return invalid("key is too long");
    }
    if key.starts_with('/') || key.ends_with('/') || key.contains("//") {
        return invalid("key has an empty segment");
    }
    if contains_path_traversal(key) {
        return invalid("key contains '..'");
    }
    if key.split('/').any(|segment| segment.starts_with('.')) {
        return invalid("key segment starts with '.'");
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
    {
        return invalid("key contains invalid characters");
    }

    Ok(key)
}
