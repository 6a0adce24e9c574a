use uuid::Uuid;

use crate::blob::BlobError;

/// URL prefix under which stored blobs are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

const MAX_KEY_LEN: usize = 128;
const MAX_EXTENSION_LEN: usize = 8;

/// Generates an opaque, collision-resistant storage key for an upload.
///
/// Only a short alphanumeric extension is carried over from the client's file
/// name; the name itself is kept as metadata and never reaches the storage path.
pub fn generate_storage_key(original_name: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    match safe_extension(original_name) {
        Some(ext) => format!("{id}.{ext}"),
        None => id,
    }
}

/// Public, read-only path for a stored blob.
pub fn public_path(key: &str) -> String {
    format!("{PUBLIC_PREFIX}/{key}")
}

/// Rejects keys that could escape the storage namespace.
pub fn validate_key(key: &str) -> Result<(), BlobError> {
    let well_formed = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));

    if well_formed {
        Ok(())
    } else {
        Err(BlobError::InvalidKey(key.to_string()))
    }
}

/// Content type inferred from a key's extension.
pub fn content_type_for(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Whether browsers may render a blob in place. Everything else, including
/// markup such as SVG, is served as a download.
pub fn serves_inline(key: &str) -> bool {
    matches!(
        content_type_for(key),
        "application/pdf" | "image/png" | "image/jpeg" | "image/gif" | "image/webp" | "image/avif"
    )
}

fn safe_extension(original_name: &str) -> Option<String> {
    // Clients may send Windows-style paths as the file name.
    let base = original_name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(original_name);
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
