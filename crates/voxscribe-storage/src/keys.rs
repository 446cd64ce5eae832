//! Shared object-key generation and MIME inference for storage backends.

use std::path::Path;

use object_store::{Attribute, Attributes};
use uuid::Uuid;

/// Generate an object key for an audio upload: `audio/{uuid}-{basename}`.
pub fn generate_object_key(local_path: &Path) -> String {
    let basename = local_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio");
    format!("audio/{}-{}", Uuid::new_v4(), basename)
}

/// Infer a MIME type from the file extension. Unknown extensions fall back
/// to `application/octet-stream`.
pub fn infer_content_type(local_path: &Path) -> &'static str {
    match local_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("aac") => "audio/aac",
        Some("flac") => "audio/flac",
        Some("ogg") => "audio/ogg",
        Some("opus") => "audio/opus",
        _ => "application/octet-stream",
    }
}

/// Object attributes applied on upload so the provider serves the object
/// with the right `Content-Type` when the vendor fetches it.
pub(crate) fn upload_attributes(content_type: &str) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, String::from(content_type).into());
    attributes
}
