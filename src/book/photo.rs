//! Photo attachment limits and data-URL encoding.

use base64::{engine::general_purpose::STANDARD, Engine};
use std::path::Path;

pub const MAX_PHOTOS: usize = 5;
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhotoError {
    #[error("You can upload maximum {} photos", MAX_PHOTOS)]
    TooMany,

    #[error("Photo {0} must be less than 5MB")]
    TooLarge(String),

    #[error("File {0} is not a valid image")]
    NotImage(String),

    #[error("Photo {0} is not a base64 data URL")]
    MalformedDataUrl(String),

    #[error("No photo with id {0}")]
    NotFound(i64),
}

/// Image MIME type from a file extension; `None` for anything that is not an image.
pub fn image_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "tif" | "tiff" => "image/tiff",
        _ => return None,
    };
    Some(mime)
}

/// `data:{mime};base64,{payload}`
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 data URL into its MIME type and decoded bytes.
pub fn from_data_url(name: &str, data_url: &str) -> Result<(String, Vec<u8>), PhotoError> {
    let malformed = || PhotoError::MalformedDataUrl(name.to_string());
    let rest = data_url.strip_prefix("data:").ok_or_else(malformed)?;
    let (header, payload) = rest.split_once(',').ok_or_else(malformed)?;
    let mime = header.strip_suffix(";base64").ok_or_else(malformed)?;
    let bytes = STANDARD.decode(payload.trim()).map_err(|_| malformed())?;
    Ok((mime.to_string(), bytes))
}
