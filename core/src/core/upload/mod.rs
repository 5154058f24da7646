//! Upload validation: declared metadata and actual content are checked
//! independently before any byte reaches the disk.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::types::StorageConfig;
use error::ValidationError;

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum ValidationError {
        #[error("uploaded file must have a filename")]
        MissingFilename,

        #[error("unsupported file extension: {0}")]
        UnsupportedExtension(String),

        #[error("unsupported content type: {0}")]
        UnsupportedContentType(String),

        #[error("empty file")]
        EmptyFile,

        #[error("file exceeds {max} bytes")]
        TooLarge { max: u64 },

        #[error("invalid image content")]
        InvalidImageContent,

        #[error("unsupported image format: {0:?}")]
        UnsupportedImageFormat(image::ImageFormat),

        #[error("image format {expected} does not match file extension {declared}")]
        FormatMismatch { expected: String, declared: String },

        #[error("failed to read upload: {0}")]
        Io(#[from] std::io::Error),
    }
}

/// Transient per-request input: declared metadata plus the byte source.
/// Consumed entirely by validation.
pub struct UploadCandidate<R> {
    pub filename: String,
    pub content_type: String,
    pub source: R,
}

/// An accepted upload: the exact bytes read plus the canonical extension.
pub struct ValidatedUpload {
    pub bytes: Vec<u8>,
    pub extension: String,
}

/// Decoded format → canonical extension. The decoded pixel format is the
/// final authority on what a file is, whatever its name claims.
fn format_extension(format: image::ImageFormat) -> Option<&'static str> {
    match format {
        image::ImageFormat::Jpeg => Some(".jpg"),
        image::ImageFormat::Png => Some(".png"),
        image::ImageFormat::WebP => Some(".webp"),
        _ => None,
    }
}

/// Lower-cased extension with the leading dot, `.jpeg` folded into `.jpg`.
/// Empty string when the filename has no extension.
fn normalized_extension(filename: &str) -> String {
    match Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = format!(".{}", ext.to_ascii_lowercase());
            if ext == ".jpeg" { ".jpg".to_string() } else { ext }
        }
        None => String::new(),
    }
}

/// Validates an upload candidate against the configured limits.
///
/// Checks run in order, each with its own rejection reason: filename,
/// extension, declared content type, bounded size, image decode, and finally
/// decoded-format agreement with the extension. Reads at most
/// `max_upload_bytes + 1` bytes from the source and never touches the disk.
pub fn validate<R: Read>(
    mut candidate: UploadCandidate<R>,
    config: &StorageConfig,
) -> Result<ValidatedUpload, ValidationError> {
    if candidate.filename.trim().is_empty() {
        return Err(ValidationError::MissingFilename);
    }

    let extension = normalized_extension(&candidate.filename);
    if !config.allowed_extensions.contains(&extension) {
        return Err(ValidationError::UnsupportedExtension(extension));
    }

    if !config.allowed_mime_types.contains(&candidate.content_type) {
        return Err(ValidationError::UnsupportedContentType(
            candidate.content_type,
        ));
    }

    // One byte past the limit is enough to detect oversize without buffering
    // an unbounded payload.
    let max = config.max_upload_bytes;
    let mut bytes = Vec::new();
    candidate
        .source
        .by_ref()
        .take(max + 1)
        .read_to_end(&mut bytes)?;

    if bytes.is_empty() {
        return Err(ValidationError::EmptyFile);
    }
    if bytes.len() as u64 > max {
        return Err(ValidationError::TooLarge { max });
    }

    let format = image::guess_format(&bytes).map_err(|e| {
        debug!(error = %e, "image format sniff failed");
        ValidationError::InvalidImageContent
    })?;
    image::load_from_memory_with_format(&bytes, format).map_err(|e| {
        debug!(error = %e, "image decode failed");
        ValidationError::InvalidImageContent
    })?;

    let expected = format_extension(format)
        .ok_or(ValidationError::UnsupportedImageFormat(format))?;
    if expected != extension {
        return Err(ValidationError::FormatMismatch {
            expected: expected.to_string(),
            declared: extension,
        });
    }

    Ok(ValidatedUpload {
        bytes,
        extension: expected.to_string(),
    })
}

#[cfg(test)]
mod tests;
