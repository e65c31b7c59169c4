use axum::extract::Multipart;
use once_cell::sync::Lazy;
use regex::Regex;
use scribe_core::{MediaKind, allowed_file};

use crate::error::ApiError;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").unwrap());

/// The `file` field of an upload, validated but not yet parsed.
#[derive(Debug)]
pub struct UploadedFile {
    /// Sanitized name; safe to log. Keeps the original extension.
    pub filename: String,
    pub data: Vec<u8>,
}

/// Read the multipart body and validate the `file` field.
///
/// Other fields are drained and ignored. Validation order: field present,
/// filename non-empty, extension allowed.
pub async fn parse_upload(
    mut multipart: Multipart,
    limit_mb: usize,
) -> Result<UploadedFile, ApiError> {
    let mut file: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from_multipart(e, limit_mb))?
    {
        if field.name() == Some("file") && file.is_none() {
            let filename = field.file_name().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::from_multipart(e, limit_mb))?
                .to_vec();
            file = Some((filename, data));
        } else {
            // Drain so the stream can advance.
            field
                .bytes()
                .await
                .map_err(|e| ApiError::from_multipart(e, limit_mb))?;
        }
    }

    let (filename, data) = file.ok_or(ApiError::NoFile)?;
    let filename = filename.unwrap_or_default();
    if filename.is_empty() {
        return Err(ApiError::NoFileSelected);
    }
    if !allowed_file(&filename) {
        return Err(ApiError::InvalidFileType);
    }

    Ok(UploadedFile {
        filename: safe_upload_name(&filename),
        data,
    })
}

/// Reduce a client-supplied filename to ASCII letters, digits, `_`, `.`
/// and `-`, with path separators and whitespace folded to `_`.
pub fn secure_filename(name: &str) -> String {
    let spaced = name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    UNSAFE_CHARS
        .replace_all(&joined, "")
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// Sanitized name that still selects the same media kind.
fn safe_upload_name(original: &str) -> String {
    let safe = secure_filename(original);
    if MediaKind::from_filename(&safe) == MediaKind::from_filename(original) {
        return safe;
    }
    let ext = original
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    format!("upload.{ext}")
}
