use std::fmt;
use std::path::Path;

use crate::ExtractError;

/// Extensions accepted at the upload boundary, lowercase, without the dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf", "tiff", "bmp", "gif"];

/// Encoded raster formats a recognizer may receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Tiff,
    Bmp,
    Gif,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// File extension used when an engine needs the image on disk.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Gif => "gif",
        }
    }
}

/// What kind of document an upload is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image(ImageFormat),
    Pdf,
}

impl MediaKind {
    /// Select a kind from a file extension (case-insensitive, with or without
    /// the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(MediaKind::Pdf),
            "png" => Some(MediaKind::Image(ImageFormat::Png)),
            "jpg" | "jpeg" => Some(MediaKind::Image(ImageFormat::Jpeg)),
            "tiff" => Some(MediaKind::Image(ImageFormat::Tiff)),
            "bmp" => Some(MediaKind::Image(ImageFormat::Bmp)),
            "gif" => Some(MediaKind::Image(ImageFormat::Gif)),
            _ => None,
        }
    }

    /// Select a kind from a filename. Files without an extension are rejected.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Pdf => write!(f, "pdf"),
            MediaKind::Image(format) => write!(f, "image ({})", format.extension()),
        }
    }
}

/// Whether `filename` carries one of the [`ALLOWED_EXTENSIONS`].
pub fn allowed_file(filename: &str) -> bool {
    MediaKind::from_filename(filename).is_some()
}

/// Encoded image bytes handed to a [`TextRecognizer`](crate::TextRecognizer).
#[derive(Debug, Clone)]
pub struct ImageData {
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

impl ImageData {
    pub fn png(data: Vec<u8>) -> Self {
        Self {
            data,
            format: ImageFormat::Png,
        }
    }
}

/// One uploaded document. Built per request, consumed once by the extractor.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub kind: MediaKind,
    pub data: Vec<u8>,
}

impl Document {
    /// Build a document from an uploaded filename and its bytes.
    ///
    /// The extension picks the kind. Empty payloads and `.pdf` files without
    /// the `%PDF-` magic are rejected before any strategy runs.
    pub fn from_upload(filename: impl Into<String>, data: Vec<u8>) -> Result<Self, ExtractError> {
        let filename = filename.into();
        let kind = MediaKind::from_filename(&filename)
            .ok_or_else(|| ExtractError::UnsupportedMediaKind(filename.clone()))?;

        if data.is_empty() {
            return Err(ExtractError::EmptyDocument);
        }
        if kind == MediaKind::Pdf && !data.starts_with(b"%PDF-") {
            return Err(ExtractError::UnsupportedMediaKind(format!(
                "{filename} has a .pdf extension but is not a PDF"
            )));
        }

        Ok(Self {
            filename,
            kind,
            data,
        })
    }

    /// Read a document from disk, using the file name for kind selection.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if MediaKind::from_filename(&filename).is_none() {
            return Err(ExtractError::UnsupportedMediaKind(filename));
        }
        let data = std::fs::read(path)?;
        Self::from_upload(filename, data)
    }

    /// View an image document as recognizer input. `None` for PDFs.
    pub fn as_image(&self) -> Option<ImageData> {
        match self.kind {
            MediaKind::Image(format) => Some(ImageData {
                data: self.data.clone(),
                format,
            }),
            MediaKind::Pdf => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_selects_kind() {
        assert_eq!(MediaKind::from_filename("scan.PDF"), Some(MediaKind::Pdf));
        assert_eq!(
            MediaKind::from_filename("photo.jpeg"),
            Some(MediaKind::Image(ImageFormat::Jpeg))
        );
        assert_eq!(
            MediaKind::from_filename("photo.jpg"),
            Some(MediaKind::Image(ImageFormat::Jpeg))
        );
        assert_eq!(MediaKind::from_filename("archive.tar.gz"), None);
        assert_eq!(MediaKind::from_filename("README"), None);
    }

    #[test]
    fn allow_list_matches_extensions() {
        for ext in ALLOWED_EXTENSIONS {
            assert!(allowed_file(&format!("file.{ext}")), "{ext} should be allowed");
        }
        assert!(!allowed_file("notes.docx"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn empty_upload_rejected() {
        let err = Document::from_upload("a.png", vec![]).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyDocument));
    }

    #[test]
    fn unknown_extension_rejected() {
        let err = Document::from_upload("a.docx", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedMediaKind(_)));
    }

    #[test]
    fn pdf_without_magic_rejected() {
        let err = Document::from_upload("a.pdf", b"hello".to_vec()).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedMediaKind(_)));

        let doc = Document::from_upload("a.pdf", b"%PDF-1.7\n".to_vec()).unwrap();
        assert_eq!(doc.kind, MediaKind::Pdf);
        assert!(doc.as_image().is_none());
    }

    #[test]
    fn image_document_exposes_format() {
        let doc = Document::from_upload("shot.gif", vec![0x47, 0x49, 0x46]).unwrap();
        let image = doc.as_image().unwrap();
        assert_eq!(image.format, ImageFormat::Gif);
        assert_eq!(image.format.mime_type(), "image/gif");
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();
        let doc = Document::from_path(&path).unwrap();
        assert_eq!(doc.filename, "page.png");
        assert_eq!(doc.kind, MediaKind::Image(ImageFormat::Png));
    }
}
