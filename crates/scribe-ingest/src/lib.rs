//! Startup wiring for scribe.
//!
//! [`build_extractor`] probes which backends are compiled in and which
//! external tools and keys are present, then orders the usable strategies
//! into an immutable [`Extractor`]. The front ends only ever talk to this
//! crate and `scribe-core`.

use std::path::Path;

use scribe_core::{Document, ExtractError, Extractor};

mod plan;
mod probe;

pub use plan::{StrategyStatus, build_extractor, describe, plan, statuses};
pub use probe::{Capabilities, Missing, Renderer, probe};

/// Read a file from disk and extract its text.
pub fn extract_path(path: &Path, extractor: &Extractor) -> Result<String, ExtractError> {
    let document = Document::from_path(path)?;
    extractor.extract(&document)
}

/// Extract text from an uploaded payload.
pub fn extract_bytes(
    filename: &str,
    data: Vec<u8>,
    extractor: &Extractor,
) -> Result<String, ExtractError> {
    let document = Document::from_upload(filename, data)?;
    extractor.extract(&document)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use scribe_core::StrategyKind;
    use scribe_core::mock::{MockRecognizer, MockStrategy};

    fn extractor() -> Extractor {
        Extractor::builder()
            .recognizer(Arc::new(MockRecognizer::text("  receipt total 12.00 \n")))
            .strategy(Arc::new(MockStrategy::pages(StrategyKind::TextLayer, &["page one"])))
            .build()
    }

    #[test]
    fn extract_path_reads_pdf_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.PDF");
        std::fs::write(&path, b"%PDF-1.5\n...").unwrap();
        let text = extract_path(&path, &extractor()).unwrap();
        assert_eq!(text, "--- Page 1 ---\npage one");
    }

    #[test]
    fn extract_path_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_path(&dir.path().join("gone.png"), &extractor()).unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }

    #[test]
    fn extract_bytes_trims_image_text() {
        let text = extract_bytes("receipt.jpg", vec![0xFF, 0xD8, 0xFF], &extractor()).unwrap();
        assert_eq!(text, "receipt total 12.00");
    }

    #[test]
    fn extract_bytes_rejects_unknown_kind() {
        let err = extract_bytes("notes.txt", b"hello".to_vec(), &extractor()).unwrap_err();
        assert!(err.is_client_error());
    }
}
