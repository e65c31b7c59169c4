//! Tesseract OCR engine.

use std::io::Write as _;

use scribe_core::{BackendError, ImageData, TextRecognizer};

use crate::command::{ToolVersion, probe_tool, run};

/// OCR engine wrapping the `tesseract` CLI tool.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: String,
    language: String,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl TesseractRecognizer {
    pub fn new(program: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            language: language.into(),
        }
    }

    /// Check the binary is installed.
    pub fn probe(&self) -> Result<ToolVersion, BackendError> {
        probe_tool(&self.program, "--version")
    }

    fn args(&self, input: &str) -> Vec<String> {
        vec![
            input.to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
        ]
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize_text(&self, image: &ImageData) -> Result<String, BackendError> {
        // Write our input to a temporary file; the extension tells tesseract
        // (leptonica) how to decode it.
        let mut input = tempfile::Builder::new()
            .prefix("scribe-tesseract")
            .suffix(&format!(".{}", image.format.extension()))
            .tempfile()?;
        input.write_all(&image.data)?;
        input.flush()?;

        let path = input.path().to_string_lossy().into_owned();
        let output = run(&self.program, self.args(&path))?;
        let text = String::from_utf8_lossy(&output.stdout).into_owned();

        tracing::debug!(
            bytes = image.data.len(),
            chars = text.len(),
            language = %self.language,
            "tesseract finished"
        );
        Ok(text)
    }
}
