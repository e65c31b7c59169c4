use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub mod backend;
pub mod config_file;
pub mod document;
pub mod extractor;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod strategy;

// Re-export for convenience
pub use backend::{BackendError, EmbeddedTextReader, PageRasterizer, TextRecognizer};
pub use document::{ALLOWED_EXTENSIONS, Document, ImageData, ImageFormat, MediaKind, allowed_file};
pub use extractor::{
    Attempt, Extractor, ExtractorBuilder, FailureReport, Outcome, Unavailable, extract,
    format_pages,
};
pub use strategy::{
    DEFAULT_RENDER_SCALE, ExtractionStrategy, NativeRenderOcr, PageText, RasterizeAllOcr,
    StrategyKind, TextLayerOnly,
};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported media kind: {0}")]
    UnsupportedMediaKind(String),
    #[error("empty document")]
    EmptyDocument,
    #[error("strategy unavailable: {0}")]
    StrategyUnavailable(Unavailable),
    #[error("error processing image: {0}")]
    Recognition(#[source] BackendError),
    #[error("{0}")]
    ExtractionFailed(FailureReport),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Whether the caller sent something we refuse to process, as opposed to
    /// an extraction that was attempted and failed.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExtractError::UnsupportedMediaKind(_) | ExtractError::EmptyDocument
        )
    }
}

/// Which engine recognizes images (uploaded images and rasterized pages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcrEngine {
    #[default]
    Tesseract,
    Gemini,
    Mistral,
}

impl OcrEngine {
    pub fn id(&self) -> &'static str {
        match self {
            OcrEngine::Tesseract => "tesseract",
            OcrEngine::Gemini => "gemini",
            OcrEngine::Mistral => "mistral",
        }
    }
}

impl fmt::Display for OcrEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for OcrEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tesseract" => Ok(OcrEngine::Tesseract),
            "gemini" => Ok(OcrEngine::Gemini),
            "mistral" => Ok(OcrEngine::Mistral),
            other => Err(format!(
                "unknown OCR engine '{other}' (expected tesseract, gemini or mistral)"
            )),
        }
    }
}

/// Runtime configuration, resolved from config file, environment and flags.
#[derive(Clone)]
pub struct Config {
    pub ocr_engine: OcrEngine,
    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    pub ocr_language: String,
    pub tesseract_cmd: String,
    pub pdftoppm_cmd: String,
    pub pdfinfo_cmd: String,
    /// Linear scale for rasterized pages before OCR.
    pub render_scale: f32,
    pub strategy_order: Vec<StrategyKind>,
    pub gemini_key: Option<String>,
    pub gemini_model: String,
    pub mistral_key: Option<String>,
    pub mistral_model: String,
    /// Override for the Gemini API root, e.g. a proxy.
    pub gemini_base_url: Option<String>,
    pub mistral_base_url: Option<String>,
    pub hosted_timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("ocr_engine", &self.ocr_engine)
            .field("ocr_language", &self.ocr_language)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("pdftoppm_cmd", &self.pdftoppm_cmd)
            .field("pdfinfo_cmd", &self.pdfinfo_cmd)
            .field("render_scale", &self.render_scale)
            .field("strategy_order", &self.strategy_order)
            .field("gemini_key", &self.gemini_key.as_ref().map(|_| "***"))
            .field("gemini_model", &self.gemini_model)
            .field("mistral_key", &self.mistral_key.as_ref().map(|_| "***"))
            .field("mistral_model", &self.mistral_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("mistral_base_url", &self.mistral_base_url)
            .field("hosted_timeout_secs", &self.hosted_timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr_engine: OcrEngine::Tesseract,
            ocr_language: "eng".to_string(),
            tesseract_cmd: "tesseract".to_string(),
            pdftoppm_cmd: "pdftoppm".to_string(),
            pdfinfo_cmd: "pdfinfo".to_string(),
            render_scale: DEFAULT_RENDER_SCALE,
            strategy_order: StrategyKind::ALL.to_vec(),
            gemini_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            mistral_key: None,
            mistral_model: "mistral-ocr-latest".to_string(),
            gemini_base_url: None,
            mistral_base_url: None,
            hosted_timeout_secs: 120,
        }
    }
}
