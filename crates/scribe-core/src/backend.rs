use thiserror::Error;

use crate::ImageData;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    Open(String),
    #[error("failed to extract text: {0}")]
    Extraction(String),
    #[error("failed to render page {page}: {message}")]
    Render { page: usize, message: String },
    #[error("text recognition failed: {0}")]
    Recognition(String),
    #[error("{0} is not installed or not on PATH")]
    NotInstalled(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Image-to-text recognition (a local engine or a hosted API).
pub trait TextRecognizer: Send + Sync {
    /// Short engine name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    fn recognize_text(&self, image: &ImageData) -> Result<String, BackendError>;
}

/// Native PDF text-layer reader.
pub trait EmbeddedTextReader: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extract the embedded text of every page, one entry per page in order.
    fn extract_embedded_text(&self, pdf: &[u8]) -> Result<Vec<String>, BackendError>;
}

/// PDF page-to-image renderer.
pub trait PageRasterizer: Send + Sync {
    fn name(&self) -> &'static str;

    fn page_count(&self, pdf: &[u8]) -> Result<usize, BackendError>;

    /// Render the page at `page_index` (0-based) at a linear `scale`, where
    /// `1.0` is 72 DPI. Output is PNG.
    fn rasterize_page(
        &self,
        pdf: &[u8],
        page_index: usize,
        scale: f32,
    ) -> Result<ImageData, BackendError>;
}
