//! PDF extraction strategies.
//!
//! Each strategy is one independent way of getting text out of a PDF. The
//! [`Extractor`](crate::Extractor) tries them in a fixed order and keeps the
//! first one that produces usable text.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::backend::{BackendError, EmbeddedTextReader, PageRasterizer, TextRecognizer};

/// Default linear upscale applied before OCR (2x linear, 4x pixel area).
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// Identifies a strategy in config files, logs and failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Embedded text per page, OCR of the rendered page when a page has none.
    NativeOcr,
    /// Embedded text only.
    TextLayer,
    /// Render every page and OCR it.
    RasterOcr,
    /// Send the whole document to a hosted OCR service.
    HostedOcr,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::NativeOcr,
        StrategyKind::TextLayer,
        StrategyKind::RasterOcr,
        StrategyKind::HostedOcr,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            StrategyKind::NativeOcr => "native-ocr",
            StrategyKind::TextLayer => "text-layer",
            StrategyKind::RasterOcr => "raster-ocr",
            StrategyKind::HostedOcr => "hosted-ocr",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::NativeOcr => "native text with per-page OCR fallback",
            StrategyKind::TextLayer => "embedded text layer only",
            StrategyKind::RasterOcr => "rasterize all pages and OCR",
            StrategyKind::HostedOcr => "hosted whole-document OCR",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.id() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = StrategyKind::ALL.iter().map(|k| k.id()).collect();
                format!("unknown strategy '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Text of a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based page number.
    pub number: usize,
    pub text: String,
}

impl PageText {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Number pages from 1 in the order given.
pub fn number_pages(texts: Vec<String>) -> Vec<PageText> {
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| PageText::new(i + 1, text))
        .collect()
}

/// One way of obtaining text from a PDF.
///
/// Strategies hold no mutable state; an error means "this strategy declined"
/// and the extractor moves on to the next one.
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn extract(&self, pdf: &[u8]) -> Result<Vec<PageText>, BackendError>;
}

/// Strategy A: embedded text first, rasterize + OCR the pages that have none.
pub struct NativeRenderOcr {
    reader: Arc<dyn EmbeddedTextReader>,
    rasterizer: Arc<dyn PageRasterizer>,
    recognizer: Arc<dyn TextRecognizer>,
    scale: f32,
}

impl NativeRenderOcr {
    pub fn new(
        reader: Arc<dyn EmbeddedTextReader>,
        rasterizer: Arc<dyn PageRasterizer>,
        recognizer: Arc<dyn TextRecognizer>,
    ) -> Self {
        Self {
            reader,
            rasterizer,
            recognizer,
            scale: DEFAULT_RENDER_SCALE,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

impl ExtractionStrategy for NativeRenderOcr {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NativeOcr
    }

    fn extract(&self, pdf: &[u8]) -> Result<Vec<PageText>, BackendError> {
        let embedded = self.reader.extract_embedded_text(pdf)?;
        let mut pages = Vec::with_capacity(embedded.len());

        for (index, text) in embedded.into_iter().enumerate() {
            let number = index + 1;
            if !text.trim().is_empty() {
                pages.push(PageText::new(number, text));
                continue;
            }

            tracing::debug!(
                page = number,
                rasterizer = self.rasterizer.name(),
                recognizer = self.recognizer.name(),
                "no embedded text, running OCR"
            );
            let image = self.rasterizer.rasterize_page(pdf, index, self.scale)?;
            let text = self.recognizer.recognize_text(&image)?;
            pages.push(PageText::new(number, text));
        }

        Ok(pages)
    }
}

/// Strategy B: embedded text only, never OCR.
pub struct TextLayerOnly {
    reader: Arc<dyn EmbeddedTextReader>,
}

impl TextLayerOnly {
    pub fn new(reader: Arc<dyn EmbeddedTextReader>) -> Self {
        Self { reader }
    }
}

impl ExtractionStrategy for TextLayerOnly {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TextLayer
    }

    fn extract(&self, pdf: &[u8]) -> Result<Vec<PageText>, BackendError> {
        Ok(number_pages(self.reader.extract_embedded_text(pdf)?))
    }
}

/// Strategy C: rasterize every page and OCR it.
pub struct RasterizeAllOcr {
    rasterizer: Arc<dyn PageRasterizer>,
    recognizer: Arc<dyn TextRecognizer>,
    scale: f32,
}

impl RasterizeAllOcr {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            rasterizer,
            recognizer,
            scale: DEFAULT_RENDER_SCALE,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

impl ExtractionStrategy for RasterizeAllOcr {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RasterOcr
    }

    fn extract(&self, pdf: &[u8]) -> Result<Vec<PageText>, BackendError> {
        let count = self.rasterizer.page_count(pdf)?;
        let mut pages = Vec::with_capacity(count);
        for index in 0..count {
            let image = self.rasterizer.rasterize_page(pdf, index, self.scale)?;
            let text = self.recognizer.recognize_text(&image)?;
            tracing::debug!(page = index + 1, chars = text.len(), "page recognized");
            pages.push(PageText::new(index + 1, text));
        }
        Ok(pages)
    }
}
