//! Hand-rolled backend mocks for tests.
//!
//! Each mock counts its calls so tests can assert which capabilities a
//! strategy touched.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{BackendError, EmbeddedTextReader, PageRasterizer, TextRecognizer};
use crate::strategy::{ExtractionStrategy, PageText, StrategyKind, number_pages};
use crate::{ImageData, ImageFormat};

/// A recognizer returning fixed text, or failing.
pub struct MockRecognizer {
    response: Result<String, String>,
    calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn text(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextRecognizer for MockRecognizer {
    fn name(&self) -> &'static str {
        "mock-ocr"
    }

    fn recognize_text(&self, _image: &ImageData) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .map_err(BackendError::Recognition)
    }
}

/// A text-layer reader returning fixed pages, or failing.
pub struct MockReader {
    response: Result<Vec<String>, String>,
    calls: AtomicUsize,
}

impl MockReader {
    pub fn pages(pages: &[&str]) -> Self {
        Self {
            response: Ok(pages.iter().map(|p| p.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddedTextReader for MockReader {
    fn name(&self) -> &'static str {
        "mock-reader"
    }

    fn extract_embedded_text(&self, _pdf: &[u8]) -> Result<Vec<String>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone().map_err(BackendError::Extraction)
    }
}

/// A rasterizer that records every `(page_index, scale)` it was asked for.
pub struct MockRasterizer {
    pages: usize,
    failure: Option<String>,
    rendered: Mutex<Vec<(usize, f32)>>,
}

impl MockRasterizer {
    pub fn new(pages: usize) -> Self {
        Self {
            pages,
            failure: None,
            rendered: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            pages: 0,
            failure: Some(message.to_string()),
            rendered: Mutex::new(Vec::new()),
        }
    }

    pub fn rendered(&self) -> Vec<(usize, f32)> {
        self.rendered.lock().unwrap().clone()
    }
}

impl PageRasterizer for MockRasterizer {
    fn name(&self) -> &'static str {
        "mock-rasterizer"
    }

    fn page_count(&self, _pdf: &[u8]) -> Result<usize, BackendError> {
        match &self.failure {
            Some(message) => Err(BackendError::Open(message.clone())),
            None => Ok(self.pages),
        }
    }

    fn rasterize_page(
        &self,
        _pdf: &[u8],
        page_index: usize,
        scale: f32,
    ) -> Result<ImageData, BackendError> {
        if let Some(message) = &self.failure {
            return Err(BackendError::Render {
                page: page_index + 1,
                message: message.clone(),
            });
        }
        self.rendered.lock().unwrap().push((page_index, scale));
        Ok(ImageData {
            data: vec![0u8; 4],
            format: ImageFormat::Png,
        })
    }
}

/// A strategy with a canned outcome.
pub struct MockStrategy {
    kind: StrategyKind,
    response: Result<Vec<String>, String>,
    calls: AtomicUsize,
}

impl MockStrategy {
    pub fn pages(kind: StrategyKind, pages: &[&str]) -> Self {
        Self {
            kind,
            response: Ok(pages.iter().map(|p| p.to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(kind: StrategyKind, message: &str) -> Self {
        Self {
            kind,
            response: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExtractionStrategy for MockStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn extract(&self, _pdf: &[u8]) -> Result<Vec<PageText>, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .map(number_pages)
            .map_err(BackendError::Extraction)
    }
}
