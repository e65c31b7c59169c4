use scribe_core::Extractor;

/// Shared application state accessible from all handlers.
///
/// The extractor is immutable after startup; each request owns its own
/// document.
#[derive(Debug)]
pub struct AppState {
    pub extractor: Extractor,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(extractor: Extractor, max_upload_bytes: usize) -> Self {
        Self {
            extractor,
            max_upload_bytes,
        }
    }

    /// Upload limit in whole MiB, for messages.
    pub fn max_upload_mb(&self) -> usize {
        self.max_upload_bytes.div_ceil(1024 * 1024)
    }
}
