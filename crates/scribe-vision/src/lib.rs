//! Hosted recognition engines.
//!
//! Both clients are blocking: extraction is synchronous, and the web server
//! runs it on the blocking thread pool. API keys are passed in by the caller
//! (config file or environment), never embedded.

mod client;
pub mod gemini;
pub mod mistral;

pub use gemini::{GeminiRecognizer, OCR_PROMPT};
pub use mistral::MistralOcr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// `data:<mime>;base64,<payload>` URI for inline uploads.
pub fn data_uri(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_encodes_payload() {
        assert_eq!(data_uri("image/png", b"hi"), "data:image/png;base64,aGk=");
    }
}
