//! Mistral OCR API: recognizer for images and a whole-document PDF strategy.

use serde::{Deserialize, Serialize};

use scribe_core::{
    BackendError, ExtractionStrategy, ImageData, PageText, StrategyKind, TextRecognizer,
};

use crate::client::{build_client, post_json};
use crate::data_uri;

const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";

pub struct MistralOcr {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl std::fmt::Debug for MistralOcr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MistralOcr")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MistralOcr {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: build_client(timeout_secs)?,
            timeout_secs,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn process(&self, document: DocumentChunk) -> Result<Vec<PageText>, BackendError> {
        let body = OcrRequest {
            model: &self.model,
            document,
            include_image_base64: false,
        };
        let request = self
            .client
            .post(format!("{}/ocr", self.base_url))
            .bearer_auth(&self.api_key);
        let response: OcrResponse = post_json(request, &body, "Mistral OCR", self.timeout_secs)?;
        let pages = response.into_pages();
        tracing::debug!(model = %self.model, pages = pages.len(), "mistral OCR finished");
        Ok(pages)
    }
}

#[derive(Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: DocumentChunk,
    include_image_base64: bool,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
enum DocumentChunk {
    ImageUrl { image_url: String },
    DocumentUrl { document_url: String },
}

#[derive(Deserialize)]
struct OcrResponse {
    #[serde(default)]
    pages: Vec<OcrPage>,
}

#[derive(Deserialize)]
struct OcrPage {
    index: usize,
    #[serde(default)]
    markdown: String,
}

impl OcrResponse {
    /// Pages sorted by their 0-based `index`, renumbered from 1.
    fn into_pages(self) -> Vec<PageText> {
        let mut pages = self.pages;
        pages.sort_by_key(|p| p.index);
        pages
            .into_iter()
            .map(|p| PageText::new(p.index + 1, p.markdown))
            .collect()
    }
}

impl TextRecognizer for MistralOcr {
    fn name(&self) -> &'static str {
        "mistral"
    }

    fn recognize_text(&self, image: &ImageData) -> Result<String, BackendError> {
        let chunk = DocumentChunk::ImageUrl {
            image_url: data_uri(image.format.mime_type(), &image.data),
        };
        let pages = self.process(chunk)?;
        let text: Vec<String> = pages.into_iter().map(|p| p.text).collect();
        Ok(text.join("\n\n"))
    }
}

impl ExtractionStrategy for MistralOcr {
    fn kind(&self) -> StrategyKind {
        StrategyKind::HostedOcr
    }

    fn extract(&self, pdf: &[u8]) -> Result<Vec<PageText>, BackendError> {
        self.process(DocumentChunk::DocumentUrl {
            document_url: data_uri("application/pdf", pdf),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_chunk_is_tagged() {
        let chunk = DocumentChunk::DocumentUrl {
            document_url: "data:application/pdf;base64,AA==".into(),
        };
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["type"], "document_url");
        assert_eq!(json["document_url"], "data:application/pdf;base64,AA==");

        let chunk = DocumentChunk::ImageUrl {
            image_url: "data:image/png;base64,AA==".into(),
        };
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["type"], "image_url");
    }

    #[test]
    fn pages_sorted_and_numbered_from_one() {
        let response: OcrResponse = serde_json::from_str(
            r##"{"pages":[
                {"index":1,"markdown":"# Second","images":[]},
                {"index":0,"markdown":"First"}
            ],"model":"mistral-ocr-latest"}"##,
        )
        .unwrap();
        let pages = response.into_pages();
        assert_eq!(pages, vec![PageText::new(1, "First"), PageText::new(2, "# Second")]);
    }

    #[test]
    fn request_body_shape() {
        let body = OcrRequest {
            model: "mistral-ocr-latest",
            document: DocumentChunk::ImageUrl {
                image_url: "data:image/png;base64,AA==".into(),
            },
            include_image_base64: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "mistral-ocr-latest");
        assert_eq!(json["document"]["type"], "image_url");
        assert_eq!(json["include_image_base64"], false);
    }

    #[test]
    fn strategy_kind_is_hosted() {
        let ocr = MistralOcr::new("key", "mistral-ocr-latest", 5).unwrap();
        assert_eq!(ocr.kind(), StrategyKind::HostedOcr);
        assert_eq!(TextRecognizer::name(&ocr), "mistral");
    }
}
