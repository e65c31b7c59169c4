//! Google Gemini vision model used as an image recognizer.

use serde::{Deserialize, Serialize};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use scribe_core::{BackendError, ImageData, TextRecognizer};

use crate::client::{build_client, post_json};

pub const OCR_PROMPT: &str = "Extract all readable text from this image clearly and accurately.";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiRecognizer {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl std::fmt::Debug for GeminiRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiRecognizer")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiRecognizer {
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

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Inline { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_request(image: &ImageData) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![
                Part::Text { text: OCR_PROMPT },
                Part::Inline {
                    inline_data: InlineData {
                        mime_type: image.format.mime_type(),
                        data: STANDARD.encode(&image.data),
                    },
                },
            ],
        }],
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: GenerateResponse) -> Result<String, BackendError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::Recognition("Gemini returned no candidates".into()))?;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    Ok(text)
}

impl TextRecognizer for GeminiRecognizer {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn recognize_text(&self, image: &ImageData) -> Result<String, BackendError> {
        let request = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key);
        let response: GenerateResponse =
            post_json(request, &build_request(image), "Gemini", self.timeout_secs)?;
        let text = response_text(response)?;
        tracing::debug!(model = %self.model, chars = text.len(), "gemini recognized image");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::ImageFormat;

    #[test]
    fn request_carries_prompt_and_inline_image() {
        let image = ImageData {
            data: b"hi".to_vec(),
            format: ImageFormat::Jpeg,
        };
        let json = serde_json::to_value(build_request(&image)).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], OCR_PROMPT);
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "aGk=");
    }

    #[test]
    fn response_parts_are_joined() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello "},{"text":"world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(response).unwrap(), "Hello world");
    }

    #[test]
    fn missing_candidates_is_an_error() {
        let response: GenerateResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        assert!(matches!(
            response_text(response),
            Err(BackendError::Recognition(_))
        ));
    }

    #[test]
    fn endpoint_uses_model_name() {
        let engine = GeminiRecognizer::new("k", "gemini-2.5-flash", 5)
            .unwrap()
            .with_base_url("http://localhost:9000/v1beta/");
        assert_eq!(
            engine.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(!format!("{engine:?}").contains("\"k\""));
    }
}
