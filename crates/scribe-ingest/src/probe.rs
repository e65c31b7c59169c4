//! Runtime capability detection.
//!
//! Compiled-in backends are selected by cargo features; external tools and
//! hosted services are checked once here. Nothing downstream needs to know
//! which optional pieces exist.

use std::sync::Arc;

use scribe_core::{
    BackendError, Config, EmbeddedTextReader, ExtractionStrategy, OcrEngine, PageRasterizer,
    TextRecognizer,
};
use scribe_ocr::{PopplerRasterizer, TesseractRecognizer};

/// Why a capability is absent and how to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Missing {
    pub reason: String,
    pub remediation: String,
}

impl Missing {
    pub fn new(reason: impl Into<String>, remediation: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            remediation: remediation.into(),
        }
    }
}

/// A PDF library able to both read text and render pages.
#[derive(Clone)]
pub struct Renderer {
    pub reader: Arc<dyn EmbeddedTextReader>,
    pub rasterizer: Arc<dyn PageRasterizer>,
}

/// Everything the environment offers, before ordering into a plan.
#[derive(Clone)]
pub struct Capabilities {
    pub recognizer: Result<Arc<dyn TextRecognizer>, Missing>,
    pub renderer: Result<Renderer, Missing>,
    pub text_reader: Result<Arc<dyn EmbeddedTextReader>, Missing>,
    pub rasterizer: Result<Arc<dyn PageRasterizer>, Missing>,
    pub hosted: Result<Arc<dyn ExtractionStrategy>, Missing>,
}

const TESSERACT_HINT: &str = "install tesseract (e.g. `apt install tesseract-ocr` or `brew install tesseract`), \
     or set SCRIBE_OCR_ENGINE to gemini/mistral with an API key";
const POPPLER_HINT: &str = "install poppler (e.g. `apt install poppler-utils`), which provides pdftoppm and pdfinfo";
#[cfg(not(feature = "mupdf"))]
const MUPDF_HINT: &str = "rebuild with the `mupdf` feature (cargo build --features mupdf)";
#[cfg(not(feature = "lopdf"))]
const TEXT_READER_HINT: &str = "rebuild with the `mupdf` or `lopdf` feature";
#[cfg(not(feature = "hosted"))]
const HOSTED_HINT: &str = "rebuild with the `hosted` feature";
#[cfg(feature = "hosted")]
const MISTRAL_KEY_HINT: &str = "set MISTRAL_API_KEY (or api_keys.mistral_key in .scribe.toml)";
#[cfg(feature = "hosted")]
const GEMINI_KEY_HINT: &str = "set GEMINI_API_KEY (or api_keys.gemini_key in .scribe.toml)";

fn tool_missing(err: BackendError, hint: &str) -> Missing {
    Missing::new(err.to_string(), hint)
}

/// Probe the environment described by `config`.
pub fn probe(config: &Config) -> Capabilities {
    let renderer = probe_renderer();
    let text_reader = probe_text_reader(&renderer);

    let poppler = PopplerRasterizer::new(&config.pdftoppm_cmd, &config.pdfinfo_cmd);
    let rasterizer = match poppler.probe() {
        Ok(version) => {
            tracing::debug!(version = %version.0, "poppler available");
            Ok(Arc::new(poppler) as Arc<dyn PageRasterizer>)
        }
        Err(err) => match &renderer {
            // Fall back to MuPDF rendering when poppler is absent.
            Ok(r) => {
                tracing::debug!(error = %err, "poppler unavailable, rasterizing with mupdf");
                Ok(r.rasterizer.clone())
            }
            Err(_) => Err(tool_missing(err, POPPLER_HINT)),
        },
    };

    Capabilities {
        recognizer: probe_recognizer(config),
        renderer,
        text_reader,
        rasterizer,
        hosted: probe_hosted(config),
    }
}

fn probe_recognizer(config: &Config) -> Result<Arc<dyn TextRecognizer>, Missing> {
    match config.ocr_engine {
        OcrEngine::Tesseract => {
            let engine = TesseractRecognizer::new(&config.tesseract_cmd, &config.ocr_language);
            match engine.probe() {
                Ok(version) => {
                    tracing::debug!(version = %version.0, "tesseract available");
                    Ok(Arc::new(engine))
                }
                Err(err) => Err(tool_missing(err, TESSERACT_HINT)),
            }
        }
        OcrEngine::Gemini => gemini(config),
        OcrEngine::Mistral => mistral(config).map(|m| m as Arc<dyn TextRecognizer>),
    }
}

#[cfg(feature = "mupdf")]
fn probe_renderer() -> Result<Renderer, Missing> {
    let backend = Arc::new(scribe_pdf_mupdf::MupdfBackend::new());
    Ok(Renderer {
        reader: backend.clone(),
        rasterizer: backend,
    })
}

#[cfg(not(feature = "mupdf"))]
fn probe_renderer() -> Result<Renderer, Missing> {
    Err(Missing::new("MuPDF support not compiled in", MUPDF_HINT))
}

fn probe_text_reader(renderer: &Result<Renderer, Missing>) -> Result<Arc<dyn EmbeddedTextReader>, Missing> {
    if let Ok(r) = renderer {
        return Ok(r.reader.clone());
    }
    lopdf_reader()
}

#[cfg(feature = "lopdf")]
fn lopdf_reader() -> Result<Arc<dyn EmbeddedTextReader>, Missing> {
    Ok(Arc::new(scribe_pdf_lopdf::LopdfBackend::new()))
}

#[cfg(not(feature = "lopdf"))]
fn lopdf_reader() -> Result<Arc<dyn EmbeddedTextReader>, Missing> {
    Err(Missing::new("no PDF text reader compiled in", TEXT_READER_HINT))
}

fn probe_hosted(config: &Config) -> Result<Arc<dyn ExtractionStrategy>, Missing> {
    mistral(config).map(|m| m as Arc<dyn ExtractionStrategy>)
}

#[cfg(feature = "hosted")]
fn gemini(config: &Config) -> Result<Arc<dyn TextRecognizer>, Missing> {
    let key = config
        .gemini_key
        .as_deref()
        .ok_or_else(|| Missing::new("no Gemini API key configured", GEMINI_KEY_HINT))?;
    let mut engine =
        scribe_vision::GeminiRecognizer::new(key, &config.gemini_model, config.hosted_timeout_secs)
            .map_err(|e| Missing::new(e.to_string(), GEMINI_KEY_HINT))?;
    if let Some(url) = &config.gemini_base_url {
        engine = engine.with_base_url(url);
    }
    Ok(Arc::new(engine))
}

#[cfg(feature = "hosted")]
fn mistral(config: &Config) -> Result<Arc<scribe_vision::MistralOcr>, Missing> {
    let key = config
        .mistral_key
        .as_deref()
        .ok_or_else(|| Missing::new("no Mistral API key configured", MISTRAL_KEY_HINT))?;
    let mut ocr =
        scribe_vision::MistralOcr::new(key, &config.mistral_model, config.hosted_timeout_secs)
            .map_err(|e| Missing::new(e.to_string(), MISTRAL_KEY_HINT))?;
    if let Some(url) = &config.mistral_base_url {
        ocr = ocr.with_base_url(url);
    }
    Ok(Arc::new(ocr))
}

#[cfg(not(feature = "hosted"))]
fn gemini(_config: &Config) -> Result<Arc<dyn TextRecognizer>, Missing> {
    Err(Missing::new("hosted engines not compiled in", HOSTED_HINT))
}

#[cfg(not(feature = "hosted"))]
fn mistral(_config: &Config) -> Result<Arc<NoHosted>, Missing> {
    Err(Missing::new("hosted engines not compiled in", HOSTED_HINT))
}

/// Stand-in type so the signatures line up when `hosted` is off; never
/// constructed.
#[cfg(not(feature = "hosted"))]
struct NoHosted;

#[cfg(not(feature = "hosted"))]
impl TextRecognizer for NoHosted {
    fn name(&self) -> &'static str {
        "none"
    }
    fn recognize_text(&self, _image: &scribe_core::ImageData) -> Result<String, BackendError> {
        Err(BackendError::NotInstalled("hosted engines".into()))
    }
}

#[cfg(not(feature = "hosted"))]
impl ExtractionStrategy for NoHosted {
    fn kind(&self) -> scribe_core::StrategyKind {
        scribe_core::StrategyKind::HostedOcr
    }
    fn extract(&self, _pdf: &[u8]) -> Result<Vec<scribe_core::PageText>, BackendError> {
        Err(BackendError::NotInstalled("hosted engines".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> Config {
        Config {
            tesseract_cmd: "scribe-missing-tesseract".into(),
            pdftoppm_cmd: "scribe-missing-pdftoppm".into(),
            pdfinfo_cmd: "scribe-missing-pdfinfo".into(),
            ..Config::default()
        }
    }

    #[test]
    fn missing_tesseract_is_reported_with_hint() {
        let caps = probe(&offline_config());
        let Err(missing) = caps.recognizer else {
            panic!("recognizer should be missing");
        };
        assert!(missing.reason.contains("scribe-missing-tesseract"));
        assert!(missing.remediation.contains("install tesseract"));
    }

    #[test]
    fn hosted_requires_mistral_key() {
        let caps = probe(&offline_config());
        assert!(caps.hosted.is_err());
    }

    #[test]
    fn gemini_engine_requires_key() {
        let config = Config {
            ocr_engine: OcrEngine::Gemini,
            ..offline_config()
        };
        let caps = probe(&config);
        assert!(caps.recognizer.is_err());
    }

    #[cfg(feature = "hosted")]
    #[test]
    fn mistral_uses_configured_base_url() {
        let config = Config {
            mistral_key: Some("m-key".into()),
            mistral_base_url: Some("http://localhost:8080/v1/".into()),
            ..offline_config()
        };
        let ocr = mistral(&config).unwrap();
        let debug = format!("{ocr:?}");
        assert!(debug.contains("http://localhost:8080/v1\""), "got: {debug}");
        assert!(!debug.contains("m-key"));
        assert!(probe(&config).hosted.is_ok());
    }

    #[cfg(feature = "mupdf")]
    #[test]
    fn mupdf_rasterizes_when_poppler_missing() {
        let caps = probe(&offline_config());
        assert!(caps.renderer.is_ok());
        assert_eq!(caps.rasterizer.unwrap().name(), "mupdf");
        assert_eq!(caps.text_reader.unwrap().name(), "mupdf");
    }

    #[cfg(not(feature = "mupdf"))]
    #[test]
    fn without_mupdf_poppler_is_required() {
        let caps = probe(&offline_config());
        assert!(caps.renderer.is_err());
        let Err(missing) = caps.rasterizer else {
            panic!("rasterizer should be missing");
        };
        assert!(missing.remediation.contains("poppler"));
    }
}
