//! The ordered-fallback document text extractor.

use std::fmt;
use std::sync::Arc;

use crate::backend::TextRecognizer;
use crate::strategy::{ExtractionStrategy, PageText, StrategyKind};
use crate::{Document, ExtractError};

/// Name used for the image-recognition capability in diagnostics.
pub const IMAGE_OCR: &str = "image-ocr";

/// Shown when nothing was filtered out at startup but every strategy still
/// came up empty.
pub const DEFAULT_REMEDIATION: &str = "the PDF may be scanned, encrypted or damaged; configure an OCR engine \
     (install tesseract, or set GEMINI_API_KEY / MISTRAL_API_KEY) and enable the `mupdf` feature";

/// A capability that was probed at startup and found missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unavailable {
    /// Strategy id (`native-ocr`, ...) or [`IMAGE_OCR`].
    pub name: String,
    pub reason: String,
    /// What the operator can do to make it available.
    pub remediation: String,
}

impl Unavailable {
    pub fn strategy(kind: StrategyKind, reason: impl Into<String>, remediation: impl Into<String>) -> Self {
        Self {
            name: kind.id().to_string(),
            reason: reason.into(),
            remediation: remediation.into(),
        }
    }

    pub fn recognizer(reason: impl Into<String>, remediation: impl Into<String>) -> Self {
        Self {
            name: IMAGE_OCR.to_string(),
            reason: reason.into(),
            remediation: remediation.into(),
        }
    }
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.name, self.reason, self.remediation)
    }
}

/// How a single strategy attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Returned pages, but every page was blank.
    Empty,
    /// Raised an error.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub kind: StrategyKind,
    pub outcome: Outcome,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Empty => write!(f, "{} (no text)", self.kind),
            Outcome::Failed(msg) => write!(f, "{} (failed: {})", self.kind, msg),
        }
    }
}

/// Everything known about a failed PDF extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureReport {
    pub attempts: Vec<Attempt>,
    pub unavailable: Vec<Unavailable>,
}

impl FailureReport {
    /// Remediation steps, never empty.
    pub fn remediation(&self) -> Vec<String> {
        let steps: Vec<String> = self
            .unavailable
            .iter()
            .filter(|u| u.name != IMAGE_OCR)
            .map(|u| format!("{}: {}", u.name, u.remediation))
            .collect();
        if steps.is_empty() {
            vec![DEFAULT_REMEDIATION.to_string()]
        } else {
            steps
        }
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unable to extract text from PDF.")?;
        if self.attempts.is_empty() {
            write!(f, " No extraction strategy is available.")?;
        } else {
            let tried: Vec<String> = self.attempts.iter().map(|a| a.to_string()).collect();
            write!(f, " Tried: {}.", tried.join(", "))?;
        }
        write!(f, " To enable more strategies:")?;
        for (i, step) in self.remediation().iter().enumerate() {
            write!(f, "\n{}. {}", i + 1, step)?;
        }
        Ok(())
    }
}

/// Format pages as `--- Page <n> ---` sections and trim the result.
pub fn format_pages(pages: &[PageText]) -> String {
    let mut out = String::new();
    for page in pages {
        out.push_str(&format!("\n--- Page {} ---\n{}", page.number, page.text));
    }
    out.trim().to_string()
}

/// Run `strategies` in order against a PDF and return the first usable result.
///
/// A strategy error or an all-blank result is recorded and the next strategy
/// is tried. `unavailable` only feeds the failure report.
pub fn extract_pdf(
    pdf: &[u8],
    strategies: &[Arc<dyn ExtractionStrategy>],
    unavailable: &[Unavailable],
) -> Result<String, ExtractError> {
    let mut attempts = Vec::with_capacity(strategies.len());

    for strategy in strategies {
        let kind = strategy.kind();
        tracing::debug!(strategy = %kind, "trying strategy");

        match strategy.extract(pdf) {
            Ok(pages) if pages.iter().any(|p| !p.is_blank()) => {
                tracing::info!(strategy = %kind, pages = pages.len(), "strategy succeeded");
                return Ok(format_pages(&pages));
            }
            Ok(pages) => {
                tracing::warn!(strategy = %kind, pages = pages.len(), "strategy produced no text");
                attempts.push(Attempt {
                    kind,
                    outcome: Outcome::Empty,
                });
            }
            Err(err) => {
                tracing::warn!(strategy = %kind, error = %err, "strategy failed");
                attempts.push(Attempt {
                    kind,
                    outcome: Outcome::Failed(err.to_string()),
                });
            }
        }
    }

    Err(ExtractError::ExtractionFailed(FailureReport {
        attempts,
        unavailable: unavailable.to_vec(),
    }))
}

/// `extract(document, strategies) -> text`.
///
/// Images go to `recognizer` and any recognition error is returned as is.
/// PDFs go through the fallback chain.
pub fn extract(
    document: &Document,
    recognizer: Option<&dyn TextRecognizer>,
    strategies: &[Arc<dyn ExtractionStrategy>],
) -> Result<String, ExtractError> {
    Extractor::run(document, recognizer, strategies, &[])
}

/// An immutable extraction plan: the image recognizer plus the ordered list
/// of available PDF strategies, built once at startup.
#[derive(Default)]
pub struct Extractor {
    recognizer: Option<Arc<dyn TextRecognizer>>,
    strategies: Vec<Arc<dyn ExtractionStrategy>>,
    unavailable: Vec<Unavailable>,
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("recognizer", &self.recognizer.as_ref().map(|r| r.name()))
            .field("strategies", &self.strategy_kinds())
            .field("unavailable", &self.unavailable)
            .finish()
    }
}

impl Extractor {
    pub fn builder() -> ExtractorBuilder {
        ExtractorBuilder::default()
    }

    pub fn strategy_kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    pub fn unavailable(&self) -> &[Unavailable] {
        &self.unavailable
    }

    pub fn recognizer_name(&self) -> Option<&'static str> {
        self.recognizer.as_ref().map(|r| r.name())
    }

    pub fn extract(&self, document: &Document) -> Result<String, ExtractError> {
        Self::run(
            document,
            self.recognizer.as_deref(),
            &self.strategies,
            &self.unavailable,
        )
    }

    fn run(
        document: &Document,
        recognizer: Option<&dyn TextRecognizer>,
        strategies: &[Arc<dyn ExtractionStrategy>],
        unavailable: &[Unavailable],
    ) -> Result<String, ExtractError> {
        tracing::debug!(file = %document.filename, kind = %document.kind, bytes = document.data.len(), "extracting");
        match document.as_image() {
            None => extract_pdf(&document.data, strategies, unavailable),
            Some(image) => {
                let Some(recognizer) = recognizer else {
                    let missing = unavailable
                        .iter()
                        .find(|u| u.name == IMAGE_OCR)
                        .cloned()
                        .unwrap_or_else(|| {
                            Unavailable::recognizer("no OCR engine configured", DEFAULT_REMEDIATION)
                        });
                    return Err(ExtractError::StrategyUnavailable(missing));
                };
                let text = recognizer
                    .recognize_text(&image)
                    .map_err(ExtractError::Recognition)?;
                Ok(text.trim().to_string())
            }
        }
    }
}

/// Builder for [`Extractor`]. Strategies run in the order they are added.
#[derive(Default)]
pub struct ExtractorBuilder {
    inner: Extractor,
}

impl ExtractorBuilder {
    pub fn recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.inner.recognizer = Some(recognizer);
        self
    }

    pub fn strategy(mut self, strategy: Arc<dyn ExtractionStrategy>) -> Self {
        self.inner.strategies.push(strategy);
        self
    }

    pub fn unavailable(mut self, missing: Unavailable) -> Self {
        self.inner.unavailable.push(missing);
        self
    }

    pub fn build(self) -> Extractor {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockRecognizer, MockStrategy};

    fn pdf() -> Document {
        Document::from_upload("doc.pdf", b"%PDF-1.4".to_vec()).unwrap()
    }

    fn png() -> Document {
        Document::from_upload("scan.png", vec![0x89, b'P', b'N', b'G']).unwrap()
    }

    #[test]
    fn image_text_is_trimmed() {
        let extractor = Extractor::builder()
            .recognizer(Arc::new(MockRecognizer::text("\n  hello world \n")))
            .build();
        assert_eq!(extractor.extract(&png()).unwrap(), "hello world");
    }

    #[test]
    fn image_recognition_error_is_fatal() {
        let strategy = Arc::new(MockStrategy::pages(StrategyKind::TextLayer, &["unused"]));
        let extractor = Extractor::builder()
            .recognizer(Arc::new(MockRecognizer::failing("engine crashed")))
            .strategy(strategy.clone())
            .build();
        let err = extractor.extract(&png()).unwrap_err();
        assert!(matches!(err, ExtractError::Recognition(_)));
        assert_eq!(strategy.call_count(), 0);
    }

    #[test]
    fn image_without_recognizer_is_unavailable() {
        let extractor = Extractor::builder()
            .unavailable(Unavailable::recognizer("tesseract missing", "install tesseract"))
            .build();
        match extractor.extract(&png()).unwrap_err() {
            ExtractError::StrategyUnavailable(u) => {
                assert_eq!(u.name, IMAGE_OCR);
                assert_eq!(u.remediation, "install tesseract");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn first_successful_strategy_wins() {
        let a = Arc::new(MockStrategy::pages(StrategyKind::NativeOcr, &["alpha"]));
        let b = Arc::new(MockStrategy::pages(StrategyKind::TextLayer, &["beta"]));
        let extractor = Extractor::builder().strategy(a.clone()).strategy(b.clone()).build();

        assert_eq!(extractor.extract(&pdf()).unwrap(), "--- Page 1 ---\nalpha");
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 0);
    }

    #[test]
    fn blank_output_falls_through() {
        let a = Arc::new(MockStrategy::pages(StrategyKind::TextLayer, &["  ", "\n"]));
        let b = Arc::new(MockStrategy::pages(StrategyKind::RasterOcr, &["ocr text"]));
        let extractor = Extractor::builder().strategy(a.clone()).strategy(b.clone()).build();

        assert_eq!(extractor.extract(&pdf()).unwrap(), "--- Page 1 ---\nocr text");
        assert_eq!(a.call_count(), 1);
        assert_eq!(b.call_count(), 1);
    }

    #[test]
    fn failure_report_lists_attempts_and_remediation() {
        let extractor = Extractor::builder()
            .strategy(Arc::new(MockStrategy::failing(StrategyKind::NativeOcr, "boom")))
            .strategy(Arc::new(MockStrategy::pages(StrategyKind::TextLayer, &[""])))
            .unavailable(Unavailable::strategy(
                StrategyKind::RasterOcr,
                "pdftoppm not found",
                "install poppler-utils",
            ))
            .build();

        let err = extractor.extract(&pdf()).unwrap_err();
        let ExtractError::ExtractionFailed(report) = &err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.attempts[0].outcome, Outcome::Failed("failed to extract text: boom".into()));
        assert_eq!(report.attempts[1].outcome, Outcome::Empty);

        let msg = err.to_string();
        assert!(msg.contains("native-ocr (failed"));
        assert!(msg.contains("text-layer (no text)"));
        assert!(msg.contains("raster-ocr: install poppler-utils"));
    }

    #[test]
    fn empty_plan_still_names_a_remediation() {
        let err = Extractor::default().extract(&pdf()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No extraction strategy is available"));
        assert!(msg.contains(DEFAULT_REMEDIATION));
    }

    #[test]
    fn pages_are_labeled_in_order() {
        let pages = vec![
            PageText::new(1, "one"),
            PageText::new(2, "two"),
            PageText::new(3, "three"),
        ];
        assert_eq!(
            format_pages(&pages),
            "--- Page 1 ---\none\n--- Page 2 ---\ntwo\n--- Page 3 ---\nthree"
        );
    }

    #[test]
    fn free_function_matches_extractor() {
        let strategies: Vec<Arc<dyn ExtractionStrategy>> =
            vec![Arc::new(MockStrategy::pages(StrategyKind::TextLayer, &["x"]))];
        assert_eq!(extract(&pdf(), None, &strategies).unwrap(), "--- Page 1 ---\nx");
    }
}
