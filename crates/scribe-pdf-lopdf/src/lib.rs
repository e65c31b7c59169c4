use lopdf::Document;

use scribe_core::{BackendError, EmbeddedTextReader};

/// Pure-Rust text-layer reader backed by lopdf.
///
/// Reads only what the PDF already carries as text; scanned pages come back
/// empty. Pages that fail to decode are returned empty instead of failing the
/// whole document.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl EmbeddedTextReader for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract_embedded_text(&self, pdf: &[u8]) -> Result<Vec<String>, BackendError> {
        let document = Document::load_mem(pdf).map_err(|e| BackendError::Open(e.to_string()))?;
        if document.is_encrypted() {
            return Err(BackendError::Open("document is encrypted".into()));
        }

        // get_pages() is keyed by 1-based page number, in order.
        let pages = document.get_pages();
        let mut texts = Vec::with_capacity(pages.len());
        for &number in pages.keys() {
            match document.extract_text(&[number]) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    tracing::debug!(page = number, error = %e, "lopdf could not decode page text");
                    texts.push(String::new());
                }
            }
        }
        Ok(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Object, Stream, dictionary};

    /// Build a PDF with one page per entry; `None` pages have no text.
    fn make_test_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids = Vec::new();
        for text in pages {
            let content = match text {
                Some(t) => format!("BT /F1 12 Tf 100 700 Td ({t}) Tj ET"),
                None => String::new(),
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn reads_text_per_page() {
        let pdf = make_test_pdf(&[Some("Hello World"), Some("Second Page")]);
        let pages = LopdfBackend::new().extract_embedded_text(&pdf).unwrap();

        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("Hello"), "got: {:?}", pages[0]);
        assert!(pages[1].contains("Second"), "got: {:?}", pages[1]);
    }

    #[test]
    fn textless_page_is_blank() {
        let pdf = make_test_pdf(&[None]);
        let pages = LopdfBackend::new().extract_embedded_text(&pdf).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].trim().is_empty());
    }

    #[test]
    fn one_entry_per_page() {
        let pdf = make_test_pdf(&[None, Some("x"), None]);
        let pages = LopdfBackend::new().extract_embedded_text(&pdf).unwrap();
        assert_eq!(pages.len(), 3);
        assert!(pages[1].contains('x'), "got: {:?}", pages[1]);
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let result = LopdfBackend::new().extract_embedded_text(b"not a pdf");
        assert!(matches!(result, Err(BackendError::Open(_))));
    }
}
