use std::io::Cursor;

use mupdf::{Colorspace, Document, Matrix, TextPageFlags};

use scribe_core::{BackendError, EmbeddedTextReader, ImageData, PageRasterizer};

/// MuPDF-based implementation of [`EmbeddedTextReader`] and [`PageRasterizer`].
///
/// This crate is the sole AGPL island: it isolates the mupdf dependency
/// (which is AGPL-3.0) so builds without the `mupdf` feature do not
/// transitively depend on it.
///
/// Each call opens a fresh document from the given bytes; nothing is cached
/// between calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct MupdfBackend;

/// Upper bound on the render scale, so a bad caller cannot allocate a
/// gigapixel page.
const MAX_SCALE: f32 = 8.0;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }

    fn open(pdf: &[u8]) -> Result<Document, BackendError> {
        Document::from_bytes(pdf, "application/pdf").map_err(|e| BackendError::Open(e.to_string()))
    }
}

impl EmbeddedTextReader for MupdfBackend {
    fn name(&self) -> &'static str {
        "mupdf"
    }

    fn extract_embedded_text(&self, pdf: &[u8]) -> Result<Vec<String>, BackendError> {
        let document = Self::open(pdf)?;
        let mut pages_text = Vec::new();

        for page_result in document
            .pages()
            .map_err(|e| BackendError::Extraction(e.to_string()))?
        {
            let page = page_result.map_err(|e| BackendError::Extraction(e.to_string()))?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(|e| BackendError::Extraction(e.to_string()))?;

            // Block/line iteration keeps reading order and line breaks.
            let mut page_text = String::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    page_text.push_str(&line_text);
                    page_text.push('\n');
                }
            }
            pages_text.push(page_text);
        }

        tracing::debug!(pages = pages_text.len(), "mupdf text layer read");
        Ok(pages_text)
    }
}

impl PageRasterizer for MupdfBackend {
    fn name(&self) -> &'static str {
        "mupdf"
    }

    fn page_count(&self, pdf: &[u8]) -> Result<usize, BackendError> {
        let document = Self::open(pdf)?;
        let count = document
            .page_count()
            .map_err(|e| BackendError::Open(e.to_string()))?;
        Ok(count.max(0) as usize)
    }

    fn rasterize_page(
        &self,
        pdf: &[u8],
        page_index: usize,
        scale: f32,
    ) -> Result<ImageData, BackendError> {
        let render_err = |message: String| BackendError::Render {
            page: page_index + 1,
            message,
        };

        let document = Self::open(pdf)?;
        let page = document
            .load_page(page_index as i32)
            .map_err(|e| render_err(e.to_string()))?;

        let scale = scale.clamp(0.1, MAX_SCALE);
        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();
        let pixmap = page
            .to_pixmap(&matrix, &colorspace, false, true)
            .map_err(|e| render_err(e.to_string()))?;

        let png = encode_png(
            pixmap.width() as u32,
            pixmap.height() as u32,
            pixmap.n() as usize,
            pixmap.samples(),
        )
        .map_err(render_err)?;

        tracing::debug!(
            page = page_index + 1,
            scale,
            width = pixmap.width(),
            height = pixmap.height(),
            "page rendered"
        );
        Ok(ImageData::png(png))
    }
}

/// Encode interleaved pixmap samples (`n` components per pixel, RGB first)
/// as an RGB PNG.
fn encode_png(width: u32, height: u32, n: usize, samples: &[u8]) -> Result<Vec<u8>, String> {
    if n < 3 {
        return Err(format!("unexpected pixmap with {n} components"));
    }
    let pixels = (width as usize) * (height as usize);
    let mut rgb = Vec::with_capacity(pixels * 3);
    for chunk in samples.chunks_exact(n).take(pixels) {
        rgb.extend_from_slice(&chunk[..3]);
    }

    let img = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| "pixmap smaller than its dimensions".to_string())?;

    let mut output = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| e.to_string())?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_png_drops_alpha() {
        // 2x1 RGBA pixmap
        let samples = [255, 0, 0, 255, 0, 255, 0, 128];
        let png = encode_png(2, 1, 4, &samples).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(decoded.get_pixel(1, 0).0, [0, 255, 0]);
    }

    #[test]
    fn encode_png_rejects_short_buffers() {
        assert!(encode_png(4, 4, 3, &[0u8; 6]).is_err());
        assert!(encode_png(1, 1, 1, &[0u8; 1]).is_err());
    }

    #[test]
    fn garbage_bytes_fail_to_open() {
        let backend = MupdfBackend::new();
        assert!(backend.extract_embedded_text(b"not a pdf").is_err());
    }

    /// Build a US Letter PDF with one page per entry; `None` pages have no text.
    fn make_test_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        use lopdf::{Object, Stream, dictionary};

        let mut doc = lopdf::Document::with_version("1.4");
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
    fn text_layer_per_page() {
        let pdf = make_test_pdf(&[Some("Hello World"), None, Some("Third Page")]);
        let pages = MupdfBackend::new().extract_embedded_text(&pdf).unwrap();

        assert_eq!(pages.len(), 3);
        assert!(pages[0].contains("Hello World"), "got: {:?}", pages[0]);
        assert!(pages[1].trim().is_empty(), "got: {:?}", pages[1]);
        assert!(pages[2].contains("Third Page"), "got: {:?}", pages[2]);
    }

    #[test]
    fn page_count_matches() {
        let pdf = make_test_pdf(&[None, Some("x"), None]);
        assert_eq!(PageRasterizer::page_count(&MupdfBackend::new(), &pdf).unwrap(), 3);
    }

    #[test]
    fn rasterize_scales_page_dimensions() {
        let pdf = make_test_pdf(&[Some("Scaled")]);
        let image = MupdfBackend::new().rasterize_page(&pdf, 0, 2.0).unwrap();
        assert_eq!(image.format, scribe_core::ImageFormat::Png);

        let decoded = image::load_from_memory(&image.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1224, 1584));
    }

    #[test]
    fn rasterize_out_of_range_page_fails() {
        let pdf = make_test_pdf(&[Some("only page")]);
        let err = MupdfBackend::new().rasterize_page(&pdf, 5, 1.0).unwrap_err();
        assert!(matches!(err, BackendError::Render { page: 6, .. }), "got: {err:?}");
    }
}
