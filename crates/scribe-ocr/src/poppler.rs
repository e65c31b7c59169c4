//! Page rendering through poppler's `pdftoppm` and `pdfinfo`.

use std::io::Write as _;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use scribe_core::{BackendError, ImageData, PageRasterizer};

use crate::command::{ToolVersion, probe_tool, run};

static PAGES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^Pages:\s+(\d+)\s*$").unwrap());

/// PDF points per inch; a render scale of 1.0 is 72 DPI.
const POINTS_PER_INCH: f32 = 72.0;

#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    pdftoppm: String,
    pdfinfo: String,
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm", "pdfinfo")
    }
}

impl PopplerRasterizer {
    pub fn new(pdftoppm: impl Into<String>, pdfinfo: impl Into<String>) -> Self {
        Self {
            pdftoppm: pdftoppm.into(),
            pdfinfo: pdfinfo.into(),
        }
    }

    /// Check both binaries are installed. Returns the `pdftoppm` banner.
    pub fn probe(&self) -> Result<ToolVersion, BackendError> {
        probe_tool(&self.pdfinfo, "-v")?;
        probe_tool(&self.pdftoppm, "-v")
    }

    fn write_input(dir: &Path, pdf: &[u8]) -> Result<String, BackendError> {
        let path = dir.join("input.pdf");
        let mut file = std::fs::File::create(&path)?;
        file.write_all(pdf)?;
        file.flush()?;
        Ok(path.to_string_lossy().into_owned())
    }
}

/// `pdftoppm` resolution for a linear scale.
pub fn scale_to_dpi(scale: f32) -> u32 {
    (scale * POINTS_PER_INCH).round().max(1.0) as u32
}

/// Pull the page count out of `pdfinfo` output.
pub fn parse_page_count(pdfinfo_output: &str) -> Option<usize> {
    PAGES_RE
        .captures(pdfinfo_output)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

impl PageRasterizer for PopplerRasterizer {
    fn name(&self) -> &'static str {
        "pdftoppm"
    }

    fn page_count(&self, pdf: &[u8]) -> Result<usize, BackendError> {
        let dir = tempfile::TempDir::with_prefix("scribe-pdfinfo")?;
        let input = Self::write_input(dir.path(), pdf)?;
        let output = run(&self.pdfinfo, [input.as_str()])?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_page_count(&stdout)
            .ok_or_else(|| BackendError::Open("pdfinfo did not report a page count".into()))
    }

    fn rasterize_page(
        &self,
        pdf: &[u8],
        page_index: usize,
        scale: f32,
    ) -> Result<ImageData, BackendError> {
        let dir = tempfile::TempDir::with_prefix("scribe-pdftoppm")?;
        let input = Self::write_input(dir.path(), pdf)?;
        let prefix = dir.path().join("page");
        let page = (page_index + 1).to_string();
        let dpi = scale_to_dpi(scale).to_string();
        let prefix_arg = prefix.to_string_lossy().into_owned();

        run(
            &self.pdftoppm,
            [
                "-f",
                page.as_str(),
                "-l",
                page.as_str(),
                "-r",
                dpi.as_str(),
                "-png",
                "-singlefile",
                input.as_str(),
                prefix_arg.as_str(),
            ],
        )
        .map_err(|e| match e {
            BackendError::Extraction(message) => BackendError::Render {
                page: page_index + 1,
                message,
            },
            other => other,
        })?;

        let png = std::fs::read(prefix.with_extension("png"))?;
        tracing::debug!(page = page_index + 1, dpi = %dpi, bytes = png.len(), "page rendered");
        Ok(ImageData::png(png))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_parsed_from_pdfinfo() {
        let out = "Title:          Report\nProducer:       LaTeX\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(out), Some(12));
        assert_eq!(parse_page_count("Title: x\n"), None);
    }

    #[test]
    fn dpi_follows_scale() {
        assert_eq!(scale_to_dpi(1.0), 72);
        assert_eq!(scale_to_dpi(2.0), 144);
        assert_eq!(scale_to_dpi(0.0), 1);
    }

    #[test]
    fn missing_tools_report_not_installed() {
        let raster = PopplerRasterizer::new("scribe-missing-pdftoppm", "scribe-missing-pdfinfo");
        assert!(matches!(raster.probe(), Err(BackendError::NotInstalled(_))));
        assert!(matches!(
            raster.page_count(b"%PDF-1.4"),
            Err(BackendError::NotInstalled(_))
        ));
    }
}
