//! Engines backed by command-line tools found on `PATH`.
//!
//! - [`TesseractRecognizer`]: image-to-text via the `tesseract` CLI.
//! - [`PopplerRasterizer`]: PDF page rendering via `pdftoppm`, page counts
//!   via `pdfinfo`.
//!
//! Every engine has a `probe` method used at startup to decide whether the
//! strategies depending on it are available.

mod command;
pub mod poppler;
pub mod tesseract;

pub use command::{ToolVersion, probe_tool};
pub use poppler::PopplerRasterizer;
pub use tesseract::TesseractRecognizer;
