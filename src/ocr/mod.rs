//! OCR engine driver (component C1): the external OCR tool contract and PDF
//! rasterization it depends on.

pub mod backend;
pub mod raster;
pub mod tesseract;

pub use backend::{CharWhitelist, EngineMode, OcrBackend, OcrError, OcrRunConfig, Psm, WordBox};
pub use raster::Rasterizer;
pub use tesseract::TesseractBackend;
