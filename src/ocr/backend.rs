//! OCR backend abstraction: the external OCR tool contract from spec §6.

use std::path::Path;
use thiserror::Error;

/// Errors surfaced by an OCR backend.
///
/// Per spec §7, `BackendUnavailable` and `RasterizationFailed` are never
/// propagated past the pipeline boundary — callers treat them as "no text
/// extracted" rather than aborting the batch.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR backend not available: {0}")]
    BackendUnavailable(String),

    #[error("OCR run failed: {0}")]
    RunFailed(String),

    #[error("PDF rasterization failed: {0}")]
    RasterizationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// OCR engine mode (OEM), per spec GLOSSARY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// OEM 0 — legacy engine.
    Legacy,
    /// OEM 1 — LSTM neural-net engine.
    Lstm,
}

impl EngineMode {
    pub fn oem_value(&self) -> &'static str {
        match self {
            Self::Legacy => "0",
            Self::Lstm => "1",
        }
    }
}

/// Page segmentation mode (PSM), per spec GLOSSARY. Only the modes the spec
/// actually uses (6, 7, 8, 10, 13) are represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Psm {
    SingleBlock = 6,
    SingleLine = 7,
    SingleWord = 8,
    SingleChar = 10,
    RawLine = 13,
}

impl Psm {
    pub fn value(&self) -> u8 {
        *self as u8
    }
}

/// A restricted character alphabet for whitelisted OCR runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharWhitelist {
    LettersOnly,
    AlphanumericAndDash,
    DigitsOnly,
}

impl CharWhitelist {
    pub fn chars(&self) -> &'static str {
        match self {
            Self::LettersOnly => "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz ",
            Self::AlphanumericAndDash => {
                "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789- "
            }
            Self::DigitsOnly => "0123456789-",
        }
    }
}

/// One OCR invocation's configuration: engine mode, page-segmentation mode,
/// and an optional character whitelist (spec §6's "two knobs" plus whitelisting).
#[derive(Debug, Clone, Copy)]
pub struct OcrRunConfig {
    pub engine: EngineMode,
    pub psm: Psm,
    pub whitelist: Option<CharWhitelist>,
}

impl OcrRunConfig {
    pub fn new(engine: EngineMode, psm: Psm) -> Self {
        Self {
            engine,
            psm,
            whitelist: None,
        }
    }

    pub fn with_whitelist(mut self, whitelist: CharWhitelist) -> Self {
        self.whitelist = Some(whitelist);
        self
    }

    /// A short label for this configuration, used in quality-scorer tie
    /// breaking and diagnostics.
    pub fn label(&self) -> String {
        format!(
            "oem{}-psm{}{}",
            self.engine.oem_value(),
            self.psm.value(),
            self.whitelist.map(|_| "-wl").unwrap_or("")
        )
    }
}

impl Default for OcrRunConfig {
    fn default() -> Self {
        Self::new(EngineMode::Lstm, Psm::SingleBlock)
    }
}

/// One recognized word and its pixel bounding box, as produced by a
/// word-level OCR pass (spec §4.5 Step C: "word-level OCR with per-token
/// bounding boxes").
#[derive(Debug, Clone)]
pub struct WordBox {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Trait implemented by anything that can turn an image into text.
pub trait OcrBackend: Send + Sync {
    /// Run OCR on an already-decoded image with a given configuration.
    fn ocr_image_with(
        &self,
        path: &Path,
        config: &OcrRunConfig,
    ) -> Result<String, OcrError>;

    /// Run OCR with this backend's default configuration.
    fn ocr_image(&self, path: &Path) -> Result<String, OcrError> {
        self.ocr_image_with(path, &OcrRunConfig::default())
    }

    /// Word-level OCR with per-token bounding boxes, used by the hybrid
    /// extractor's label-anchored crop step (§4.5 Step C). Backends that
    /// cannot produce boxes return an empty vec rather than erroring.
    fn ocr_words(&self, path: &Path) -> Result<Vec<WordBox>, OcrError>;

    fn is_available(&self) -> bool;
}

/// Test doubles for the OCR backend contract. Not behind `cfg(test)` since
/// the crate's own integration tests (a separate compilation unit) need to
/// construct a `MockOcrBackend` too.
pub mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// A backend that returns scripted text, used to drive S1–S6 end to end
    /// without invoking a real `tesseract` binary.
    pub struct MockOcrBackend {
        responses: Mutex<Vec<String>>,
        words: Mutex<Vec<WordBox>>,
        calls: AtomicUsize,
    }

    impl MockOcrBackend {
        pub fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(String::from).rev().collect()),
                words: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        /// Always return the same text for every call.
        pub fn constant(text: &str) -> Self {
            Self::new(vec![text; 64])
        }

        /// Script the word boxes `ocr_words` returns, for scenarios driving
        /// the hybrid extractor's label-anchored crop step.
        pub fn with_words(self, words: Vec<WordBox>) -> Self {
            *self.words.lock().unwrap() = words;
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl OcrBackend for MockOcrBackend {
        fn ocr_image_with(&self, _path: &Path, _config: &OcrRunConfig) -> Result<String, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            Ok(responses.pop().unwrap_or_default())
        }

        fn ocr_words(&self, _path: &Path) -> Result<Vec<WordBox>, OcrError> {
            Ok(self.words.lock().unwrap().clone())
        }

        fn is_available(&self) -> bool {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_config_label_reflects_knobs() {
        let config = OcrRunConfig::new(EngineMode::Lstm, Psm::RawLine)
            .with_whitelist(CharWhitelist::LettersOnly);
        assert_eq!(config.label(), "oem1-psm13-wl");
    }

    #[test]
    fn whitelist_charsets_are_disjoint_in_intent() {
        assert!(CharWhitelist::DigitsOnly.chars().contains('0'));
        assert!(!CharWhitelist::DigitsOnly.chars().contains('A'));
        assert!(CharWhitelist::LettersOnly.chars().contains('A'));
    }
}
