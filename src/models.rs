//! Core data model for the intake pipeline: the shapes each component reads
//! and writes as a file moves through discovery, extraction, and routing.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// An accepted intake file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputExt {
    Pdf,
    Png,
    Jpg,
    Jpeg,
}

impl InputExt {
    /// Parse a file extension (case-insensitive, without the leading dot).
    pub fn from_str(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpg),
            "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Parse the extension of a path.
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_str(path.extension()?.to_str()?)
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Png | Self::Jpg | Self::Jpeg)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
        }
    }
}

/// A file observed in the intake directory, not yet claimed for processing.
#[derive(Debug, Clone)]
pub struct IntakeFile {
    pub path: PathBuf,
    pub ext: InputExt,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl IntakeFile {
    /// Build an `IntakeFile` from a path on disk, rejecting unsupported
    /// extensions and names that contain `.git`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        if name.contains(".git") {
            return None;
        }
        let ext = InputExt::from_path(path)?;
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            path: path.to_path_buf(),
            ext,
            size: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// A named, reusable bitmap variant produced by the preprocessor (C2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreprocessVariant {
    Original,
    Grayscale,
    HighContrast,
    AutoContrast,
    SharpenHighContrast,
    Inverted,
    /// Milder variant set used by the standard (non-hybrid) extractor loop.
    MildContrastBrightnessSharpen,
}

impl PreprocessVariant {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Grayscale => "grayscale",
            Self::HighContrast => "high_contrast",
            Self::AutoContrast => "auto_contrast",
            Self::SharpenHighContrast => "sharpen_high_contrast",
            Self::Inverted => "inverted",
            Self::MildContrastBrightnessSharpen => "mild_standard",
        }
    }
}

/// A single (preprocessing variant, engine config, raw text, score) tuple
/// produced during one file's extraction. Transient — never persisted.
#[derive(Debug, Clone)]
pub struct OcrAttempt {
    pub variant: PreprocessVariant,
    pub config_label: String,
    pub text: String,
    pub score: f64,
    /// Insertion order, used to break score ties deterministically.
    pub ordinal: usize,
}

/// The two identity fields extracted from recognized text, per §3.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub surname: Option<String>,
    pub first_name: Option<String>,
    pub other_names: Option<String>,
    pub account: Option<String>,
    /// Set when the corporate-entity branch fired; `surname` then holds the
    /// corporate name instead of an individual's surname.
    pub is_corporate: bool,
}

impl ExtractedFields {
    /// The derived `name`: a space-joined concatenation of whichever of
    /// surname, first_name, other_names are present, in that order. `None`
    /// if none are present.
    pub fn name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.surname, &self.first_name, &self.other_names]
            .into_iter()
            .filter_map(|f| f.as_deref())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    pub fn has_name(&self) -> bool {
        self.surname.is_some() || self.first_name.is_some() || self.other_names.is_some()
    }

    pub fn has_account(&self) -> bool {
        self.account.is_some()
    }

    /// Validate the invariants from §3: each present field is a non-empty
    /// string of length >= 2 after trimming, and the account matches the
    /// accepted charset once internal whitespace is removed.
    pub fn is_valid(&self) -> bool {
        let name_ok = [&self.surname, &self.first_name, &self.other_names]
            .into_iter()
            .all(|f| f.as_deref().map(|s| s.trim().len() >= 2).unwrap_or(true));
        let account_ok = self.account.as_deref().map(is_valid_account).unwrap_or(true);
        name_ok && account_ok
    }
}

/// Account charset check per §3: `[A-Za-z0-9.\-]+` after space removal.
pub fn is_valid_account(account: &str) -> bool {
    let stripped: String = account.chars().filter(|c| !c.is_whitespace()).collect();
    !stripped.is_empty()
        && stripped
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

/// Terminal routing classification for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDecision {
    Full,
    Partial,
    Failed,
}

impl RoutingDecision {
    /// Classify a `RoutingDecision` from extracted fields per §3.
    pub fn classify(fields: &ExtractedFields) -> Self {
        match (fields.has_name(), fields.has_account()) {
            (true, true) => Self::Full,
            (true, false) | (false, true) => Self::Partial,
            (false, false) => Self::Failed,
        }
    }

    pub fn bucket(&self) -> DestinationBucket {
        match self {
            Self::Full => DestinationBucket::FullyIndexed,
            Self::Partial => DestinationBucket::PartiallyIndexed,
            Self::Failed => DestinationBucket::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "fully_indexed",
            Self::Partial => "partially_indexed",
            Self::Failed => "failed",
        }
    }
}

/// The three output directories a file can be routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationBucket {
    FullyIndexed,
    PartiallyIndexed,
    Failed,
}

impl DestinationBucket {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::FullyIndexed => "fully_indexed",
            Self::PartiallyIndexed => "partially_indexed",
            Self::Failed => "failed",
        }
    }
}

/// A single terminal-outcome record, emitted exactly once per file processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingEvent {
    pub original_filename: String,
    pub final_filename: Option<String>,
    pub file_size: u64,
    pub status: String,
    pub extracted_name: Option<String>,
    pub extracted_account: Option<String>,
    pub destination_path: Option<PathBuf>,
    pub error_message: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_join_order_is_surname_first_other() {
        let fields = ExtractedFields {
            surname: Some("SMITH".into()),
            first_name: Some("JOHN".into()),
            other_names: Some("K".into()),
            account: None,
            is_corporate: false,
        };
        assert_eq!(fields.name().as_deref(), Some("SMITH JOHN K"));
    }

    #[test]
    fn name_is_none_when_nothing_captured() {
        let fields = ExtractedFields::default();
        assert_eq!(fields.name(), None);
    }

    #[test]
    fn decision_classification_matches_spec() {
        let full = ExtractedFields {
            surname: Some("A".into()),
            account: Some("1".into()),
            ..Default::default()
        };
        assert_eq!(RoutingDecision::classify(&full), RoutingDecision::Full);

        let partial_name = ExtractedFields {
            surname: Some("A".into()),
            ..Default::default()
        };
        assert_eq!(RoutingDecision::classify(&partial_name), RoutingDecision::Partial);

        let partial_account = ExtractedFields {
            account: Some("1".into()),
            ..Default::default()
        };
        assert_eq!(RoutingDecision::classify(&partial_account), RoutingDecision::Partial);

        let failed = ExtractedFields::default();
        assert_eq!(RoutingDecision::classify(&failed), RoutingDecision::Failed);
    }

    #[test]
    fn account_charset_rejects_invalid_chars() {
        assert!(is_valid_account("34007802837"));
        assert!(is_valid_account("ABC-123.45"));
        assert!(!is_valid_account("abc/123"));
        assert!(!is_valid_account(""));
    }

    #[test]
    fn account_charset_ignores_internal_whitespace() {
        assert!(is_valid_account("340 078 028 37"));
    }

    #[test]
    fn ext_parsing_is_case_insensitive() {
        assert_eq!(InputExt::from_str("PDF"), Some(InputExt::Pdf));
        assert_eq!(InputExt::from_str("JPG"), Some(InputExt::Jpg));
        assert_eq!(InputExt::from_str("tiff"), None);
    }
}
