//! Configuration for the intake pipeline.
//!
//! Settings are loaded from an optional TOML file, then overridden by
//! environment variables, then by CLI flags — the same layering
//! `foiacquire::config` uses, simplified here to plain `serde` + `toml`
//! since this crate has no database-backed settings store to synchronize
//! with (see DESIGN.md).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default debounce delay: how long to wait after the last filesystem event
/// before considering a burst of activity settled (§4.7).
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default settle delay: how long to wait after debounce fires before
/// enumerating the intake directory, to let in-flight copies finish (§4.7).
pub const DEFAULT_SETTLE_SECS: u64 = 5;

/// Default number of read-probe retries for a file that may still be locked
/// by a scanner mid-copy (§4.7).
pub const DEFAULT_PROBE_RETRIES: u32 = 10;

/// Default delay between read-probe retries.
pub const DEFAULT_PROBE_RETRY_MS: u64 = 500;

/// Default rasterization DPI for the standard (non-hybrid) extraction path.
pub const DEFAULT_STANDARD_DPI: u32 = 200;

/// Default rasterization DPI for the hybrid extractor's baseline pass (§4.5).
pub const DEFAULT_HYBRID_DPI: u32 = 300;

/// Default DPI used when converting an image to PDF for routing (§4.6).
pub const DEFAULT_OUTPUT_PDF_DPI: f32 = 100.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory containing `incoming-scan/` and the three bucket dirs.
    pub root: PathBuf,
    /// Intake directory name, relative to `root`.
    pub intake_dir: String,
    /// Bucket directory names, relative to `root`.
    pub fully_indexed_dir: String,
    pub partially_indexed_dir: String,
    pub failed_dir: String,

    /// OCR language passed to the external OCR tool.
    pub language: String,
    /// Explicit path to the OCR binary, if not discoverable via probing/PATH.
    pub ocr_binary: Option<PathBuf>,
    /// Explicit path to the PDF rasterizer binary (`pdftoppm`-compatible).
    pub rasterizer_binary: Option<PathBuf>,

    pub debounce_ms: u64,
    pub settle_secs: u64,
    pub probe_retries: u32,
    pub probe_retry_ms: u64,
    pub standard_dpi: u32,
    pub hybrid_dpi: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            intake_dir: "incoming-scan".to_string(),
            fully_indexed_dir: "fully_indexed".to_string(),
            partially_indexed_dir: "partially_indexed".to_string(),
            failed_dir: "failed".to_string(),
            language: "eng".to_string(),
            ocr_binary: None,
            rasterizer_binary: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            settle_secs: DEFAULT_SETTLE_SECS,
            probe_retries: DEFAULT_PROBE_RETRIES,
            probe_retry_ms: DEFAULT_PROBE_RETRY_MS,
            standard_dpi: DEFAULT_STANDARD_DPI,
            hybrid_dpi: DEFAULT_HYBRID_DPI,
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file, falling back to
    /// defaults for anything the file doesn't set.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(path)?;
                toml::from_str(&text)?
            }
            _ => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Apply `INTAKE_ROUTER_*` environment overrides on top of file/defaults.
    fn apply_env(&mut self) {
        if let Ok(root) = std::env::var("INTAKE_ROUTER_ROOT") {
            self.root = PathBuf::from(root);
        }
        if let Ok(lang) = std::env::var("INTAKE_ROUTER_LANGUAGE") {
            self.language = lang;
        }
        if let Ok(bin) = std::env::var("INTAKE_ROUTER_OCR_BINARY") {
            self.ocr_binary = Some(PathBuf::from(bin));
        }
    }

    pub fn intake_path(&self) -> PathBuf {
        self.root.join(&self.intake_dir)
    }

    pub fn bucket_dir(&self, bucket: crate::models::DestinationBucket) -> PathBuf {
        use crate::models::DestinationBucket::*;
        match bucket {
            FullyIndexed => self.root.join(&self.fully_indexed_dir),
            PartiallyIndexed => self.root.join(&self.partially_indexed_dir),
            Failed => self.root.join(&self.failed_dir),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn probe_retry_delay(&self) -> Duration {
        Duration::from_millis(self.probe_retry_ms)
    }

    /// Ensure the intake and bucket directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.intake_path())?;
        std::fs::create_dir_all(self.root.join(&self.fully_indexed_dir))?;
        std::fs::create_dir_all(self.root.join(&self.partially_indexed_dir))?;
        std::fs::create_dir_all(self.root.join(&self.failed_dir))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bucket_dirs_are_siblings_of_intake() {
        let config = Config::default();
        assert_eq!(config.intake_path(), PathBuf::from("./incoming-scan"));
        assert_eq!(
            config.bucket_dir(crate::models::DestinationBucket::Failed),
            PathBuf::from("./failed")
        );
    }

    #[test]
    fn load_missing_file_falls_back_to_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/does-not-exist.toml"))).unwrap();
        assert_eq!(config.language, "eng");
    }

    #[test]
    fn load_parses_toml_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "language = \"fra\"\ndebounce_ms = 250\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.language, "fra");
        assert_eq!(config.debounce_ms, 250);
    }
}
