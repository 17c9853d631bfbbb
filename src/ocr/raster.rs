//! PDF page rasterization: wraps the `pdftoppm` external tool the same way
//! the teacher's extractor wraps `pdftotext`/`pdfinfo`.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::backend::OcrError;

pub struct Rasterizer {
    binary: PathBuf,
}

impl Rasterizer {
    pub fn new(explicit_path: Option<&Path>) -> Self {
        let binary = explicit_path
            .map(|p| p.to_path_buf())
            .or_else(|| which::which("pdftoppm").ok())
            .unwrap_or_else(|| PathBuf::from("pdftoppm"));
        Self { binary }
    }

    /// Rasterize one 1-based page of `pdf_path` at `dpi` into `out_dir`,
    /// returning the path to the produced PNG.
    pub fn rasterize_page(
        &self,
        pdf_path: &Path,
        page: u32,
        dpi: u32,
        out_dir: &Path,
    ) -> Result<PathBuf, OcrError> {
        let prefix = out_dir.join("page");
        let output = Command::new(&self.binary)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OcrError::BackendUnavailable(format!("{} not found", self.binary.display()))
                } else {
                    OcrError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(OcrError::RasterizationFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        find_page_image(out_dir, page)
            .ok_or_else(|| OcrError::RasterizationFailed(format!("no output for page {page}")))
    }

    /// Number of pages in a PDF, via `pdfinfo`.
    pub fn page_count(&self, pdf_path: &Path) -> Result<u32, OcrError> {
        let pdfinfo = which::which("pdfinfo").unwrap_or_else(|_| PathBuf::from("pdfinfo"));
        let output = Command::new(pdfinfo).arg(pdf_path).output()?;
        if !output.status.success() {
            return Err(OcrError::RasterizationFailed(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        text.lines()
            .find_map(|line| line.strip_prefix("Pages:"))
            .and_then(|rest| rest.trim().parse().ok())
            .ok_or_else(|| OcrError::RasterizationFailed("no Pages: line in pdfinfo output".into()))
    }
}

/// `pdftoppm` zero-pads the page number with an unpredictable width
/// depending on total page count; probe a few widths rather than assume one.
fn find_page_image(dir: &Path, page: u32) -> Option<PathBuf> {
    for width in [2usize, 3, 4, 1] {
        let candidate = dir.join(format!("page-{page:0width$}.png"));
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}
