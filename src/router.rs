//! Router (component C6): decides the destination bucket, synthesizes the
//! output filename, converts images to PDF, and moves the file atomically
//! with collision-suffix resolution (spec §4.6).

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::Config;
use crate::models::{DestinationBucket, ExtractedFields, InputExt, RoutingDecision};

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("image decode/convert failed: {0}")]
    ImageConvert(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The outcome of routing one file: where it ended up, and under the
/// decision that sent it there.
#[derive(Debug, Clone)]
pub struct RouteOutcome {
    pub decision: RoutingDecision,
    pub destination: PathBuf,
}

/// Route `source` given its extracted fields. Implements §4.6 steps 1-7:
/// on any failure converting or moving to the computed destination, falls
/// back to moving the source into `FAILED_DIR` with its original name, and
/// only returns `Err` if even that last resort fails.
pub fn route(
    config: &Config,
    source: &Path,
    ext: InputExt,
    fields: &ExtractedFields,
) -> Result<RouteOutcome, RouterError> {
    let is_image = ext.is_image();
    let decision = RoutingDecision::classify(fields);
    let bucket = decision.bucket();
    let filename = output_filename(fields, &decision, source, is_image);
    let bucket_dir = config.bucket_dir(bucket);
    std::fs::create_dir_all(&bucket_dir)?;
    let destination = resolve_collision(&bucket_dir.join(&filename));

    let placed = place(source, &destination, is_image);
    match placed {
        Ok(()) => Ok(RouteOutcome { decision, destination }),
        Err(_) => last_resort(config, source).map(|destination| RouteOutcome {
            decision: RoutingDecision::Failed,
            destination,
        }),
    }
}

/// §3's output filename grammar.
fn output_filename(
    fields: &ExtractedFields,
    decision: &RoutingDecision,
    source: &Path,
    is_image: bool,
) -> String {
    let ext_out = if is_image { "pdf" } else { source_ext(source) };
    match decision {
        RoutingDecision::Full => format!(
            "{}_{}.{}",
            fields.name().unwrap_or_default(),
            fields.account.clone().unwrap_or_default(),
            ext_out
        ),
        RoutingDecision::Partial => {
            let key = fields.name().or_else(|| fields.account.clone()).unwrap_or_default();
            format!("{key}.{ext_out}")
        }
        RoutingDecision::Failed => {
            let stem = source.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
            format!("{stem}.{ext_out}")
        }
    }
}

fn source_ext(source: &Path) -> &str {
    source.extension().and_then(|e| e.to_str()).unwrap_or("bin")
}

/// Move or convert `source` into `destination`. Images are converted to PDF
/// at `DEFAULT_OUTPUT_PDF_DPI` and the source is deleted; everything else is
/// a plain rename.
fn place(source: &Path, destination: &Path, is_image: bool) -> Result<(), RouterError> {
    if is_image {
        let image = image::open(source)?;
        let pdf_bytes = encode_single_page_pdf(&image, crate::config::DEFAULT_OUTPUT_PDF_DPI)?;
        std::fs::write(destination, pdf_bytes)?;
        std::fs::remove_file(source)?;
    } else {
        std::fs::rename(source, destination)?;
    }
    Ok(())
}

/// Encode `image` as a minimal single-page PDF: a JPEG XObject sized to the
/// image's pixel dimensions at `dpi`, no external PDF library — raw PDF
/// syntax written as bytes, objects laid out 1-indexed:
///   1 Catalog, 2 Pages, 3 Page, 4 Content stream, 5 Image XObject.
fn encode_single_page_pdf(image: &image::DynamicImage, dpi: f32) -> Result<Vec<u8>, RouterError> {
    use std::io::Write;

    let rgb = image.to_rgb8();
    let (img_w, img_h) = (rgb.width(), rgb.height());

    let mut jpeg_bytes = Vec::new();
    image::DynamicImage::ImageRgb8(rgb).write_to(
        &mut std::io::Cursor::new(&mut jpeg_bytes),
        image::ImageFormat::Jpeg,
    )?;

    let page_w = img_w as f64 / dpi as f64 * 72.0;
    let page_h = img_h as f64 / dpi as f64 * 72.0;

    let mut buf: Vec<u8> = Vec::with_capacity(jpeg_bytes.len() + 1024);
    let mut offsets = [0usize; 6]; // 1-indexed; index 0 unused

    macro_rules! w {
        ($($arg:tt)*) => { write!(buf, $($arg)*)? }
    }

    w!("%PDF-1.4\n");
    buf.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

    offsets[1] = buf.len();
    w!("1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

    offsets[2] = buf.len();
    w!("2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");

    offsets[3] = buf.len();
    w!(
        "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {page_w:.2} {page_h:.2}] \
         /Contents 4 0 R /Resources << /XObject << /Im0 5 0 R >> >> >>\nendobj\n"
    );

    let content = format!("q\n{page_w:.2} 0 0 {page_h:.2} 0 0 cm\n/Im0 Do\nQ\n");
    let content_bytes = content.as_bytes();
    offsets[4] = buf.len();
    w!("4 0 obj\n<< /Length {} >>\nstream\n", content_bytes.len());
    buf.extend_from_slice(content_bytes);
    w!("\nendstream\nendobj\n");

    offsets[5] = buf.len();
    w!(
        "5 0 obj\n<< /Type /XObject /Subtype /Image /Width {img_w} /Height {img_h} \
         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
        jpeg_bytes.len()
    );
    buf.extend_from_slice(&jpeg_bytes);
    w!("\nendstream\nendobj\n");

    let xref_pos = buf.len();
    w!("xref\n0 6\n");
    w!("0000000000 65535 f \n");
    for &offset in &offsets[1..6] {
        w!("{offset:010} 00000 n \n");
    }
    w!("trailer\n<< /Size 6 /Root 1 0 R >>\n");
    w!("startxref\n{xref_pos}\n%%EOF\n");

    Ok(buf)
}

/// Last-resort recovery per §4.6 step 6: move the source into `FAILED_DIR`
/// preserving its original name, collision-resolved.
fn last_resort(config: &Config, source: &Path) -> Result<PathBuf, RouterError> {
    let failed_dir = config.bucket_dir(DestinationBucket::Failed);
    std::fs::create_dir_all(&failed_dir)?;
    let name = source.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");
    let destination = resolve_collision(&failed_dir.join(name));
    std::fs::rename(source, &destination)?;
    Ok(destination)
}

/// Append `_1`, `_2`, ... before the extension until a free path is found.
pub(crate) fn resolve_collision(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str());

    let mut n = 1u64;
    loop {
        let candidate_name = match ext {
            Some(ext) => format!("{stem}_{n}.{ext}"),
            None => format!("{stem}_{n}"),
        };
        let candidate = parent.join(candidate_name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> Config {
        Config {
            root: dir.to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn full_decision_names_file_name_and_account() {
        let fields = ExtractedFields {
            surname: Some("SMITH".into()),
            first_name: Some("JOHN".into()),
            other_names: Some("K".into()),
            account: Some("34007802837".into()),
            is_corporate: false,
        };
        let name = output_filename(
            &fields,
            &RoutingDecision::Full,
            Path::new("scan.pdf"),
            false,
        );
        assert_eq!(name, "SMITH JOHN K_34007802837.pdf");
    }

    #[test]
    fn partial_decision_uses_name_or_account_as_key() {
        let fields = ExtractedFields {
            surname: Some("DOE".into()),
            ..Default::default()
        };
        let name = output_filename(&fields, &RoutingDecision::Partial, Path::new("x.png"), true);
        assert_eq!(name, "DOE.pdf");
    }

    #[test]
    fn failed_decision_keeps_original_stem() {
        let fields = ExtractedFields::default();
        let name = output_filename(
            &fields,
            &RoutingDecision::Failed,
            Path::new("scan0001.pdf"),
            false,
        );
        assert_eq!(name, "scan0001.pdf");
    }

    #[test]
    fn resolve_collision_picks_smallest_free_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("DOE_1.pdf");
        std::fs::write(&base, b"x").unwrap();
        let resolved = resolve_collision(&base);
        assert_eq!(resolved, dir.path().join("DOE_1_1.pdf"));
    }

    #[test]
    fn encode_single_page_pdf_produces_a_parseable_header_and_xref() {
        let image = image::DynamicImage::ImageLuma8(image::GrayImage::from_pixel(4, 4, image::Luma([128])));
        let bytes = encode_single_page_pdf(&image, 100.0).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Filter /DCTDecode"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn route_image_input_converts_to_a_real_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = dir.path().join("scan.png");
        let img = image::DynamicImage::ImageLuma8(image::GrayImage::from_pixel(4, 4, image::Luma([128])));
        img.save(&source).unwrap();

        let fields = ExtractedFields {
            surname: Some("DOE".into()),
            ..Default::default()
        };
        let outcome = route(&config, &source, InputExt::Png, &fields).unwrap();

        assert_eq!(outcome.decision, RoutingDecision::Partial);
        assert!(!source.exists());
        let written = std::fs::read(&outcome.destination).unwrap();
        assert!(written.starts_with(b"%PDF-1.4"));
    }

    #[test]
    fn route_non_image_moves_file_into_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = dir.path().join("incoming.pdf");
        std::fs::write(&source, b"%PDF-1.4").unwrap();

        let fields = ExtractedFields {
            surname: Some("DOE".into()),
            account: Some("123".into()),
            ..Default::default()
        };
        let outcome = route(&config, &source, InputExt::Pdf, &fields).unwrap();
        assert_eq!(outcome.decision, RoutingDecision::Full);
        assert!(!source.exists());
        assert!(outcome.destination.exists());
        assert!(outcome.destination.starts_with(config.bucket_dir(DestinationBucket::FullyIndexed)));
    }

    #[test]
    fn route_failed_decision_goes_to_failed_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let source = dir.path().join("scan.pdf");
        std::fs::write(&source, b"%PDF-1.4").unwrap();

        let outcome = route(&config, &source, InputExt::Pdf, &ExtractedFields::default()).unwrap();
        assert_eq!(outcome.decision, RoutingDecision::Failed);
        assert!(outcome.destination.starts_with(config.bucket_dir(DestinationBucket::Failed)));
    }
}
