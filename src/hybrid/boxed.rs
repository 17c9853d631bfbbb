//! Boxed-field reader (spec §4.5b): reads forms where each digit or letter
//! occupies its own printed box, by finding per-character contours and
//! running OCR on each box independently.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::contrast::otsu_level;
use imageproc::point::Point;

use crate::ocr::{EngineMode, OcrBackend, OcrRunConfig, Psm};

/// Whether the field being read is expected to hold digits or letters,
/// driving the per-box confidence bonus in step 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxFieldShape {
    Numeric,
    Alphabetic,
}

struct BoxRect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Attempt to read `crop` as a sequence of boxed characters. Returns `None`
/// when fewer than two candidate boxes survive filtering (caller falls back
/// to the general handwritten-field extractor) or the assembled string is
/// shorter than 3 characters.
pub fn read_boxed_field(
    crop: &DynamicImage,
    shape: BoxFieldShape,
    backend: &dyn OcrBackend,
) -> Option<String> {
    let gray = crop.to_luma8();
    let threshold = otsu_level(&gray);
    let binary = binarize(&gray, threshold);

    let boxes = find_boxes(&binary);
    if boxes.len() < 2 {
        return None;
    }

    let mut assembled = String::new();
    for b in &boxes {
        if let Some(best) = read_one_box(crop, b, shape, backend) {
            assembled.push_str(&best);
        }
    }

    if assembled.len() >= 3 {
        Some(assembled)
    } else {
        None
    }
}

fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let (w, h) = gray.dimensions();
    let mut out = GrayImage::new(w, h);
    for (x, y, pixel) in gray.enumerate_pixels() {
        let v = if pixel.0[0] > threshold { 255 } else { 0 };
        out.put_pixel(x, y, Luma([v]));
    }
    out
}

/// Find external contours and keep rectangles whose size and aspect ratio
/// look like a single printed character cell, per §4.5b step 2. Boxes are
/// returned sorted left-to-right (step 4).
fn find_boxes(binary: &GrayImage) -> Vec<BoxRect> {
    let contours = find_contours::<i32>(binary);
    let mut boxes: Vec<BoxRect> = contours
        .iter()
        .filter_map(|c| bounding_rect(&c.points))
        .filter(|r| {
            let area = r.width * r.height;
            let aspect = r.width as f64 / r.height.max(1) as f64;
            (15..=80).contains(&r.width)
                && (15..=80).contains(&r.height)
                && area >= 200
                && (0.3..=3.0).contains(&aspect)
        })
        .collect();
    boxes.sort_by_key(|r| r.x);
    boxes
}

fn bounding_rect(points: &[Point<i32>]) -> Option<BoxRect> {
    if points.is_empty() {
        return None;
    }
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    Some(BoxRect {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x).max(0) as u32,
        height: (max_y - min_y).max(0) as u32,
    })
}

/// Step 5: crop one box with 2px padding, amplify contrast, and run OCR
/// four times, keeping the highest-confidence single-glyph result.
fn read_one_box(
    source: &DynamicImage,
    b: &BoxRect,
    shape: BoxFieldShape,
    backend: &dyn OcrBackend,
) -> Option<String> {
    let (img_w, img_h) = source.dimensions();
    let pad = 2u32;
    let x0 = b.x.saturating_sub(pad);
    let y0 = b.y.saturating_sub(pad);
    let x1 = (b.x + b.width + pad).min(img_w);
    let y1 = (b.y + b.height + pad).min(img_h);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    let cropped = source.crop_imm(x0, y0, x1 - x0, y1 - y0);
    let gray = DynamicImage::ImageLuma8(cropped.to_luma8()).adjust_contrast(2.5);

    let tmp = tempfile::Builder::new().suffix(".png").tempfile().ok()?;
    gray.save(tmp.path()).ok()?;

    let configs = [
        OcrRunConfig::new(EngineMode::Lstm, Psm::SingleChar),
        OcrRunConfig::new(EngineMode::Lstm, Psm::SingleWord),
        OcrRunConfig::new(EngineMode::Legacy, Psm::SingleChar),
        OcrRunConfig::new(EngineMode::Lstm, Psm::RawLine),
    ];

    let mut best: Option<(String, i64)> = None;
    for config in &configs {
        let Ok(text) = backend.ocr_image_with(tmp.path(), config) else {
            continue;
        };
        let stripped: String = text.chars().filter(|c| c.is_alphanumeric()).collect();
        if stripped.is_empty() || stripped.len() > 3 {
            continue;
        }
        let confidence = box_confidence(&stripped, shape);
        if best.as_ref().map(|(_, c)| confidence > *c).unwrap_or(true) {
            best = Some((stripped, confidence));
        }
    }
    best.map(|(s, _)| s)
}

/// Confidence per §4.5b step 5: `10 * len`, `+20` if digits and the field
/// is numeric, `+20` if letters and the field is alphabetic, `+10`/`+5` for
/// crosses (an `X` mark used on some forms to indicate a selection).
fn box_confidence(s: &str, shape: BoxFieldShape) -> i64 {
    let mut score = 10 * s.len() as i64;
    let all_digits = !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let all_letters = !s.is_empty() && s.chars().all(|c| c.is_alphabetic());
    if all_digits && shape == BoxFieldShape::Numeric {
        score += 20;
    }
    if all_letters && shape == BoxFieldShape::Alphabetic {
        score += 20;
    }
    if s.eq_ignore_ascii_case("x") {
        score += 10;
    } else if s.contains('x') || s.contains('X') {
        score += 5;
    }
    score
}
