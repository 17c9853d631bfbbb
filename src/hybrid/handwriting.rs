//! Handwritten field extractor (spec §4.5a): given a cropped region and a
//! field name, recovers a handwritten value either via the boxed-field
//! reader or via a scored multi-variant, multi-config OCR sweep.

use image::{DynamicImage, GenericImageView};

use crate::hybrid::boxed::{read_boxed_field, BoxFieldShape};
use crate::ocr::{CharWhitelist, EngineMode, OcrBackend, OcrRunConfig, Psm};
use crate::parser::clean::{clean, FieldKind};

/// Whether a field name looks account-like, per §4.5a's "account, id,
/// number" trigger list for the boxed-reader fast path.
fn is_account_like(field_name: &str) -> bool {
    let lower = field_name.to_lowercase();
    ["account", "id", "number"].iter().any(|k| lower.contains(k))
}

fn field_shape(field_name: &str) -> FieldKind {
    if is_account_like(field_name) {
        FieldKind::Account
    } else {
        FieldKind::Name
    }
}

/// Extract a handwritten value from `crop`, a region anchored off a printed
/// label. Returns `None` if nothing with a cleaned length >= 2 was found.
pub fn extract_handwritten_field(
    crop: &DynamicImage,
    field_name: &str,
    backend: &dyn OcrBackend,
) -> Option<String> {
    let (width, height) = (crop.width(), crop.height());

    if is_account_like(field_name) && width >= 20 && height >= 10 {
        let shape = BoxFieldShape::Numeric;
        if let Some(boxed) = read_boxed_field(crop, shape, backend) {
            if boxed.len() >= 4 {
                return Some(boxed);
            }
        }
    }

    sweep(crop, field_name, backend)
}

/// The five preprocessing variants × eight OCR configs sweep from §4.5a,
/// scored by `confidence` and returning only the best result.
fn sweep(crop: &DynamicImage, field_name: &str, backend: &dyn OcrBackend) -> Option<String> {
    let variants: Vec<DynamicImage> = vec![
        crop.clone(),
        DynamicImage::ImageLuma8(crop.to_luma8()).adjust_contrast(2.5),
        auto_contrast_variant(crop),
        crop.unsharpen(1.5, 1),
        {
            let mut inverted = crop.clone();
            inverted.invert();
            inverted
        },
    ];

    let configs = [
        OcrRunConfig::new(EngineMode::Lstm, Psm::SingleWord),
        OcrRunConfig::new(EngineMode::Lstm, Psm::SingleLine),
        OcrRunConfig::new(EngineMode::Lstm, Psm::RawLine),
        OcrRunConfig::new(EngineMode::Lstm, Psm::SingleBlock),
        OcrRunConfig::new(EngineMode::Lstm, Psm::SingleWord).with_whitelist(CharWhitelist::LettersOnly),
        OcrRunConfig::new(EngineMode::Lstm, Psm::SingleWord)
            .with_whitelist(CharWhitelist::AlphanumericAndDash),
        OcrRunConfig::new(EngineMode::Legacy, Psm::SingleWord),
        OcrRunConfig::new(EngineMode::Legacy, Psm::SingleLine),
    ];

    let shape = field_shape(field_name);
    let tmp = tempfile::Builder::new().suffix(".png").tempfile().ok()?;

    let mut best: Option<(String, f64)> = None;
    for variant in &variants {
        if variant.save(tmp.path()).is_err() {
            continue;
        }
        for config in &configs {
            let Ok(text) = backend.ocr_image_with(tmp.path(), config) else {
                continue;
            };
            let Some(cleaned) = clean(&text, shape) else {
                continue;
            };
            if cleaned.len() < 2 {
                continue;
            }
            let confidence = local_confidence(&cleaned, shape);
            if best.as_ref().map(|(_, c)| confidence > *c).unwrap_or(true) {
                best = Some((cleaned, confidence));
            }
        }
    }
    best.map(|(s, _)| s)
}

fn auto_contrast_variant(crop: &DynamicImage) -> DynamicImage {
    crate::preprocess::apply(crop, crate::models::PreprocessVariant::AutoContrast)
}

/// Local confidence scoring per §4.5a: `+length` (capped 20), `+10` if
/// alphanumeric content present, `-2` per special character, `-5` if
/// runaway spaces, `+15` if the result matches the field's expected shape.
fn local_confidence(s: &str, shape: FieldKind) -> f64 {
    let mut score = (s.len() as f64).min(20.0);

    if s.chars().any(|c| c.is_alphanumeric()) {
        score += 10.0;
    }

    let specials = s.chars().filter(|c| !c.is_alphanumeric() && !c.is_whitespace()).count();
    score -= 2.0 * specials as f64;

    let space_run = s.chars().collect::<Vec<_>>().windows(3).any(|w| w.iter().all(|c| *c == ' '));
    if space_run {
        score -= 5.0;
    }

    let matches_shape = match shape {
        FieldKind::Name => !s.chars().any(|c| c.is_ascii_digit()) && s.chars().any(|c| c.is_alphabetic()),
        FieldKind::Account => s.chars().any(|c| c.is_ascii_digit()),
    };
    if matches_shape {
        score += 15.0;
    }

    score.max(0.0)
}
