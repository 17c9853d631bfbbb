//! Text-quality scorer (component C3): rates one OCR attempt's output on
//! completeness of target fields and noise level, per spec §4.3. A pure
//! function over a table of named rules, in the same style as the teacher's
//! date-detection scorer.

use crate::models::OcrAttempt;

const SURNAME_LABELS: &[&str] = &["surname"];
const FIRST_NAME_LABELS: &[&str] = &["first name", "first_name"];
const OTHER_NAMES_LABELS: &[&str] = &["other name", "other names", "other_names"];
const ACCOUNT_HINTS: &[&str] = &["account", "number", "csd"];

/// Score a single candidate text. Always non-negative.
pub fn score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let mut total = 0.0;

    total += (text.len() as f64 / 50.0).min(2.0);

    let label_hits = [
        contains_any(&lower, SURNAME_LABELS),
        contains_any(&lower, FIRST_NAME_LABELS),
        contains_any(&lower, OTHER_NAMES_LABELS),
    ];
    if label_hits[0] {
        total += 5.0;
    }
    if label_hits[1] {
        total += 3.0;
    }
    if label_hits[2] {
        total += 4.0;
    }
    let label_count = label_hits.iter().filter(|h| **h).count();
    if label_count >= 2 {
        total += 10.0;
    }
    if label_count == 3 {
        total += 15.0;
    }

    if contains_any(&lower, ACCOUNT_HINTS) {
        total += 3.0;
    }

    if has_run(text, 3, |c| c.is_ascii_alphabetic()) {
        total += 1.0;
    }
    if has_run(text, 3, |c| c.is_ascii_digit()) {
        total += 1.0;
    }

    total -= 2.0 * noise_fraction(text);

    total.max(0.0)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn has_run(text: &str, min_len: usize, predicate: impl Fn(char) -> bool) -> bool {
    let mut run = 0usize;
    for c in text.chars() {
        if predicate(c) {
            run += 1;
            if run >= min_len {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Fraction of characters that are neither alphanumeric, whitespace, nor
/// standard punctuation — a proxy for OCR garbage (boxes, diacritics, noise
/// glyphs).
fn noise_fraction(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let noisy = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !c.is_ascii_punctuation())
        .count();
    noisy as f64 / text.chars().count() as f64
}

/// Pick the best-scoring attempt, breaking ties by insertion order (earliest
/// ordinal wins).
pub fn best<'a>(attempts: &'a [OcrAttempt]) -> Option<&'a OcrAttempt> {
    attempts.iter().fold(None, |best, candidate| match best {
        None => Some(candidate),
        Some(current) if candidate.score > current.score => Some(candidate),
        Some(current) => Some(current),
    })
}
