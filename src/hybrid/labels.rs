//! Label-anchored crop extraction (spec §4.5 Step C): scan word-level OCR
//! tokens for known printed field labels and compute candidate crop
//! rectangles adjacent to each hit.

use crate::ocr::WordBox;

/// Known label phrases and the field name they anchor, in the order §4.5
/// lists them. Multi-word labels are matched as a sliding window over
/// consecutive word boxes.
const LABELS: &[(&str, &str)] = &[
    ("surname", "surname"),
    ("other names", "other_names"),
    ("other name", "other_names"),
    ("first name", "first_name"),
    ("id number", "id_number"),
    ("account number", "account_number"),
    ("bank account", "bank_account"),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

pub struct LabelHit {
    pub field_name: &'static str,
    /// The two candidate crops from §4.5 Step C: right-of and below the
    /// label's printed bounding box.
    pub right_of: CropRect,
    pub below: CropRect,
}

/// Scan `words` for label phrases and compute the two candidate crops for
/// each hit. Words are assumed to be in reading order on the page.
pub fn find_label_hits(words: &[WordBox]) -> Vec<LabelHit> {
    let mut hits = Vec::new();
    let lower: Vec<String> = words.iter().map(|w| w.text.to_lowercase()).collect();

    let mut i = 0;
    while i < words.len() {
        if let Some(hit) = match_label_at(words, &lower, i) {
            hits.push(hit);
        }
        i += 1;
    }
    hits
}

fn match_label_at(words: &[WordBox], lower: &[String], start: usize) -> Option<LabelHit> {
    for (phrase, field_name) in LABELS {
        let phrase_words: Vec<&str> = phrase.split_whitespace().collect();
        let end = start + phrase_words.len();
        if end > words.len() {
            continue;
        }
        let candidate = lower[start..end].join(" ");
        if candidate != *phrase {
            continue;
        }

        let (x, y, x2, y2) = union_bounds(&words[start..end]);
        let label_height = (y2 - y).max(1) as u32;

        let right_of = CropRect {
            x: x2,
            y: y - 5,
            width: 300,
            height: label_height + 30,
        };
        let below = CropRect {
            x,
            y: y2,
            width: 400,
            height: (label_height + 20).min(50),
        };

        return Some(LabelHit {
            field_name,
            right_of,
            below,
        });
    }
    None
}

fn union_bounds(words: &[WordBox]) -> (i64, i64, i64, i64) {
    let x = words.iter().map(|w| w.x as i64).min().unwrap_or(0);
    let y = words.iter().map(|w| w.y as i64).min().unwrap_or(0);
    let x2 = words
        .iter()
        .map(|w| (w.x + w.width) as i64)
        .max()
        .unwrap_or(0);
    let y2 = words
        .iter()
        .map(|w| (w.y + w.height) as i64)
        .max()
        .unwrap_or(0);
    (x, y, x2, y2)
}
