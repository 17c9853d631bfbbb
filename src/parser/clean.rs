//! Capture cleaning rules shared by both parsing passes (spec §4.4): trim,
//! collapse whitespace, strip filler characters, and reject OCR artifacts.

/// OCR artifacts that occasionally satisfy a label regex but are never a
/// real field value — typically the label itself leaking into the capture
/// group, or near-miss garbage on blank handwritten boxes.
const DENYLIST: &[&str] = &["rr", "te", "nanny", "application", "form", "account", "number"];

/// Target kind of the field being captured, used to decide whether an
/// all-non-letters capture should be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    Account,
}

/// Clean a raw regex capture per the rules in §4.4. Returns `None` if the
/// cleaned capture should be rejected.
pub fn clean(raw: &str, kind: FieldKind) -> Option<String> {
    let trimmed = raw.trim();
    let collapsed = collapse_whitespace(trimmed);
    let stripped = strip_filler(&collapsed);

    if stripped.is_empty() {
        return None;
    }
    if kind == FieldKind::Name && !stripped.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    if DENYLIST.contains(&stripped.to_lowercase().as_str()) {
        return None;
    }

    let value = if kind == FieldKind::Account {
        stripped.chars().filter(|c| !c.is_whitespace()).collect()
    } else {
        stripped
    };

    Some(value)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip trailing underscore/dash runs left behind by empty-field artifacts
/// (e.g. a label followed by a blank answer line rendered as `____`).
fn strip_filler(s: &str) -> String {
    s.trim_end_matches(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .to_string()
}
