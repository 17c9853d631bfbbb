//! Field parser (component C4): a two-pass, table-driven regex matcher over
//! the best OCR text, extracting surname, first name, other names, and
//! account/ID per spec §4.4.

pub mod clean;
pub mod rules;

use crate::models::ExtractedFields;
use clean::clean;
use rules::{Field, RULES};

/// Run both parsing passes over `text` and return the extracted fields.
pub fn parse(text: &str) -> ExtractedFields {
    let mut fields = ExtractedFields::default();

    pass_one(text, &mut fields);
    pass_two(text, &mut fields);

    fields
}

/// Pass 1 — line-oriented: for each line, try every rule in table order,
/// filling whichever target field is not yet set.
fn pass_one(text: &str, fields: &mut ExtractedFields) {
    for line in text.lines() {
        for rule in RULES.iter() {
            if is_filled(fields, rule.field) {
                continue;
            }
            if rule.field == Field::Corporate && has_any_individual_name(fields) {
                continue;
            }
            let Some(captures) = rule.pattern.captures(line) else {
                continue;
            };
            let Some(raw) = captures.get(1) else { continue };
            let Some(cleaned) = clean(raw.as_str(), rule.field.kind()) else {
                continue;
            };
            apply(fields, rule.field, cleaned);
        }
    }
}

/// Pass 2 — global fallback: for any of {surname, first_name, other_names}
/// still empty, run its rules against the whole text, accepting the first
/// match whose cleaned capture is at least 2 characters.
fn pass_two(text: &str, fields: &mut ExtractedFields) {
    for rule in RULES.iter() {
        if !rule.field.has_global_fallback() || is_filled(fields, rule.field) {
            continue;
        }
        let Some(captures) = rule.pattern.captures(text) else {
            continue;
        };
        let Some(raw) = captures.get(1) else { continue };
        let Some(cleaned) = clean(raw.as_str(), rule.field.kind()) else {
            continue;
        };
        if cleaned.len() < 2 {
            continue;
        }
        apply(fields, rule.field, cleaned);
    }
}

fn is_filled(fields: &ExtractedFields, field: Field) -> bool {
    match field {
        Field::Surname | Field::Corporate => fields.surname.is_some(),
        Field::FirstName => fields.first_name.is_some(),
        Field::OtherNames => fields.other_names.is_some(),
        Field::Account => fields.account.is_some(),
    }
}

fn has_any_individual_name(fields: &ExtractedFields) -> bool {
    fields.surname.is_some() || fields.first_name.is_some() || fields.other_names.is_some()
}

fn apply(fields: &mut ExtractedFields, field: Field, value: String) {
    match field {
        Field::Surname => fields.surname = Some(value),
        Field::Corporate => {
            fields.surname = Some(value);
            fields.is_corporate = true;
        }
        Field::FirstName => fields.first_name = Some(value),
        Field::OtherNames => fields.other_names = Some(value),
        Field::Account => fields.account = Some(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_full_index_pdf_text() {
        let text = "SURNAME: SMITH\nFirst Name: JOHN\nOther Names: K\nAccount Number: 34007802837";
        let fields = parse(text);
        assert_eq!(fields.surname.as_deref(), Some("SMITH"));
        assert_eq!(fields.first_name.as_deref(), Some("JOHN"));
        assert_eq!(fields.other_names.as_deref(), Some("K"));
        assert_eq!(fields.account.as_deref(), Some("34007802837"));
        assert_eq!(fields.name().as_deref(), Some("SMITH JOHN K"));
    }

    #[test]
    fn s2_partial_name_only() {
        let fields = parse("surname (individual): DOE");
        assert_eq!(fields.surname.as_deref(), Some("DOE"));
        assert!(fields.account.is_none());
    }

    #[test]
    fn s3_failed_no_labels() {
        let fields = parse("lorem ipsum");
        assert!(!fields.has_name());
        assert!(!fields.has_account());
    }

    #[test]
    fn s6_corporate_entity_populates_surname_only() {
        let fields = parse("Name of Account Holder (corporate entities): ACME TRADING LTD");
        assert_eq!(fields.surname.as_deref(), Some("ACME TRADING LTD"));
        assert!(fields.is_corporate);
        assert!(fields.first_name.is_none());
        assert!(fields.other_names.is_none());
    }

    #[test]
    fn corporate_branch_is_skipped_once_individual_name_present() {
        let text = "SURNAME: SMITH\nName of Account Holder (corporate entities): ACME LTD";
        let fields = parse(text);
        assert_eq!(fields.surname.as_deref(), Some("SMITH"));
        assert!(!fields.is_corporate);
    }

    #[test]
    fn already_filled_fields_are_never_overwritten() {
        let text = "SURNAME: SMITH\nSURNAME: JONES";
        let fields = parse(text);
        assert_eq!(fields.surname.as_deref(), Some("SMITH"));
    }

    #[test]
    fn pass_two_catches_label_without_its_own_line() {
        let text = "preamble noise surname: DOE trailing noise";
        let fields = parse(text);
        assert_eq!(fields.surname.as_deref(), Some("DOE trailing noise"));
    }

    #[test]
    fn denylisted_capture_is_rejected() {
        let fields = parse("SURNAME: account");
        assert!(fields.surname.is_none());
    }

    #[test]
    fn account_capture_strips_internal_whitespace() {
        let fields = parse("Account Number: 340 078 028 37");
        assert_eq!(fields.account.as_deref(), Some("34007802837"));
    }

    #[test]
    fn simple_field_hybrid_lines_are_recognized() {
        let text = "surname: DOE\nfirst_name: JANE\nid_number: 99887766";
        let fields = parse(text);
        assert_eq!(fields.surname.as_deref(), Some("DOE"));
        assert_eq!(fields.first_name.as_deref(), Some("JANE"));
        assert_eq!(fields.account.as_deref(), Some("99887766"));
    }
}
