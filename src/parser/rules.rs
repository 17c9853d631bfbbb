//! Named rule table for the field parser (spec §4.4, §9 "regex soup"
//! re-architecture): each rule names a target field, a scope, and the
//! pattern it matches, following the `LazyLock<Vec<(Regex, ...)>>` table
//! pattern the teacher uses for date detection.

use std::sync::LazyLock;

use regex::Regex;

use super::clean::FieldKind;

/// The field a rule, once matched, populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Surname,
    FirstName,
    OtherNames,
    Corporate,
    Account,
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::Account => FieldKind::Account,
            _ => FieldKind::Name,
        }
    }

    /// Whether Pass 2's whole-text fallback applies to this field. Per
    /// §4.4, only the three name-ish fields get a global fallback pass;
    /// account and corporate do not.
    pub fn has_global_fallback(&self) -> bool {
        matches!(self, Field::Surname | Field::FirstName | Field::OtherNames)
    }
}

pub struct Rule {
    pub field: Field,
    pub pattern: Regex,
}

fn rule(field: Field, pattern: &str) -> Rule {
    Rule {
        field,
        pattern: Regex::new(pattern).expect("static parser rule pattern is valid regex"),
    }
}

/// The full ordered rule table, flattened across field groups in exactly the
/// order spec §4.4 Pass 1 lists them: surname variants, first-name
/// variants, other-names variants, corporate entity, account variants.
/// Line-scoped matching walks this table in order for every line, filling
/// whichever target field is not yet set.
pub static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        // Surname variants.
        rule(Field::Surname, r"(?i)surname\s*\(\s*individual\s*\)\s*:\s*(.+)"),
        rule(Field::Surname, r"(?i)^\s*\d+\.\s*surname(?:\s*\(individual\))?\s*:\s*(.+)"),
        rule(Field::Surname, r"(?i)sumame\s*/\s*company\s*name\s*:\s*(.+)"),
        rule(Field::Surname, r"(?i)\bsurname\b\s*:\s*(.+)"),
        rule(Field::Surname, r"(?i)^surname:\s*(.+)$"),
        // First-name variants.
        rule(Field::FirstName, r"(?i)first\s*name\s*:\s*(.+)"),
        rule(Field::FirstName, r"(?i)^first_name:\s*(.+)$"),
        // Other-names variants.
        rule(Field::OtherNames, r"(?i)other\s*name\(s\)\s*:\s*(.+)"),
        rule(Field::OtherNames, r"(?i)other\s*names\s*:\s*(.+)"),
        rule(Field::OtherNames, r"(?i)^other_names:\s*(.+)$"),
        // Corporate entity (only considered by the caller if no individual
        // field has matched yet).
        rule(
            Field::Corporate,
            r"(?i)name\s*of\s*account\s*holder\s*\(corporate\s*entities\)\s*:\s*(.+)",
        ),
        // Account variants.
        rule(Field::Account, r"(?i)csd\s*number\s*:\s*(.+)"),
        rule(Field::Account, r"(?i)account\s*no\s*:\s*(.+)"),
        rule(Field::Account, r"(?i)account\s*number\s*:\s*(.+)"),
        rule(
            Field::Account,
            r"(?i)banking\s*information.*?account\s*number\s*:\s*(.+)",
        ),
        rule(Field::Account, r"(?i)^\s*\d+\.\s*id\s*number\s*:\s*(.+)"),
        rule(Field::Account, r"(?i)\bnumber\b[:\s]+([0-9][0-9A-Za-z\s]{2,})"),
        rule(Field::Account, r"(?i)client\s*csd\s*securities\s*account\s*:\s*(.+)"),
        rule(
            Field::Account,
            r"(?i)^(?:id_number|account_number|bank_account):\s*(.+)$",
        ),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_table_is_nonempty_and_compiles() {
        assert!(RULES.len() >= 15);
    }

    #[test]
    fn surname_rule_matches_labeled_line() {
        let hit = RULES
            .iter()
            .find(|r| r.field == Field::Surname && r.pattern.is_match("SURNAME: SMITH"));
        assert!(hit.is_some());
    }

    #[test]
    fn only_name_fields_have_global_fallback() {
        assert!(Field::Surname.has_global_fallback());
        assert!(!Field::Account.has_global_fallback());
        assert!(!Field::Corporate.has_global_fallback());
    }
}
