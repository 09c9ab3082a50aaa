//! Descriptor validation.
//!
//! Wallet readers reject a pass silently when `pass.json` breaks the format's
//! rules, so every rule is checked here and all violations are reported
//! together.

use super::descriptor::PassDescriptor;
use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

static PASS_TYPE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^pass\.([A-Za-z0-9]{10})\.[A-Za-z0-9][A-Za-z0-9.\-]*$")
        .expect("invalid pass type identifier pattern")
});

static TEAM_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{10}$").expect("invalid team identifier pattern"));

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("invalid color pattern"));

static FIELD_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("invalid field key pattern"));

/// One broken rule, addressed by its `pass.json` path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// # Errors
    ///
    /// Returns [`Error::Validation`] carrying every violation.
    pub fn into_result(self) -> Result<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self.violations))
        }
    }

    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(field, message));
    }
}

/// C0 and C1 control characters.
fn is_forbidden_char(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{1F}' | '\u{7F}'..='\u{9F}')
}

/// Checks `pass` against the wallet format rules.
pub fn validate(pass: &PassDescriptor) -> ValidationReport {
    let mut report = ValidationReport::default();

    if pass.format_version != 1 {
        report.push("formatVersion", format!("must be 1, got {}", pass.format_version));
    }

    match PASS_TYPE_IDENTIFIER.captures(&pass.pass_type_identifier) {
        Some(caps) => {
            if caps[1] != *pass.team_identifier {
                report.push(
                    "passTypeIdentifier",
                    format!(
                        "team segment {} does not match teamIdentifier {}",
                        &caps[1], pass.team_identifier
                    ),
                );
            }
        }
        None => report.push(
            "passTypeIdentifier",
            format!(
                "{:?} does not match pass.<10-character team id>.<suffix>",
                pass.pass_type_identifier
            ),
        ),
    }

    if !TEAM_IDENTIFIER.is_match(&pass.team_identifier) {
        report.push("teamIdentifier", "must be 10 alphanumeric characters");
    }

    for (name, value) in [
        ("serialNumber", &pass.serial_number),
        ("organizationName", &pass.organization_name),
        ("description", &pass.description),
    ] {
        if value.trim().is_empty() {
            report.push(name, "must not be empty");
        }
    }

    for (name, value) in [
        ("foregroundColor", &pass.foreground_color),
        ("backgroundColor", &pass.background_color),
        ("labelColor", &pass.label_color),
    ] {
        if !HEX_COLOR.is_match(value) {
            report.push(name, format!("{value:?} is not a #RRGGBB color"));
        }
    }

    let groups = [
        ("primaryFields", &pass.store_card.primary_fields),
        ("secondaryFields", &pass.store_card.secondary_fields),
        ("auxiliaryFields", &pass.store_card.auxiliary_fields),
        ("backFields", &pass.store_card.back_fields),
    ];
    let mut seen_keys = HashSet::new();
    for (group, fields) in groups {
        for (index, field) in fields.iter().enumerate() {
            let path = format!("storeCard.{group}[{index}]");
            if !FIELD_KEY.is_match(&field.key) {
                report.push(
                    format!("{path}.key"),
                    format!("{:?} may only contain letters, digits, '_' and '-'", field.key),
                );
            } else if !seen_keys.insert(field.key.as_str()) {
                report.push(format!("{path}.key"), format!("duplicate key {:?}", field.key));
            }
            if field.label.chars().any(is_forbidden_char) {
                report.push(format!("{path}.label"), "contains control characters");
            }
            if field.value.chars().any(is_forbidden_char) {
                report.push(format!("{path}.value"), "contains control characters");
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::{AccountSnapshot, PassField, PassTemplate};
    use crate::PassStamp;

    fn valid_pass() -> PassDescriptor {
        let account = AccountSnapshot::new(42, "alice", 75.5).unwrap();
        PassTemplate::new("pass.ABCDE12345.coffee", "ABCDE12345")
            .build(&account, PassStamp::from_millis(1))
    }

    fn fields_of(report: &ValidationReport) -> Vec<&str> {
        report.violations.iter().map(|v| v.field.as_str()).collect()
    }

    #[test]
    fn test_built_pass_is_valid() {
        let report = validate(&valid_pass());
        assert!(report.is_valid(), "{:?}", report.violations);
    }

    #[test]
    fn test_rejects_bad_pass_type_identifiers() {
        for id in [
            "com.example.coffee",
            "pass.SHORT.coffee",
            "pass.ABCDE12345",
            "pass.ABCDE-2345.coffee",
            "pass.ABCDE12345.",
        ] {
            let mut pass = valid_pass();
            pass.pass_type_identifier = id.into();
            let report = validate(&pass);
            assert!(fields_of(&report).contains(&"passTypeIdentifier"), "{id}");
        }
    }

    #[test]
    fn test_rejects_team_mismatch() {
        let mut pass = valid_pass();
        pass.team_identifier = "ZZZZZ99999".into();
        let report = validate(&pass);
        assert_eq!(fields_of(&report), vec!["passTypeIdentifier"]);
    }

    #[test]
    fn test_rejects_non_hex_colors() {
        let mut pass = valid_pass();
        pass.foreground_color = "rgb(255,255,255)".into();
        pass.background_color = "#FFF".into();
        pass.label_color = "#GG0000".into();
        let report = validate(&pass);
        assert_eq!(
            fields_of(&report),
            vec!["foregroundColor", "backgroundColor", "labelColor"]
        );
    }

    #[test]
    fn test_rejects_field_keys_with_spaces_or_punctuation() {
        let mut pass = valid_pass();
        pass.store_card.back_fields.push(PassField::new("bad key", "L", "v"));
        pass.store_card.back_fields.push(PassField::new("bad.key", "L", "v"));
        pass.store_card.back_fields.push(PassField::new("ok_key-2", "L", "v"));
        let report = validate(&pass);
        assert_eq!(report.violations.len(), 2);
        assert!(report.violations.iter().all(|v| v.field.ends_with(".key")));
    }

    #[test]
    fn test_rejects_duplicate_keys_across_groups() {
        let mut pass = valid_pass();
        pass.store_card.back_fields.push(PassField::new("balance", "L", "v"));
        let report = validate(&pass);
        assert_eq!(report.violations.len(), 1);
        assert!(report.violations[0].message.contains("duplicate"));
    }

    #[test]
    fn test_rejects_control_characters() {
        let mut pass = valid_pass();
        pass.store_card.secondary_fields[0].value = "ali\u{0007}ce".into();
        pass.store_card.back_fields[0].value = "line\u{85}break".into();
        let report = validate(&pass);
        assert_eq!(report.violations.len(), 2);
    }

    #[test]
    fn test_reports_all_violations_at_once() {
        let mut pass = valid_pass();
        pass.serial_number = String::new();
        pass.label_color = "red".into();
        pass.pass_type_identifier = "nope".into();
        let err = validate(&pass).into_result().unwrap_err();
        match err {
            Error::Validation(violations) => assert_eq!(violations.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}
