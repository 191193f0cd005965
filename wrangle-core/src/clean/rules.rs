use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_EXPECTED_STREET_TYPES: [&str; 25] = [
    "Street",
    "Avenue",
    "Boulevard",
    "Drive",
    "Court",
    "Place",
    "Square",
    "Lane",
    "Road",
    "Park",
    "Access",
    "Market",
    "Trail",
    "Parkway",
    "Commons",
    "Way",
    "Circle",
    "Trace",
    "Plaza",
    "Terrace",
    "Walk",
    "Riverwalk",
    "voltage=138000",
    "West",
    "South",
];

/// Static lookup tables that drive street-name cleaning and auditing.
///
/// Missing fields in a JSON document fall back to the built-in tables, so a
/// rules file only needs to list what it overrides.
///
/// # Examples
/// ```
/// use wrangle_core::CleaningRules;
///
/// let rules = CleaningRules::from_json_str(r#"{"abbreviations": {"St": "Street"}}"#)?;
/// assert_eq!(rules.abbreviations.get("St").map(String::as_str), Some("Street"));
/// assert!(rules.corrected_names.contains_key("Sangamon"));
/// # Ok::<(), wrangle_core::CleaningRulesError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningRules {
    /// Token-level replacements, e.g. `Ave → Avenue`.
    pub abbreviations: BTreeMap<String, String>,
    /// Whole-name replacements for names mistaken for a street type.
    pub corrected_names: BTreeMap<String, String>,
    /// Street-type suffixes that are not flagged by the audit pass.
    pub expected_street_types: BTreeSet<String>,
}

impl Default for CleaningRules {
    fn default() -> Self {
        Self {
            abbreviations: BTreeMap::from([("Ave".to_owned(), "Avenue".to_owned())]),
            corrected_names: BTreeMap::from([(
                "Sangamon".to_owned(),
                "Sangamon Street".to_owned(),
            )]),
            expected_street_types: DEFAULT_EXPECTED_STREET_TYPES
                .iter()
                .map(|street_type| (*street_type).to_owned())
                .collect(),
        }
    }
}

impl CleaningRules {
    /// Parse rules from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, CleaningRulesError> {
        serde_json::from_str(json).map_err(|source| CleaningRulesError::Parse { source })
    }

    /// Whether the audit pass accepts this street type.
    #[must_use]
    pub fn is_expected_street_type(&self, street_type: &str) -> bool {
        self.expected_street_types.contains(street_type)
    }
}

/// Errors raised when loading [`CleaningRules`].
#[derive(Debug, Error)]
pub enum CleaningRulesError {
    /// The rules document was not valid JSON for the rules shape.
    #[error("failed to parse cleaning rules")]
    Parse {
        /// Source error produced by `serde_json`.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_carry_the_extract_tables() {
        let rules = CleaningRules::default();
        assert_eq!(
            rules.abbreviations.get("Ave").map(String::as_str),
            Some("Avenue")
        );
        assert!(rules.is_expected_street_type("Riverwalk"));
        assert!(!rules.is_expected_street_type("Ave"));
        assert_eq!(rules.expected_street_types.len(), 25);
    }

    #[rstest]
    fn empty_document_keeps_defaults() {
        let rules = CleaningRules::from_json_str("{}").expect("parse empty rules");
        assert_eq!(rules, CleaningRules::default());
    }

    #[rstest]
    fn explicit_tables_replace_defaults() {
        let rules = CleaningRules::from_json_str(
            r#"{"corrected_names": {}, "expected_street_types": ["Street"]}"#,
        )
        .expect("parse rules");
        assert!(rules.corrected_names.is_empty());
        assert!(rules.is_expected_street_type("Street"));
        assert!(!rules.is_expected_street_type("Avenue"));
        assert_eq!(rules.abbreviations.len(), 1, "abbreviations keep defaults");
    }

    #[rstest]
    fn malformed_document_is_rejected() {
        let err = CleaningRules::from_json_str(r#"{"abbreviations": ["Ave"]}"#)
            .expect_err("list is not a mapping");
        assert!(matches!(err, CleaningRulesError::Parse { .. }));
    }
}
