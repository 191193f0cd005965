//! Audit accumulator for the rule-discovery pass.
//!
//! The audit pass looks at every element once and records the observations an
//! operator needs to extend [`CleaningRules`]: unexpected street types, phone
//! numbers outside the expected shape, postal codes outside the region and a
//! classification of tag keys. Counts live in the [`Auditor`] value and are
//! handed back as an [`AuditReport`]; nothing is global.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::clean::{
    CleaningRules, is_conforming_phone, is_conforming_postcode, normalise_street, street_type,
};
use crate::element::OsmElement;
use crate::shape::is_problem_key;

static LOWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_]*$").expect("lower key pattern is valid"));
static LOWER_COLON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z_]*:[a-z_]*$").expect("lower colon pattern is valid"));

/// Classification of a tag key's formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    /// Lowercase letters and underscores only.
    Lower,
    /// Two lowercase segments joined by a colon.
    LowerColon,
    /// Contains a disallowed character.
    Problemchars,
    /// Anything else.
    Other,
}

impl KeyType {
    /// Classify a raw key.
    ///
    /// # Examples
    /// ```
    /// use wrangle_core::KeyType;
    ///
    /// assert_eq!(KeyType::classify("amenity"), KeyType::Lower);
    /// assert_eq!(KeyType::classify("addr:street"), KeyType::LowerColon);
    /// assert_eq!(KeyType::classify("bad key?"), KeyType::Problemchars);
    /// assert_eq!(KeyType::classify("FIXME"), KeyType::Other);
    /// ```
    #[must_use]
    pub fn classify(key: &str) -> Self {
        if LOWER.is_match(key) {
            Self::Lower
        } else if LOWER_COLON.is_match(key) {
            Self::LowerColon
        } else if is_problem_key(key) {
            Self::Problemchars
        } else {
            Self::Other
        }
    }
}

/// Observations gathered by one audit pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    /// Occurrences per element name (`node`, `way`, `relation`, `tag`, `nd`).
    pub element_counts: BTreeMap<String, u64>,
    /// Tag keys per formatting class.
    pub key_types: BTreeMap<KeyType, u64>,
    /// Occurrences per trailing street-name token.
    pub street_type_counts: BTreeMap<String, u64>,
    /// Street names grouped by street types absent from the allow-list.
    pub unexpected_street_types: BTreeMap<String, BTreeSet<String>>,
    /// Proposed rewrites for flagged street names.
    pub street_fixes: BTreeMap<String, String>,
    /// `contact:phone` values outside the `+1 NNN NNN NNNN` shape.
    pub nonconforming_phones: Vec<String>,
    /// Occurrences per non-conforming `addr:postcode` value.
    pub nonconforming_postcodes: BTreeMap<String, u64>,
}

/// Folds elements into an [`AuditReport`].
///
/// # Examples
/// ```
/// use wrangle_core::{Auditor, CleaningRules, ElementKind, OsmElement};
///
/// let rules = CleaningRules::default();
/// let mut auditor = Auditor::new(&rules);
/// auditor.observe(
///     &OsmElement::new(ElementKind::Node)
///         .with_tag("addr:street", "Main Ave")
///         .with_tag("addr:postcode", "IL"),
/// );
/// let report = auditor.finish();
///
/// assert!(report.unexpected_street_types.contains_key("Ave"));
/// assert_eq!(report.street_fixes.get("Main Ave").map(String::as_str), Some("Main Avenue"));
/// assert_eq!(report.nonconforming_postcodes.get("IL"), Some(&1));
/// ```
#[derive(Debug)]
pub struct Auditor<'r> {
    rules: &'r CleaningRules,
    report: AuditReport,
}

impl<'r> Auditor<'r> {
    /// Start an audit against the supplied rules.
    #[must_use]
    pub fn new(rules: &'r CleaningRules) -> Self {
        Self {
            rules,
            report: AuditReport::default(),
        }
    }

    /// Record one element and its children.
    pub fn observe(&mut self, element: &OsmElement) {
        let counts = &mut self.report.element_counts;
        bump(counts, element.kind().tag_name());
        for _ in element.tags() {
            bump(counts, "tag");
        }
        for _ in element.node_refs() {
            bump(counts, "nd");
        }

        for tag in element.tags() {
            *self
                .report
                .key_types
                .entry(KeyType::classify(&tag.key))
                .or_insert(0) += 1;
            match tag.key.as_str() {
                "addr:street" => self.observe_street(&tag.value),
                "contact:phone" => self.observe_phone(&tag.value),
                "addr:postcode" => self.observe_postcode(&tag.value),
                _ => {}
            }
        }
    }

    /// Finish the pass and return the collected observations.
    #[must_use]
    pub fn finish(self) -> AuditReport {
        self.report
    }

    fn observe_street(&mut self, name: &str) {
        let Some(suffix) = street_type(name) else {
            return;
        };
        bump(&mut self.report.street_type_counts, suffix);
        if self.rules.is_expected_street_type(suffix) {
            return;
        }
        self.report
            .unexpected_street_types
            .entry(suffix.to_owned())
            .or_default()
            .insert(name.to_owned());
        let fixed = normalise_street(name, self.rules);
        if fixed != name {
            self.report.street_fixes.insert(name.to_owned(), fixed);
        }
    }

    fn observe_phone(&mut self, number: &str) {
        if !is_conforming_phone(number) {
            self.report.nonconforming_phones.push(number.to_owned());
        }
    }

    fn observe_postcode(&mut self, code: &str) {
        if !is_conforming_postcode(code) {
            bump(&mut self.report.nonconforming_postcodes, code);
        }
    }
}

fn bump(counts: &mut BTreeMap<String, u64>, key: &str) {
    match counts.get_mut(key) {
        Some(count) => *count += 1,
        None => {
            counts.insert(key.to_owned(), 1);
        }
    }
}
