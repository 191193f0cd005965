//! Shape raw elements into table rows.
//!
//! The shaper splits an element into its primary attributes, its attribute
//! entries and, for ways, its membership entries. Street names and phone
//! numbers are cleaned on the way through. Nothing is coerced here; values
//! stay verbatim strings until the schema validator or the loader reads them.

use crate::clean::{CleaningRules, normalise_phone, normalise_street};
use crate::element::{ElementKind, OsmElement};
use crate::table::{NODE_FIELDS, WAY_FIELDS};

/// Namespace given to keys without a `namespace:` prefix.
pub const DEFAULT_TAG_TYPE: &str = "regular";

const STREET_KEY: &str = "addr:street";
const PHONE_KEY: &str = "contact:phone";

/// Characters that disqualify a tag key.
const PROBLEM_CHARS: [char; 15] = [
    '=', '+', '/', '&', '<', '>', ';', '\'', '"', '?', '%', '#', '$', '@', ',',
];

/// Whether a raw key contains a disallowed character or whitespace.
///
/// # Examples
/// ```
/// use wrangle_core::is_problem_key;
///
/// assert!(is_problem_key("bad key?"));
/// assert!(is_problem_key("name.en"));
/// assert!(!is_problem_key("addr:street"));
/// ```
#[must_use]
pub fn is_problem_key(key: &str) -> bool {
    key.chars()
        .any(|ch| ch == '.' || ch.is_whitespace() || PROBLEM_CHARS.contains(&ch))
}

/// Split a raw key into `(namespace, key)`.
///
/// Only the first colon separates the namespace; both halves must be
/// non-empty, otherwise the whole key is kept under [`DEFAULT_TAG_TYPE`].
///
/// # Examples
/// ```
/// use wrangle_core::split_key;
///
/// assert_eq!(split_key("addr:street"), ("addr", "street"));
/// assert_eq!(split_key("a:b:c"), ("a", "b:c"));
/// assert_eq!(split_key("amenity"), ("regular", "amenity"));
/// ```
#[must_use]
pub fn split_key(raw: &str) -> (&str, &str) {
    match raw.split_once(':') {
        Some((namespace, key)) if !namespace.is_empty() && !key.is_empty() => (namespace, key),
        _ => (DEFAULT_TAG_TYPE, raw),
    }
}

/// One row of an attribute table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEntry {
    /// Identifier of the owning node or way.
    pub id: Option<String>,
    /// Key with its namespace removed.
    pub key: String,
    /// Cleaned value.
    pub value: String,
    /// Namespace of the key (`type` column).
    pub namespace: String,
}

/// One row of the way-membership table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WayMembership {
    /// Identifier of the way.
    pub way_id: Option<String>,
    /// Identifier of the referenced node.
    pub node_id: String,
    /// Zero-based ordinal within the way.
    pub position: usize,
}

/// Primary attributes in table column order. Absent source attributes stay
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryAttributes {
    fields: Vec<(&'static str, Option<String>)>,
}

impl PrimaryAttributes {
    fn copy_from(element: &OsmElement, names: &[&'static str]) -> Self {
        let fields = names
            .iter()
            .map(|name| (*name, element.attribute(name).map(str::to_owned)))
            .collect();
        Self { fields }
    }

    /// Value of a field, if the source carried it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .and_then(|(_, value)| value.as_deref())
    }

    /// Iterate over `(field, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<&str>)> + '_ {
        self.fields
            .iter()
            .map(|(field, value)| (*field, value.as_deref()))
    }
}

/// A shaped `node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedNode {
    /// Row for the `nodes` table.
    pub attributes: PrimaryAttributes,
    /// Rows for the `nodes_tags` table.
    pub tags: Vec<AttributeEntry>,
}

/// A shaped `way`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedWay {
    /// Row for the `ways` table.
    pub attributes: PrimaryAttributes,
    /// Rows for the `ways_nodes` table.
    pub nodes: Vec<WayMembership>,
    /// Rows for the `ways_tags` table.
    pub tags: Vec<AttributeEntry>,
}

/// Output of [`RecordShaper::shape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapedRecord {
    /// A shaped node.
    Node(ShapedNode),
    /// A shaped way.
    Way(ShapedWay),
}

/// Turns raw elements into table rows using a fixed set of cleaning rules.
///
/// # Examples
/// ```
/// use wrangle_core::{CleaningRules, ElementKind, OsmElement, RecordShaper, ShapedRecord};
///
/// let shaper = RecordShaper::new(CleaningRules::default());
/// let node = OsmElement::new(ElementKind::Node)
///     .with_attribute("id", "1")
///     .with_tag("addr:street", "123 Main Ave");
///
/// let Some(ShapedRecord::Node(shaped)) = shaper.shape(&node) else {
///     panic!("nodes shape into node records");
/// };
/// assert_eq!(shaped.tags[0].key, "street");
/// assert_eq!(shaped.tags[0].value, "123 Main Avenue");
/// assert_eq!(shaped.tags[0].namespace, "addr");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordShaper {
    rules: CleaningRules,
}

impl RecordShaper {
    /// Build a shaper over the supplied rules.
    #[must_use]
    pub const fn new(rules: CleaningRules) -> Self {
        Self { rules }
    }

    /// Rules used for street normalisation.
    #[must_use]
    pub const fn rules(&self) -> &CleaningRules {
        &self.rules
    }

    /// Shape one element.
    ///
    /// Returns `None` only for elements that are neither nodes nor ways.
    #[must_use]
    pub fn shape(&self, element: &OsmElement) -> Option<ShapedRecord> {
        match element.kind() {
            ElementKind::Node => Some(ShapedRecord::Node(ShapedNode {
                attributes: PrimaryAttributes::copy_from(element, &NODE_FIELDS),
                tags: self.attribute_entries(element),
            })),
            ElementKind::Way => Some(ShapedRecord::Way(ShapedWay {
                attributes: PrimaryAttributes::copy_from(element, &WAY_FIELDS),
                nodes: way_memberships(element),
                tags: self.attribute_entries(element),
            })),
            ElementKind::Relation => None,
        }
    }

    fn attribute_entries(&self, element: &OsmElement) -> Vec<AttributeEntry> {
        let owner = element.id();
        element
            .tags()
            .iter()
            .filter(|tag| !tag.key.is_empty() && !is_problem_key(&tag.key))
            .map(|tag| {
                let (namespace, key) = split_key(&tag.key);
                AttributeEntry {
                    id: owner.map(str::to_owned),
                    key: key.to_owned(),
                    value: self.clean_value(&tag.key, &tag.value),
                    namespace: namespace.to_owned(),
                }
            })
            .collect()
    }

    fn clean_value(&self, key: &str, value: &str) -> String {
        match key {
            STREET_KEY => normalise_street(value, &self.rules),
            PHONE_KEY => normalise_phone(value),
            _ => value.to_owned(),
        }
    }
}

fn way_memberships(element: &OsmElement) -> Vec<WayMembership> {
    let way_id = element.id();
    element
        .node_refs()
        .iter()
        .enumerate()
        .map(|(position, node_id)| WayMembership {
            way_id: way_id.map(str::to_owned),
            node_id: node_id.clone(),
            position,
        })
        .collect()
}
