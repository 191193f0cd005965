//! Raw OSM elements produced by the stream reader.
//!
//! An [`OsmElement`] carries the attributes of one top-level `node`, `way` or
//! `relation` together with its `tag` and `nd` children. Attribute values are
//! kept verbatim; nothing is parsed or coerced at this stage.

use std::fmt;

/// Kind of a top-level OSM element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    /// A single coordinate (`<node>`).
    Node,
    /// An ordered path over nodes (`<way>`).
    Way,
    /// A grouping of other elements (`<relation>`).
    Relation,
}

impl ElementKind {
    /// Every kind the reader understands, in document-schema order.
    pub const ALL: [Self; 3] = [Self::Node, Self::Way, Self::Relation];

    /// Element name used in the XML document.
    #[must_use]
    pub const fn tag_name(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }

    /// Resolve an element name to a kind.
    ///
    /// # Examples
    /// ```
    /// use wrangle_core::ElementKind;
    ///
    /// assert_eq!(ElementKind::from_tag_name(b"way"), Some(ElementKind::Way));
    /// assert_eq!(ElementKind::from_tag_name(b"bounds"), None);
    /// ```
    #[must_use]
    pub fn from_tag_name(name: &[u8]) -> Option<Self> {
        match name {
            b"node" => Some(Self::Node),
            b"way" => Some(Self::Way),
            b"relation" => Some(Self::Relation),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// A `<tag k="..." v="..."/>` child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTag {
    /// Raw key (`k` attribute).
    pub key: String,
    /// Raw value (`v` attribute).
    pub value: String,
}

impl RawTag {
    /// Build a tag from its key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One complete top-level element with its children.
///
/// # Examples
/// ```
/// use wrangle_core::{ElementKind, OsmElement};
///
/// let way = OsmElement::new(ElementKind::Way)
///     .with_attribute("id", "2")
///     .with_node_ref("1")
///     .with_tag("highway", "residential");
///
/// assert_eq!(way.id(), Some("2"));
/// assert_eq!(way.node_refs(), ["1"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsmElement {
    kind: ElementKind,
    attributes: Vec<(String, String)>,
    tags: Vec<RawTag>,
    node_refs: Vec<String>,
}

impl OsmElement {
    /// Create an element without attributes or children.
    #[must_use]
    pub const fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: Vec::new(),
            tags: Vec::new(),
            node_refs: Vec::new(),
        }
    }

    /// Builder variant of [`OsmElement::push_attribute`].
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_attribute(name, value);
        self
    }

    /// Builder variant of [`OsmElement::push_tag`].
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_tag(RawTag::new(key, value));
        self
    }

    /// Builder variant of [`OsmElement::push_node_ref`].
    #[must_use]
    pub fn with_node_ref(mut self, node_id: impl Into<String>) -> Self {
        self.push_node_ref(node_id);
        self
    }

    /// Record an attribute. Later duplicates shadow earlier ones on lookup.
    pub fn push_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    /// Append a `tag` child.
    pub fn push_tag(&mut self, tag: RawTag) {
        self.tags.push(tag);
    }

    /// Append an `nd` reference in traversal order.
    pub fn push_node_ref(&mut self, node_id: impl Into<String>) {
        self.node_refs.push(node_id.into());
    }

    /// The element kind.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Look up an attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Shorthand for the `id` attribute.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// `tag` children in document order.
    #[must_use]
    pub fn tags(&self) -> &[RawTag] {
        &self.tags
    }

    /// `nd` references in document order.
    #[must_use]
    pub fn node_refs(&self) -> &[String] {
        &self.node_refs
    }
}
