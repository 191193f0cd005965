//! Declarative schema validation for shaped records.
//!
//! A [`RecordSchema`] lists, per table, the fields a row must carry, their
//! types and whether string values may be coerced into that type. Validation
//! stops at the first offending field and reports the table it belongs to.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::shape::{AttributeEntry, PrimaryAttributes, ShapedRecord, WayMembership};
use crate::table::Table;

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit floating point number.
    Float,
    /// Free text.
    String,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
        })
    }
}

/// Rule for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    /// Column name.
    pub name: &'static str,
    /// Declared type.
    pub field_type: FieldType,
    /// Whether absence is a violation.
    pub required: bool,
    /// Whether textual values are converted before the type check.
    pub coerce: bool,
}

impl FieldRule {
    /// A required field coerced into `field_type`.
    #[must_use]
    pub const fn coerced(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
            coerce: true,
        }
    }

    /// A required text field.
    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::String,
            required: true,
            coerce: false,
        }
    }

    fn check(&self, value: Option<FieldValue<'_>>) -> Vec<String> {
        let Some(value) = value else {
            return if self.required {
                vec!["required field".to_owned()]
            } else {
                Vec::new()
            };
        };
        match (value, self.field_type) {
            (FieldValue::Text(_), FieldType::String)
            | (FieldValue::Ordinal(_), FieldType::Integer) => Vec::new(),
            (FieldValue::Ordinal(_), FieldType::Float | FieldType::String) => {
                vec![format!("must be of {} type", self.field_type)]
            }
            (FieldValue::Text(text), field_type) if self.coerce => coerce(text, field_type),
            (FieldValue::Text(_), field_type) => vec![format!("must be of {field_type} type")],
        }
    }
}

fn coerce(text: &str, field_type: FieldType) -> Vec<String> {
    let outcome = match field_type {
        FieldType::Integer => text.parse::<i64>().map(|_| ()).map_err(|err| err.to_string()),
        FieldType::Float => text.parse::<f64>().map(|_| ()).map_err(|err| err.to_string()),
        FieldType::String => Ok(()),
    };
    match outcome {
        Ok(()) => Vec::new(),
        Err(reason) => vec![
            format!("field '{text}' cannot be coerced: {reason}"),
            format!("must be of {field_type} type"),
        ],
    }
}

/// Field rules for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table the rules apply to.
    pub table: Table,
    /// Rules in column order.
    pub fields: Vec<FieldRule>,
}

/// A field value as seen by the validator.
#[derive(Debug, Clone, Copy)]
enum FieldValue<'a> {
    Text(&'a str),
    Ordinal(usize),
}

trait SchemaRow {
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

impl SchemaRow for PrimaryAttributes {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        self.get(name).map(FieldValue::Text)
    }
}

impl SchemaRow for AttributeEntry {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => self.id.as_deref().map(FieldValue::Text),
            "key" => Some(FieldValue::Text(&self.key)),
            "value" => Some(FieldValue::Text(&self.value)),
            "type" => Some(FieldValue::Text(&self.namespace)),
            _ => None,
        }
    }
}

impl SchemaRow for WayMembership {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "id" => self.way_id.as_deref().map(FieldValue::Text),
            "node_id" => Some(FieldValue::Text(&self.node_id)),
            "position" => Some(FieldValue::Ordinal(self.position)),
            _ => None,
        }
    }
}

/// Raised when a shaped record does not conform to its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "element of type '{}' has the following errors: {field}: {}",
    .table.schema_name(),
    .errors.join("; ")
)]
pub struct SchemaViolation {
    /// Table whose row failed.
    pub table: Table,
    /// Zero-based row index within the record, for list tables.
    pub row: Option<usize>,
    /// First offending field.
    pub field: String,
    /// Errors reported for that field.
    pub errors: Vec<String>,
}

/// Schema for every table a shaped record can populate.
///
/// # Examples
/// ```
/// use wrangle_core::{ElementKind, OsmElement, RecordSchema, RecordShaper, Table};
///
/// let schema = RecordSchema::default();
/// let record = RecordShaper::default()
///     .shape(&OsmElement::new(ElementKind::Node).with_attribute("id", "1"))
///     .expect("nodes are shaped");
///
/// let violation = schema.validate(&record).expect_err("lat is required");
/// assert_eq!(violation.table, Table::Nodes);
/// assert_eq!(violation.field, "lat");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    tables: BTreeMap<Table, TableSchema>,
}

impl Default for RecordSchema {
    fn default() -> Self {
        use FieldType::{Float, Integer};

        let tag_rules = || {
            vec![
                FieldRule::coerced("id", Integer),
                FieldRule::text("key"),
                FieldRule::text("value"),
                FieldRule::text("type"),
            ]
        };
        Self::new([
            TableSchema {
                table: Table::Nodes,
                fields: vec![
                    FieldRule::coerced("id", Integer),
                    FieldRule::coerced("lat", Float),
                    FieldRule::coerced("lon", Float),
                    FieldRule::text("user"),
                    FieldRule::coerced("uid", Integer),
                    FieldRule::text("version"),
                    FieldRule::coerced("changeset", Integer),
                    FieldRule::text("timestamp"),
                ],
            },
            TableSchema {
                table: Table::NodeTags,
                fields: tag_rules(),
            },
            TableSchema {
                table: Table::Ways,
                fields: vec![
                    FieldRule::coerced("id", Integer),
                    FieldRule::text("user"),
                    FieldRule::coerced("uid", Integer),
                    FieldRule::text("version"),
                    FieldRule::coerced("changeset", Integer),
                    FieldRule::text("timestamp"),
                ],
            },
            TableSchema {
                table: Table::WayNodes,
                fields: vec![
                    FieldRule::coerced("id", Integer),
                    FieldRule::coerced("node_id", Integer),
                    FieldRule::coerced("position", Integer),
                ],
            },
            TableSchema {
                table: Table::WayTags,
                fields: tag_rules(),
            },
        ])
    }
}

impl RecordSchema {
    /// Build a schema from per-table rules. Tables without rules accept any
    /// row.
    pub fn new(tables: impl IntoIterator<Item = TableSchema>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|schema| (schema.table, schema))
                .collect(),
        }
    }

    /// Rules declared for a table.
    #[must_use]
    pub fn table(&self, table: Table) -> Option<&TableSchema> {
        self.tables.get(&table)
    }

    /// Validate every row of a shaped record.
    pub fn validate(&self, record: &ShapedRecord) -> Result<(), SchemaViolation> {
        match record {
            ShapedRecord::Node(node) => {
                self.validate_row(Table::Nodes, None, &node.attributes)?;
                self.validate_rows(Table::NodeTags, &node.tags)
            }
            ShapedRecord::Way(way) => {
                self.validate_row(Table::Ways, None, &way.attributes)?;
                self.validate_rows(Table::WayNodes, &way.nodes)?;
                self.validate_rows(Table::WayTags, &way.tags)
            }
        }
    }

    fn validate_rows<R: SchemaRow>(&self, table: Table, rows: &[R]) -> Result<(), SchemaViolation> {
        rows.iter()
            .enumerate()
            .try_for_each(|(index, row)| self.validate_row(table, Some(index), row))
    }

    fn validate_row<R: SchemaRow>(
        &self,
        table: Table,
        row_index: Option<usize>,
        row: &R,
    ) -> Result<(), SchemaViolation> {
        let Some(schema) = self.tables.get(&table) else {
            return Ok(());
        };
        for rule in &schema.fields {
            let errors = rule.check(row.field(rule.name));
            if !errors.is_empty() {
                return Err(SchemaViolation {
                    table,
                    row: row_index,
                    field: rule.name.to_owned(),
                    errors,
                });
            }
        }
        Ok(())
    }
}
