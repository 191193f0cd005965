//! Core domain logic for the Wrangle OpenStreetMap pipeline.
//!
//! Responsibilities:
//! - Model raw OSM elements as they leave the stream reader.
//! - Clean street names, phone numbers and postal codes.
//! - Shape elements into table rows and validate them against a schema.
//! - Accumulate audit observations for the rule-discovery pass.
//!
//! Boundaries:
//! - No I/O lives here; readers, writers and SQLite sit in `wrangle-data`.
//!
//! Invariants:
//! - Cleaners are total and never fail.
//! - No global mutable state.

#![forbid(unsafe_code)]

pub mod audit;
pub mod clean;
pub mod element;
pub mod schema;
pub mod shape;
pub mod table;

pub use audit::{AuditReport, Auditor, KeyType};
pub use clean::{
    CleaningRules, CleaningRulesError, is_conforming_phone, is_conforming_postcode,
    normalise_phone, normalise_street, street_type,
};
pub use element::{ElementKind, OsmElement, RawTag};
pub use schema::{FieldRule, FieldType, RecordSchema, SchemaViolation, TableSchema};
pub use shape::{
    AttributeEntry, DEFAULT_TAG_TYPE, PrimaryAttributes, RecordShaper, ShapedNode, ShapedRecord,
    ShapedWay, WayMembership, is_problem_key, split_key,
};
pub use table::{PerTable, Table};
