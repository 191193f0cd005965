//! I/O adapters for the Wrangle OpenStreetMap pipeline.
//!
//! Responsibilities:
//! - Stream elements out of OSM XML (plain or bzip2-compressed).
//! - Drive the conversion pass that writes the five CSV tables.
//! - Bulk load those tables into SQLite and run the reporting catalogue.
//! - Run the audit pass over a file and load cleaning rules from JSON.
//!
//! Boundaries:
//! - Do not encode cleaning or shaping rules (live in `wrangle-core`).
//! - Everything here is synchronous and single-threaded.
//!
//! Invariants:
//! - Files and connections are scoped values, released on every exit path.
//! - No global mutable state.
#![forbid(unsafe_code)]

pub mod audit;
pub mod emit;
pub mod load;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod rules;

pub use audit::{AuditError, audit_map, audit_stream};
pub use emit::{EmitError, TabularEmitter, output_paths};
pub use load::{LoadError, create_table_sql, load_csv_files, load_csv_tables};
pub use pipeline::{
    CONVERTED_KINDS, ConvertOptions, ConvertSummary, PipelineError, convert_stream, process_map,
};
pub use reader::{
    ElementStream, ElementStreamError, FileElementStream, is_bz2, open_element_stream,
};
pub use report::{
    REPORT_QUERIES, ReportError, ReportQuery, ReportSection, open_report_database, run_query,
    run_report, write_report,
};
pub use rules::{RulesFileError, load_cleaning_rules};
