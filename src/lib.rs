//! Facade crate for the wrangle OpenStreetMap cleaning pipeline.
//!
//! This crate re-exports the pure domain types (element model, cleaners,
//! shaper, schema and audit accumulator) and, behind the `store-sqlite`
//! feature, the streaming reader, CSV emitter, SQLite loader and reporting
//! queries.

#![forbid(unsafe_code)]

pub use wrangle_core::{
    AuditReport, Auditor, CleaningRules, CleaningRulesError, ElementKind, OsmElement, PerTable,
    RawTag, RecordSchema, RecordShaper, SchemaViolation, ShapedRecord, Table,
};

#[cfg(feature = "store-sqlite")]
pub use wrangle_data::{
    AuditError, ConvertOptions, ConvertSummary, LoadError, PipelineError, ReportError,
    ReportSection, audit_map, load_csv_files, open_report_database, output_paths, process_map,
    run_report, write_report,
};
