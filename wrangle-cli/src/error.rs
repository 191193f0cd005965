//! Error types emitted by the wrangle CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use wrangle_data::{AuditError, LoadError, PipelineError, ReportError, RulesFileError};

/// Errors emitted by the wrangle CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without the leading dashes.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag naming the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag naming the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag naming the path.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The output directory could not be inspected due to an IO error.
    #[error("failed to inspect output directory {path:?}: {source}")]
    InspectOutputDirectory {
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The output directory exists but is not a directory.
    #[error("output directory {path:?} is not a directory")]
    OutputDirectoryNotDirectory {
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// The cleaning rules file could not be used.
    #[error(transparent)]
    CleaningRules(#[from] RulesFileError),
    /// Converting the XML extract into CSV failed.
    #[error("failed to convert OSM extract: {0}")]
    Convert(#[from] PipelineError),
    /// Loading the CSV tables into SQLite failed.
    #[error("failed to load CSV tables into {path:?}: {source}")]
    Load {
        /// Target database path.
        path: Utf8PathBuf,
        /// Underlying loader failure.
        #[source]
        source: LoadError,
    },
    /// Auditing the XML extract failed.
    #[error("failed to audit OSM extract: {0}")]
    Audit(#[from] AuditError),
    /// Running or writing the report failed.
    #[error("failed to report on {path:?}: {source}")]
    Report {
        /// Database the report ran against.
        path: Utf8PathBuf,
        /// Underlying reporting failure.
        #[source]
        source: ReportError,
    },
    /// Serialising the audit report failed.
    #[error("failed to serialise audit report: {0}")]
    SerialiseAuditReport(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write command output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
