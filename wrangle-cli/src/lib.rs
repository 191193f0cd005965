//! Command-line interface for converting OpenStreetMap extracts.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use std::io::Write;

mod audit;
mod convert;
mod error;
mod ingest;
mod load;
mod report;

pub use error::CliError;

use audit::AuditArgs;
use convert::ConvertArgs;
use ingest::IngestArgs;
use load::LoadArgs;
use report::ReportArgs;

const ARG_OSM_XML: &str = "osm-xml";
const ARG_OUTPUT_DIR: &str = "output-dir";
const ARG_VALIDATE: &str = "validate";
const ARG_CLEANING_RULES: &str = "cleaning-rules";
const ARG_DATABASE: &str = "database";
const ENV_CONVERT_OSM_XML: &str = "WRANGLE_CMDS_CONVERT_OSM_XML";
const ENV_INGEST_OSM_XML: &str = "WRANGLE_CMDS_INGEST_OSM_XML";
const ENV_INGEST_DATABASE: &str = "WRANGLE_CMDS_INGEST_DATABASE";
const ENV_LOAD_DATABASE: &str = "WRANGLE_CMDS_LOAD_DATABASE";
const ENV_AUDIT_OSM_XML: &str = "WRANGLE_CMDS_AUDIT_OSM_XML";
const ENV_REPORT_DATABASE: &str = "WRANGLE_CMDS_REPORT_DATABASE";

/// Directory used for the CSV tables when none is configured.
const DEFAULT_OUTPUT_DIR: &str = ".";

/// Run the wrangle CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &mut stdout)
}

fn dispatch(command: Command, out: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Convert(args) => convert::run_convert(args).map(|_| ()),
        Command::Load(args) => load::run_load(args).map(|_| ()),
        Command::Ingest(args) => ingest::run_ingest(args),
        Command::Audit(args) => audit::run_audit(args, out),
        Command::Report(args) => report::run_report(args, out),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "wrangle",
    about = "Clean an OpenStreetMap XML extract into CSV tables and SQLite",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert an OSM XML extract into five CSV tables.
    Convert(ConvertArgs),
    /// Load previously written CSV tables into SQLite.
    Load(LoadArgs),
    /// Convert an extract and load the tables in one step.
    Ingest(IngestArgs),
    /// Survey tag keys, street names, phones and postcodes in an extract.
    Audit(AuditArgs),
    /// Run the reporting queries against a loaded database.
    Report(ReportArgs),
}

/// Require `path` to name an existing regular file.
fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match wrangle_fs::path_metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Reject an output directory that exists as something other than a
/// directory. A missing directory is created later by the writer.
fn require_output_dir(path: &Utf8Path) -> Result<(), CliError> {
    match wrangle_fs::path_metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(CliError::OutputDirectoryNotDirectory {
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CliError::InspectOutputDirectory {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests;
