//! Report command implementation for the wrangle CLI.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use wrangle_data::{ReportError, open_report_database, run_report as run_queries, write_report};

use crate::{ARG_DATABASE, CliError, ENV_REPORT_DATABASE, require_existing};

/// CLI arguments for the `report` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "report",
    about = "Print the overview queries for a loaded database"
)]
#[ortho_config(prefix = "WRANGLE")]
pub(crate) struct ReportArgs {
    /// SQLite database produced by `load` or `ingest`.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

pub(crate) fn run_report(args: ReportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let database = merged.database.ok_or(CliError::MissingArgument {
        field: ARG_DATABASE,
        env: ENV_REPORT_DATABASE,
    })?;
    require_existing(&database, ARG_DATABASE)?;
    report_database(&database, writer).map_err(|source| CliError::Report {
        path: database,
        source,
    })
}

fn report_database(database: &Utf8Path, writer: &mut dyn Write) -> Result<(), ReportError> {
    let connection = open_report_database(database)?;
    let sections = run_queries(&connection)?;
    write_report(&sections, writer)
}
