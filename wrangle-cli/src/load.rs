//! Load command implementation for the wrangle CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wrangle_core::PerTable;
use wrangle_data::{load_csv_files, output_paths};

use crate::{
    ARG_DATABASE, ARG_OUTPUT_DIR, CliError, DEFAULT_OUTPUT_DIR, ENV_LOAD_DATABASE,
    require_existing,
};

/// CLI arguments for the `load` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "load",
    long_about = "Create the nodes, nodes_tags, ways, ways_nodes and ways_tags \
                 tables in a SQLite database, replacing any previous copies, \
                 and bulk-insert the CSV tables written by `convert`.",
    about = "Load CSV tables into a SQLite database"
)]
#[ortho_config(prefix = "WRANGLE")]
pub(crate) struct LoadArgs {
    /// Directory holding the CSV tables (defaults to the working directory).
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// SQLite database file to create or update.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl LoadArgs {
    pub(crate) fn into_config(self) -> Result<LoadConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        LoadConfig::try_from(merged)
    }
}

/// Resolved `load` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoadConfig {
    /// CSV file per table.
    pub(crate) sources: PerTable<Utf8PathBuf>,
    /// Target database.
    pub(crate) database: Utf8PathBuf,
}

impl LoadConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        for (_, path) in self.sources.iter() {
            require_existing(path, ARG_OUTPUT_DIR)?;
        }
        Ok(())
    }
}

impl TryFrom<LoadArgs> for LoadConfig {
    type Error = CliError;

    fn try_from(args: LoadArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_LOAD_DATABASE,
        })?;
        let output_dir = args
            .output_dir
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR));
        Ok(Self {
            sources: output_paths(&output_dir),
            database,
        })
    }
}

pub(crate) fn run_load(args: LoadArgs) -> Result<PerTable<u64>, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    execute_load(&config)
}

/// Load the configured CSV tables, assuming their presence was checked.
pub(crate) fn execute_load(config: &LoadConfig) -> Result<PerTable<u64>, CliError> {
    let rows = load_csv_files(&config.database, &config.sources).map_err(|source| {
        CliError::Load {
            path: config.database.clone(),
            source,
        }
    })?;
    info!(
        "Loaded {} nodes and {} ways into {}",
        rows.nodes, rows.ways, config.database
    );
    Ok(rows)
}
