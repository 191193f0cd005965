//! Ingest command: convert then load in a single invocation.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::convert::{ConvertConfig, execute_convert};
use crate::load::{LoadConfig, execute_load};
use crate::{
    ARG_CLEANING_RULES, ARG_DATABASE, ARG_OSM_XML, ARG_OUTPUT_DIR, ARG_VALIDATE, CliError,
    ENV_INGEST_DATABASE, ENV_INGEST_OSM_XML,
};

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "ingest",
    long_about = "Convert an OSM XML extract into CSV tables and load them \
                 into SQLite. Paths can come from CLI flags, configuration \
                 files, or environment variables.",
    about = "Convert an extract and load it into SQLite"
)]
#[ortho_config(prefix = "WRANGLE")]
pub(crate) struct IngestArgs {
    /// Path to the OpenStreetMap XML extract (`.osm` or `.osm.bz2`).
    #[arg(long = ARG_OSM_XML, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_xml: Option<Utf8PathBuf>,
    /// Directory receiving the CSV tables (defaults to the working directory).
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Abort at the first record that does not match the table schemas.
    #[arg(
        long = ARG_VALIDATE,
        value_name = "bool",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) validate: Option<bool>,
    /// JSON file overriding the street and abbreviation tables.
    #[arg(long = ARG_CLEANING_RULES, value_name = "path")]
    #[serde(default)]
    pub(crate) cleaning_rules: Option<Utf8PathBuf>,
    /// SQLite database file to create or update.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl IngestArgs {
    fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestConfig::try_from(merged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestConfig {
    pub(crate) convert: ConvertConfig,
    pub(crate) database: Utf8PathBuf,
}

impl IngestConfig {
    fn load(&self) -> LoadConfig {
        LoadConfig {
            sources: self.convert.outputs(),
            database: self.database.clone(),
        }
    }
}

impl TryFrom<IngestArgs> for IngestConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        let convert = ConvertConfig::resolve(
            args.osm_xml,
            ENV_INGEST_OSM_XML,
            args.output_dir,
            args.validate,
            args.cleaning_rules,
        )?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_INGEST_DATABASE,
        })?;
        Ok(Self { convert, database })
    }
}

pub(crate) fn resolve_ingest_config(args: IngestArgs) -> Result<IngestConfig, CliError> {
    let config = args.into_config()?;
    config.convert.validate_sources()?;
    Ok(config)
}

pub(crate) fn run_ingest(args: IngestArgs) -> Result<(), CliError> {
    let config = resolve_ingest_config(args)?;
    execute_convert(&config.convert)?;
    execute_load(&config.load())?;
    Ok(())
}
