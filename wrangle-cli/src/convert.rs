//! Convert command implementation for the wrangle CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use wrangle_core::{CleaningRules, PerTable};
use wrangle_data::{ConvertOptions, ConvertSummary, load_cleaning_rules, output_paths, process_map};

use crate::{
    ARG_CLEANING_RULES, ARG_OSM_XML, ARG_OUTPUT_DIR, ARG_VALIDATE, CliError, DEFAULT_OUTPUT_DIR,
    ENV_CONVERT_OSM_XML, require_existing, require_output_dir,
};

/// CLI arguments for the `convert` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "convert",
    long_about = "Stream an OSM XML extract (optionally bzip2-compressed), \
                 clean street names and phone numbers, and write nodes.csv, \
                 nodes_tags.csv, ways.csv, ways_nodes.csv and ways_tags.csv \
                 into the output directory.",
    about = "Convert an OSM XML extract into CSV tables"
)]
#[ortho_config(prefix = "WRANGLE")]
pub(crate) struct ConvertArgs {
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
}

impl ConvertArgs {
    pub(crate) fn into_config(self) -> Result<ConvertConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ConvertConfig::try_from(merged)
    }
}

/// Resolved `convert` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConvertConfig {
    /// XML extract to read.
    pub(crate) osm_xml: Utf8PathBuf,
    /// Directory receiving the CSV tables.
    pub(crate) output_dir: Utf8PathBuf,
    /// Whether schema validation is enforced.
    pub(crate) validate: bool,
    /// Optional cleaning rules override.
    pub(crate) cleaning_rules: Option<Utf8PathBuf>,
}

impl ConvertConfig {
    /// Assemble a configuration from optional merged values.
    pub(crate) fn resolve(
        osm_xml: Option<Utf8PathBuf>,
        env: &'static str,
        output_dir: Option<Utf8PathBuf>,
        validate: Option<bool>,
        cleaning_rules: Option<Utf8PathBuf>,
    ) -> Result<Self, CliError> {
        let osm_xml = osm_xml.ok_or(CliError::MissingArgument {
            field: ARG_OSM_XML,
            env,
        })?;
        Ok(Self {
            osm_xml,
            output_dir: output_dir.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR)),
            validate: validate.unwrap_or(false),
            cleaning_rules,
        })
    }

    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.osm_xml, ARG_OSM_XML)?;
        if let Some(rules) = &self.cleaning_rules {
            require_existing(rules, ARG_CLEANING_RULES)?;
        }
        require_output_dir(&self.output_dir)
    }

    /// CSV paths inside the output directory.
    pub(crate) fn outputs(&self) -> PerTable<Utf8PathBuf> {
        output_paths(&self.output_dir)
    }

    fn options(&self) -> Result<ConvertOptions, CliError> {
        let rules = match &self.cleaning_rules {
            Some(path) => load_cleaning_rules(path)?,
            None => CleaningRules::default(),
        };
        Ok(ConvertOptions {
            validate: self.validate,
            rules,
        })
    }
}

impl TryFrom<ConvertArgs> for ConvertConfig {
    type Error = CliError;

    fn try_from(args: ConvertArgs) -> Result<Self, Self::Error> {
        Self::resolve(
            args.osm_xml,
            ENV_CONVERT_OSM_XML,
            args.output_dir,
            args.validate,
            args.cleaning_rules,
        )
    }
}

pub(crate) fn run_convert(args: ConvertArgs) -> Result<ConvertSummary, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    execute_convert(&config)
}

/// Convert the configured extract, assuming its sources were validated.
pub(crate) fn execute_convert(config: &ConvertConfig) -> Result<ConvertSummary, CliError> {
    let options = config.options()?;
    let summary = process_map(&config.osm_xml, &config.outputs(), &options)?;
    info!(
        "Wrote {} node rows and {} way rows into {}",
        summary.rows.nodes, summary.rows.ways, config.output_dir
    );
    Ok(summary)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ConvertConfig, CliError> {
    let merged = ConvertArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ConvertConfig::try_from(merged)
}
