//! Audit command implementation for the wrangle CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use wrangle_core::{AuditReport, CleaningRules};
use wrangle_data::{audit_map, load_cleaning_rules};

use crate::{ARG_CLEANING_RULES, ARG_OSM_XML, CliError, ENV_AUDIT_OSM_XML, require_existing};

/// CLI arguments for the `audit` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "audit",
    long_about = "Stream an OSM XML extract once and print a JSON summary of \
                 element counts, tag key shapes, street types, street-name \
                 fixes and non-conforming phone numbers and postcodes.",
    about = "Audit the data quality of an OSM XML extract"
)]
#[ortho_config(prefix = "WRANGLE")]
pub(crate) struct AuditArgs {
    /// Path to the OpenStreetMap XML extract (`.osm` or `.osm.bz2`).
    #[arg(long = ARG_OSM_XML, value_name = "path")]
    #[serde(default)]
    pub(crate) osm_xml: Option<Utf8PathBuf>,
    /// JSON file overriding the street and abbreviation tables.
    #[arg(long = ARG_CLEANING_RULES, value_name = "path")]
    #[serde(default)]
    pub(crate) cleaning_rules: Option<Utf8PathBuf>,
}

impl AuditArgs {
    fn into_config(self) -> Result<AuditConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AuditConfig::try_from(merged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuditConfig {
    pub(crate) osm_xml: Utf8PathBuf,
    pub(crate) cleaning_rules: Option<Utf8PathBuf>,
}

impl AuditConfig {
    fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.osm_xml, ARG_OSM_XML)?;
        if let Some(rules) = &self.cleaning_rules {
            require_existing(rules, ARG_CLEANING_RULES)?;
        }
        Ok(())
    }
}

impl TryFrom<AuditArgs> for AuditConfig {
    type Error = CliError;

    fn try_from(args: AuditArgs) -> Result<Self, Self::Error> {
        let osm_xml = args.osm_xml.ok_or(CliError::MissingArgument {
            field: ARG_OSM_XML,
            env: ENV_AUDIT_OSM_XML,
        })?;
        Ok(Self {
            osm_xml,
            cleaning_rules: args.cleaning_rules,
        })
    }
}

pub(crate) fn run_audit(args: AuditArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let report = execute_audit(&config)?;
    write_audit_report(writer, &report)
}

pub(crate) fn execute_audit(config: &AuditConfig) -> Result<AuditReport, CliError> {
    let rules = match &config.cleaning_rules {
        Some(path) => load_cleaning_rules(path)?,
        None => CleaningRules::default(),
    };
    Ok(audit_map(&config.osm_xml, &rules)?)
}

pub(crate) fn write_audit_report(
    writer: &mut dyn Write,
    report: &AuditReport,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(report).map_err(CliError::SerialiseAuditReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
