//! Loading cleaning rules from JSON files.

use std::io::Read;

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use thiserror::Error;
use wrangle_core::{CleaningRules, CleaningRulesError};

/// Errors raised while loading a cleaning-rules file.
#[derive(Debug, Error)]
pub enum RulesFileError {
    /// The file could not be read.
    #[error("failed to read cleaning rules at {path:?}")]
    Read {
        /// Rules file path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid rules document.
    #[error("invalid cleaning rules in {path:?}")]
    Parse {
        /// Rules file path.
        path: Utf8PathBuf,
        /// Parse failure.
        #[source]
        source: CleaningRulesError,
    },
}

/// Read cleaning rules from a JSON file.
///
/// Tables missing from the document keep their built-in defaults.
///
/// # Errors
/// Returns [`RulesFileError`] when the file cannot be read or parsed.
pub fn load_cleaning_rules(path: &Utf8Path) -> Result<CleaningRules, RulesFileError> {
    let read_failed = |source: std::io::Error| RulesFileError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut json = String::new();
    wrangle_fs::open_utf8_file(path)
        .map_err(read_failed)?
        .read_to_string(&mut json)
        .map_err(read_failed)?;
    let rules = CleaningRules::from_json_str(&json).map_err(|source| RulesFileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "Loaded {} abbreviations and {} corrected names from {path}",
        rules.abbreviations.len(),
        rules.corrected_names.len()
    );
    Ok(rules)
}
