//! File-driven audit pass.

use std::io::BufRead;

use camino::Utf8Path;
use log::info;
use thiserror::Error;
use wrangle_core::{AuditReport, Auditor, CleaningRules, ElementKind};

use crate::reader::{ElementStream, ElementStreamError, open_element_stream};

/// Errors that abort an audit.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Reading the source document failed.
    #[error(transparent)]
    Read(#[from] ElementStreamError),
}

/// Audit every node, way and relation in the XML at `path`.
///
/// # Errors
/// Returns [`AuditError::Read`] when the file cannot be opened or decoded.
pub fn audit_map(path: &Utf8Path, rules: &CleaningRules) -> Result<AuditReport, AuditError> {
    let report = audit_stream(open_element_stream(path, &ElementKind::ALL)?, rules)?;
    info!(
        "Audited {path}: {} unexpected street types, {} non-conforming phone numbers",
        report.unexpected_street_types.len(),
        report.nonconforming_phones.len()
    );
    Ok(report)
}

/// Fold an element stream into an audit report.
///
/// # Errors
/// Returns [`AuditError::Read`] on the first decoding failure.
///
/// # Examples
/// ```
/// use wrangle_core::{CleaningRules, ElementKind};
/// use wrangle_data::{ElementStream, audit_stream};
///
/// let xml = r#"<osm><node id="1"><tag k="addr:postcode" v="IL"/></node></osm>"#;
/// let report = audit_stream(
///     ElementStream::new(xml.as_bytes(), &ElementKind::ALL),
///     &CleaningRules::default(),
/// )?;
/// assert_eq!(report.nonconforming_postcodes.get("IL"), Some(&1));
/// # Ok::<(), wrangle_data::AuditError>(())
/// ```
pub fn audit_stream<R: BufRead>(
    stream: ElementStream<R>,
    rules: &CleaningRules,
) -> Result<AuditReport, AuditError> {
    let mut auditor = Auditor::new(rules);
    for element in stream {
        auditor.observe(&element?);
    }
    Ok(auditor.finish())
}
