//! Extract, clean, shape, validate and emit in one streaming pass.

use std::io::{BufRead, Write};

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use thiserror::Error;
use wrangle_core::{
    CleaningRules, ElementKind, OsmElement, PerTable, RecordSchema, RecordShaper, SchemaViolation,
};

use crate::emit::{EmitError, TabularEmitter};
use crate::reader::{ElementStream, ElementStreamError, open_element_stream};

/// Element kinds the conversion pass consumes.
pub const CONVERTED_KINDS: [ElementKind; 2] = [ElementKind::Node, ElementKind::Way];

/// Errors that abort a conversion run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading the source document failed.
    #[error(transparent)]
    Read(#[from] ElementStreamError),
    /// A record failed schema validation.
    #[error("{kind} {id:?} failed validation: {source}")]
    Validation {
        /// Kind of the offending element.
        kind: ElementKind,
        /// Identifier of the offending element, if it carried one.
        id: Option<String>,
        /// First violation found.
        #[source]
        source: SchemaViolation,
    },
    /// Writing CSV output failed.
    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Settings for one conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Reject the run at the first record that fails the schema.
    pub validate: bool,
    /// Cleaning tables used by the shaper.
    pub rules: CleaningRules,
}

/// Outcome of a conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Number of nodes shaped.
    pub nodes: u64,
    /// Number of ways shaped.
    pub ways: u64,
    /// Rows written per table, excluding headers.
    pub rows: PerTable<u64>,
}

/// Convert the XML at `input` into CSV files at `outputs`.
///
/// The input is opened before any output is created, so a missing source
/// leaves existing CSV files untouched.
///
/// # Errors
/// Returns [`PipelineError`] on the first unreadable element, schema
/// violation (when validation is enabled) or write failure.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use wrangle_data::{ConvertOptions, output_paths, process_map};
///
/// # fn main() -> Result<(), wrangle_data::PipelineError> {
/// let outputs = output_paths(Utf8Path::new("out"));
/// let summary = process_map(Utf8Path::new("chicago.osm"), &outputs, &ConvertOptions::default())?;
/// println!("{} nodes, {} ways", summary.nodes, summary.ways);
/// # Ok(())
/// # }
/// ```
pub fn process_map(
    input: &Utf8Path,
    outputs: &PerTable<Utf8PathBuf>,
    options: &ConvertOptions,
) -> Result<ConvertSummary, PipelineError> {
    let stream = open_element_stream(input, &CONVERTED_KINDS)?;
    let emitter = TabularEmitter::create(outputs)?;
    let summary = convert_stream(stream, emitter, options)?;
    info!(
        "Converted {} nodes and {} ways from {input}",
        summary.nodes, summary.ways
    );
    Ok(summary)
}

/// Drive an element stream through the shaper into an emitter.
///
/// # Errors
/// See [`process_map`].
///
/// # Examples
/// ```
/// use wrangle_core::PerTable;
/// use wrangle_data::{CONVERTED_KINDS, ConvertOptions, ElementStream, TabularEmitter, convert_stream};
///
/// let xml = r#"<osm><way id="2"><nd ref="1"/><nd ref="3"/></way></osm>"#;
/// let stream = ElementStream::new(xml.as_bytes(), &CONVERTED_KINDS);
/// let emitter = TabularEmitter::new(PerTable::from_fn(|_| Vec::<u8>::new()))?;
///
/// let summary = convert_stream(stream, emitter, &ConvertOptions::default())?;
/// assert_eq!(summary.ways, 1);
/// assert_eq!(summary.rows.way_nodes, 2);
/// # Ok::<(), wrangle_data::PipelineError>(())
/// ```
pub fn convert_stream<R: BufRead, W: Write>(
    stream: ElementStream<R>,
    mut emitter: TabularEmitter<W>,
    options: &ConvertOptions,
) -> Result<ConvertSummary, PipelineError> {
    let (nodes, ways) = shape_into(stream, &mut emitter, options)?;
    Ok(ConvertSummary {
        nodes,
        ways,
        rows: emitter.finish()?,
    })
}

fn shape_into<R: BufRead, W: Write>(
    stream: ElementStream<R>,
    emitter: &mut TabularEmitter<W>,
    options: &ConvertOptions,
) -> Result<(u64, u64), PipelineError> {
    let shaper = RecordShaper::new(options.rules.clone());
    let schema = options.validate.then(RecordSchema::default);
    let (mut nodes, mut ways) = (0, 0);

    for element in stream {
        let element = element?;
        let Some(record) = shaper.shape(&element) else {
            debug!("skipping {} {:?}", element.kind(), element.id());
            continue;
        };
        if let Some(schema) = &schema {
            schema
                .validate(&record)
                .map_err(|source| validation_error(&element, source))?;
        }
        emitter.write(&record)?;
        match element.kind() {
            ElementKind::Node => nodes += 1,
            ElementKind::Way => ways += 1,
            ElementKind::Relation => {}
        }
    }
    Ok((nodes, ways))
}

fn validation_error(element: &OsmElement, source: SchemaViolation) -> PipelineError {
    PipelineError::Validation {
        kind: element.kind(),
        id: element.id().map(str::to_owned),
        source,
    }
}
