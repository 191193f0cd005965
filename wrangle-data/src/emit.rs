//! CSV emission of shaped records.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8;
use log::debug;
use thiserror::Error;
use wrangle_core::{AttributeEntry, PerTable, ShapedRecord, Table, WayMembership};

/// Errors raised while writing the CSV tables.
#[derive(Debug, Error)]
pub enum EmitError {
    /// A destination file could not be created.
    #[error("failed to create {table} output at {path:?}")]
    Create {
        /// Table whose file failed.
        table: Table,
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Writing a row failed.
    #[error("failed to write a {table} row")]
    Write {
        /// Table being written.
        table: Table,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
    /// Flushing a destination failed.
    #[error("failed to flush {table} output")]
    Flush {
        /// Table being flushed.
        table: Table,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Destination paths for the five tables inside `dir`, using the default
/// file names.
///
/// # Examples
/// ```
/// use camino::Utf8Path;
/// use wrangle_core::Table;
/// use wrangle_data::output_paths;
///
/// let paths = output_paths(Utf8Path::new("out"));
/// assert_eq!(paths.get(Table::NodeTags).as_str(), "out/nodes_tags.csv");
/// ```
#[must_use]
pub fn output_paths(dir: &Utf8Path) -> PerTable<Utf8PathBuf> {
    PerTable::from_fn(|table| dir.join(table.file_name()))
}

/// Writes shaped records to five CSV destinations.
///
/// Each destination receives its header row on construction. Rows follow in
/// encounter order: the primary row of a record first, then its secondary
/// rows.
///
/// # Examples
/// ```
/// use wrangle_core::{ElementKind, OsmElement, PerTable, RecordShaper};
/// use wrangle_data::TabularEmitter;
///
/// let mut emitter = TabularEmitter::new(PerTable::from_fn(|_| Vec::<u8>::new()))?;
/// let node = OsmElement::new(ElementKind::Node)
///     .with_attribute("id", "1")
///     .with_tag("amenity", "cafe");
/// let record = RecordShaper::default().shape(&node).expect("nodes are shaped");
/// emitter.write(&record)?;
///
/// let (sinks, rows) = emitter.into_parts()?;
/// assert_eq!(rows.nodes, 1);
/// assert_eq!(
///     String::from_utf8(sinks.node_tags).expect("UTF-8 output"),
///     "id,key,value,type\n1,amenity,cafe,regular\n"
/// );
/// # Ok::<(), wrangle_data::EmitError>(())
/// ```
#[derive(Debug)]
pub struct TabularEmitter<W: Write> {
    writers: PerTable<csv::Writer<W>>,
    rows: PerTable<u64>,
}

impl TabularEmitter<fs_utf8::File> {
    /// Create (or truncate) every destination file, creating missing parent
    /// directories.
    ///
    /// # Errors
    /// Returns [`EmitError::Create`] for the first file that cannot be
    /// created and [`EmitError::Write`] if a header cannot be written.
    pub fn create(paths: &PerTable<Utf8PathBuf>) -> Result<Self, EmitError> {
        let files = paths.clone().try_map(|table, path| {
            debug!("Writing {table} rows to {path}");
            wrangle_fs::create_utf8_file(&path)
                .map_err(|source| EmitError::Create { table, path, source })
        })?;
        Self::new(files)
    }
}

impl<W: Write> TabularEmitter<W> {
    /// Wrap already-open destinations and write their header rows.
    ///
    /// # Errors
    /// Returns [`EmitError::Write`] if a header cannot be written.
    pub fn new(sinks: PerTable<W>) -> Result<Self, EmitError> {
        let writers = sinks.try_map(|table, sink| {
            let mut writer = csv::Writer::from_writer(sink);
            writer
                .write_record(table.columns())
                .map_err(|source| EmitError::Write { table, source })?;
            Ok(writer)
        })?;
        Ok(Self {
            writers,
            rows: PerTable::default(),
        })
    }

    /// Append one record's rows.
    ///
    /// # Errors
    /// Returns [`EmitError::Write`] if any row cannot be written.
    pub fn write(&mut self, record: &ShapedRecord) -> Result<(), EmitError> {
        match record {
            ShapedRecord::Node(node) => {
                self.write_row(
                    Table::Nodes,
                    node.attributes.iter().map(|(_, value)| value.unwrap_or_default()),
                )?;
                self.write_entries(Table::NodeTags, &node.tags)
            }
            ShapedRecord::Way(way) => {
                self.write_row(
                    Table::Ways,
                    way.attributes.iter().map(|(_, value)| value.unwrap_or_default()),
                )?;
                self.write_memberships(&way.nodes)?;
                self.write_entries(Table::WayTags, &way.tags)
            }
        }
    }

    /// Rows written so far, per table, excluding headers.
    #[must_use]
    pub const fn rows(&self) -> &PerTable<u64> {
        &self.rows
    }

    /// Flush every destination and return the per-table row counts.
    ///
    /// # Errors
    /// Returns [`EmitError::Flush`] for the first destination that fails.
    pub fn finish(self) -> Result<PerTable<u64>, EmitError> {
        self.into_parts().map(|(_, rows)| rows)
    }

    /// Flush every destination and hand back the sinks with the row counts.
    ///
    /// # Errors
    /// Returns [`EmitError::Flush`] for the first destination that fails.
    pub fn into_parts(self) -> Result<(PerTable<W>, PerTable<u64>), EmitError> {
        let sinks = self.writers.try_map(|table, writer| {
            writer.into_inner().map_err(|err| EmitError::Flush {
                table,
                source: err.into_error(),
            })
        })?;
        Ok((sinks, self.rows))
    }

    fn write_entries(&mut self, table: Table, entries: &[AttributeEntry]) -> Result<(), EmitError> {
        for entry in entries {
            self.write_row(
                table,
                [
                    entry.id.as_deref().unwrap_or_default(),
                    entry.key.as_str(),
                    entry.value.as_str(),
                    entry.namespace.as_str(),
                ],
            )?;
        }
        Ok(())
    }

    fn write_memberships(&mut self, members: &[WayMembership]) -> Result<(), EmitError> {
        for member in members {
            let position = member.position.to_string();
            self.write_row(
                Table::WayNodes,
                [
                    member.way_id.as_deref().unwrap_or_default(),
                    member.node_id.as_str(),
                    position.as_str(),
                ],
            )?;
        }
        Ok(())
    }

    fn write_row<'a>(
        &mut self,
        table: Table,
        fields: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), EmitError> {
        self.writers
            .get_mut(table)
            .write_record(fields)
            .map_err(|source| EmitError::Write { table, source })?;
        *self.rows.get_mut(table) += 1;
        Ok(())
    }
}
