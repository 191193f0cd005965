//! Bulk loading of the CSV tables into SQLite.
//!
//! Every table is dropped, recreated and filled inside its own transaction.
//! Foreign keys are declared but not enforced: extracts clipped to a bounding
//! box reference nodes that were never exported.
#![forbid(unsafe_code)]

use std::io::Read;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use rusqlite::{Connection, Error as SqliteError, params_from_iter};
use thiserror::Error;
use wrangle_core::{PerTable, Table};

/// Errors raised while loading CSV tables into SQLite.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to create the parent directory for the database file.
    #[error("failed to create parent directory for {path:?}")]
    CreateDirectory {
        /// Database path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Opening a CSV file failed.
    #[error("failed to open {table} CSV at {path:?}")]
    OpenCsv {
        /// Table whose file failed.
        table: Table,
        /// CSV path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The CSV header does not list the table's columns.
    #[error("{table} CSV header {found:?} does not match the expected columns {expected:?}")]
    Header {
        /// Table being loaded.
        table: Table,
        /// Columns the table requires.
        expected: Vec<String>,
        /// Columns found in the file.
        found: Vec<String>,
    },
    /// A CSV record could not be read or parsed.
    #[error("failed to read {table} CSV record {record}")]
    Record {
        /// Table being loaded.
        table: Table,
        /// One-based record number, excluding the header.
        record: u64,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
    /// A database operation failed.
    #[error("failed to {operation} for {table}")]
    Sqlite {
        /// Table being loaded.
        table: Table,
        /// Operation that failed.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Inserting a row failed.
    #[error("failed to insert {table} CSV record {record}")]
    Insert {
        /// Table being loaded.
        table: Table,
        /// One-based record number, excluding the header.
        record: u64,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// `CREATE TABLE` statement for `table`.
#[must_use]
pub const fn create_table_sql(table: Table) -> &'static str {
    match table {
        Table::Nodes => {
            "CREATE TABLE nodes (
                id INTEGER PRIMARY KEY NOT NULL,
                lat REAL,
                lon REAL,
                user TEXT,
                uid INTEGER,
                version INTEGER,
                changeset INTEGER,
                timestamp TEXT
            )"
        }
        Table::NodeTags => {
            "CREATE TABLE nodes_tags (
                id INTEGER,
                key TEXT,
                value TEXT,
                type TEXT,
                FOREIGN KEY (id) REFERENCES nodes(id)
            )"
        }
        Table::Ways => {
            "CREATE TABLE ways (
                id INTEGER PRIMARY KEY NOT NULL,
                user TEXT,
                uid INTEGER,
                version TEXT,
                changeset INTEGER,
                timestamp TEXT
            )"
        }
        Table::WayTags => {
            "CREATE TABLE ways_tags (
                id INTEGER NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                type TEXT,
                FOREIGN KEY (id) REFERENCES ways(id)
            )"
        }
        Table::WayNodes => {
            "CREATE TABLE ways_nodes (
                id INTEGER NOT NULL,
                node_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                FOREIGN KEY (id) REFERENCES ways(id),
                FOREIGN KEY (node_id) REFERENCES nodes(id)
            )"
        }
    }
}

/// Columns whose empty fields load as `''`. Other empty fields load as `NULL`.
fn is_text_column(table: Table, column: &str) -> bool {
    match table {
        Table::NodeTags | Table::WayTags => matches!(column, "key" | "value" | "type"),
        Table::Nodes => matches!(column, "user" | "timestamp"),
        Table::Ways => matches!(column, "user" | "version" | "timestamp"),
        Table::WayNodes => false,
    }
}

fn insert_sql(table: Table) -> String {
    let columns = table.columns();
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let verb = if table.is_attribute_table() {
        "INSERT OR IGNORE"
    } else {
        "INSERT"
    };
    format!(
        "{verb} INTO {} ({}) VALUES ({placeholders})",
        table.sql_name(),
        columns.join(", ")
    )
}

/// Load the CSV files at `sources` into the database at `database`.
///
/// Parent directories of the database are created when missing. Returns the
/// number of rows inserted per table.
///
/// # Errors
/// Returns [`LoadError`] for the first file or database failure.
///
/// # Examples
/// ```no_run
/// use camino::Utf8Path;
/// use wrangle_data::{load_csv_files, output_paths};
///
/// # fn main() -> Result<(), wrangle_data::LoadError> {
/// let loaded = load_csv_files(Utf8Path::new("chicago.db"), &output_paths(Utf8Path::new("out")))?;
/// println!("{} nodes loaded", loaded.nodes);
/// # Ok(())
/// # }
/// ```
pub fn load_csv_files(
    database: &Utf8Path,
    sources: &PerTable<Utf8PathBuf>,
) -> Result<PerTable<u64>, LoadError> {
    let readers = sources.clone().try_map(|table, path| {
        wrangle_fs::open_utf8_file(&path).map_err(|source| LoadError::OpenCsv {
            table,
            path,
            source,
        })
    })?;
    wrangle_fs::ensure_parent_dir(database).map_err(|source| LoadError::CreateDirectory {
        path: database.to_path_buf(),
        source,
    })?;
    let mut connection =
        Connection::open(database.as_std_path()).map_err(|source| LoadError::Open {
            path: database.to_path_buf(),
            source,
        })?;
    let loaded = load_csv_tables(&mut connection, readers)?;
    info!(
        "Loaded {} nodes and {} ways into {database}",
        loaded.nodes, loaded.ways
    );
    Ok(loaded)
}

/// Load CSV data from arbitrary readers into an open connection.
///
/// # Errors
/// Returns [`LoadError`] for the first CSV or database failure. Tables
/// loaded before the failure keep their new contents.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use wrangle_core::{PerTable, Table};
/// use wrangle_data::load_csv_tables;
///
/// let mut connection = Connection::open_in_memory().expect("create in-memory database");
/// let sources = PerTable::from_fn(|table| match table {
///     Table::Nodes => "id,lat,lon,user,uid,version,changeset,timestamp\n1,41.88,-87.63,ann,7,1,9,t\n".as_bytes(),
///     Table::NodeTags | Table::WayTags => "id,key,value,type\n".as_bytes(),
///     Table::Ways => "id,user,uid,version,changeset,timestamp\n".as_bytes(),
///     Table::WayNodes => "id,node_id,position\n".as_bytes(),
/// });
///
/// let loaded = load_csv_tables(&mut connection, sources).expect("load tables");
/// assert_eq!(loaded.nodes, 1);
/// let lat: f64 = connection
///     .query_row("SELECT lat FROM nodes WHERE id = 1", [], |row| row.get(0))
///     .expect("query node");
/// assert!((lat - 41.88).abs() < 1e-9);
/// ```
pub fn load_csv_tables<R: Read>(
    connection: &mut Connection,
    sources: PerTable<R>,
) -> Result<PerTable<u64>, LoadError> {
    connection
        .pragma_update(None, "foreign_keys", false)
        .map_err(|source| LoadError::Sqlite {
            table: Table::Nodes,
            operation: "disable foreign keys",
            source,
        })?;
    sources.try_map(|table, source| load_table(connection, table, source))
}

fn load_table<R: Read>(
    connection: &mut Connection,
    table: Table,
    source: R,
) -> Result<u64, LoadError> {
    let sqlite = |operation: &'static str| {
        move |source: SqliteError| LoadError::Sqlite {
            table,
            operation,
            source,
        }
    };

    let mut reader = csv::Reader::from_reader(source);
    check_header(&mut reader, table)?;

    let transaction = connection
        .transaction()
        .map_err(sqlite("begin load transaction"))?;
    transaction
        .execute_batch(&format!("DROP TABLE IF EXISTS {}", table.sql_name()))
        .map_err(sqlite("drop table"))?;
    transaction
        .execute_batch(create_table_sql(table))
        .map_err(sqlite("create table"))?;

    let text_columns: Vec<bool> = table
        .columns()
        .iter()
        .map(|column| is_text_column(table, column))
        .collect();
    let mut inserted = 0;
    {
        let mut statement = transaction
            .prepare(&insert_sql(table))
            .map_err(sqlite("prepare insert"))?;
        for (index, record) in reader.records().enumerate() {
            let record_number = u64::try_from(index).unwrap_or(u64::MAX).saturating_add(1);
            let record = record.map_err(|source| LoadError::Record {
                table,
                record: record_number,
                source,
            })?;
            let values = record
                .iter()
                .zip(&text_columns)
                .map(|(field, &text)| (text || !field.is_empty()).then_some(field));
            let changed = statement
                .execute(params_from_iter(values))
                .map_err(|source| LoadError::Insert {
                    table,
                    record: record_number,
                    source,
                })?;
            inserted += u64::try_from(changed).unwrap_or(u64::MAX);
        }
    }

    transaction
        .commit()
        .map_err(sqlite("commit load transaction"))?;
    info!("Loaded {inserted} rows into {table}");
    Ok(inserted)
}

fn check_header<R: Read>(reader: &mut csv::Reader<R>, table: Table) -> Result<(), LoadError> {
    let found: Vec<String> = reader
        .headers()
        .map_err(|source| LoadError::Record {
            table,
            record: 0,
            source,
        })?
        .iter()
        .map(str::to_owned)
        .collect();
    if found.iter().map(String::as_str).eq(table.columns().iter().copied()) {
        Ok(())
    } else {
        Err(LoadError::Header {
            table,
            expected: table.columns().iter().map(|column| (*column).to_owned()).collect(),
            found,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    const NODES: &str = "\
id,lat,lon,user,uid,version,changeset,timestamp
1,41.88,-87.63,ann,7,2,11,2017-01-01T00:00:00Z
3,41.9,-87.6,bob,8,1,12,2017-01-02T00:00:00Z
";
    const NODE_TAGS: &str = "\
id,key,value,type
1,street,123 Main Avenue,addr
";
    const WAYS: &str = "\
id,user,uid,version,changeset,timestamp
2,bob,8,1,12,2017-01-02T00:00:00Z
";
    const WAY_NODES: &str = "\
id,node_id,position
2,1,0
2,99,1
";
    const WAY_TAGS: &str = "\
id,key,value,type
2,phone,+1 312-555-0100,contact
";

    #[fixture]
    fn connection() -> Connection {
        Connection::open_in_memory().expect("create in-memory database")
    }

    fn sources<'a>(nodes: &'a str) -> PerTable<&'a [u8]> {
        PerTable {
            nodes: nodes.as_bytes(),
            node_tags: NODE_TAGS.as_bytes(),
            ways: WAYS.as_bytes(),
            way_nodes: WAY_NODES.as_bytes(),
            way_tags: WAY_TAGS.as_bytes(),
        }
    }

    fn count(connection: &Connection, table: &str) -> i64 {
        connection
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count rows")
    }

    #[rstest]
    fn loads_every_table(mut connection: Connection) {
        let loaded = load_csv_tables(&mut connection, sources(NODES)).expect("load tables");
        assert_eq!(loaded.nodes, 2);
        assert_eq!(loaded.ways, 1);
        assert_eq!(loaded.way_tags, 1);
        assert_eq!(
            loaded.way_nodes, 2,
            "dangling node references load while foreign keys are off"
        );
        let typed: (f64, i64) = connection
            .query_row("SELECT lat, uid FROM nodes WHERE id = 3", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .expect("query typed columns");
        assert!((typed.0 - 41.9).abs() < 1e-9);
        assert_eq!(typed.1, 8);
    }

    #[rstest]
    fn reloading_replaces_previous_contents(mut connection: Connection) {
        load_csv_tables(&mut connection, sources(NODES)).expect("first load");
        let single = "id,lat,lon,user,uid,version,changeset,timestamp\n5,1,2,c,9,1,1,t\n";
        load_csv_tables(&mut connection, sources(single)).expect("second load");
        assert_eq!(count(&connection, "nodes"), 1);
        assert_eq!(count(&connection, "ways"), 1);
    }

    #[rstest]
    fn empty_numeric_fields_load_as_null(mut connection: Connection) {
        let sparse = "id,lat,lon,user,uid,version,changeset,timestamp\n6,,-87.6,,,,,\n";
        load_csv_tables(&mut connection, sources(sparse)).expect("load sparse node");
        let lat: Option<f64> = connection
            .query_row("SELECT lat FROM nodes WHERE id = 6", [], |row| row.get(0))
            .expect("query sparse node");
        assert_eq!(lat, None);
        let (user, uid): (Option<String>, Option<i64>) = connection
            .query_row("SELECT user, uid FROM nodes WHERE id = 6", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .expect("query sparse text");
        assert_eq!(user.as_deref(), Some(""));
        assert_eq!(uid, None);
    }

    #[rstest]
    fn empty_tag_values_load_as_empty_text(mut connection: Connection) {
        let tables = PerTable {
            node_tags: "id,key,value,type\n1,note,,regular\n".as_bytes(),
            way_tags: "id,key,value,type\n2,note,,regular\n2,name,x,regular\n".as_bytes(),
            ..sources(NODES)
        };
        let loaded = load_csv_tables(&mut connection, tables).expect("load blank tag values");
        assert_eq!(loaded.way_tags, 2, "blank way tag values must not be ignored");
        assert_eq!(count(&connection, "ways_tags"), 2);

        let value: Option<String> = connection
            .query_row("SELECT value FROM nodes_tags WHERE id = 1", [], |row| row.get(0))
            .expect("query blank node tag");
        assert_eq!(value.as_deref(), Some(""));
    }

    #[rstest]
    #[case(Table::Nodes, "lat", false)]
    #[case(Table::Nodes, "user", true)]
    #[case(Table::Ways, "version", true)]
    #[case(Table::WayTags, "value", true)]
    #[case(Table::WayNodes, "position", false)]
    fn classifies_text_columns(#[case] table: Table, #[case] column: &str, #[case] text: bool) {
        assert_eq!(is_text_column(table, column), text);
    }

    #[rstest]
    fn duplicate_primary_keys_abort_with_the_record_number(mut connection: Connection) {
        let duplicated = "id,lat,lon,user,uid,version,changeset,timestamp\n1,1,1,a,1,1,1,t\n1,2,2,b,2,2,2,t\n";
        let err = load_csv_tables(&mut connection, sources(duplicated)).expect_err("duplicate id");
        match err {
            LoadError::Insert { table, record, .. } => {
                assert_eq!(table, Table::Nodes);
                assert_eq!(record, 2);
            }
            other => panic!("expected insert error, got {other:?}"),
        }
    }

    #[rstest]
    fn rejects_unexpected_headers(mut connection: Connection) {
        let err = load_csv_tables(&mut connection, sources("id,lat\n1,2\n"))
            .expect_err("short header");
        assert!(matches!(err, LoadError::Header { table: Table::Nodes, .. }));
    }

    #[rstest]
    fn ragged_records_name_their_position(mut connection: Connection) {
        let ragged = "id,lat,lon,user,uid,version,changeset,timestamp\n1,1,1,a,1,1,1,t\n2,2\n";
        let err = load_csv_tables(&mut connection, sources(ragged)).expect_err("ragged record");
        match err {
            LoadError::Record { table, record, .. } => {
                assert_eq!(table, Table::Nodes);
                assert_eq!(record, 2);
            }
            other => panic!("expected record error, got {other:?}"),
        }
    }

    #[rstest]
    #[case(Table::Nodes, "INSERT INTO nodes (id, lat, lon, user, uid, version, changeset, timestamp) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)")]
    #[case(Table::WayTags, "INSERT OR IGNORE INTO ways_tags (id, key, value, type) VALUES (?1, ?2, ?3, ?4)")]
    fn builds_insert_statements(#[case] table: Table, #[case] expected: &str) {
        assert_eq!(insert_sql(table), expected);
    }
}
