//! Descriptive queries over a loaded database.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use rusqlite::{Connection, Error as SqliteError, OpenFlags, types::ValueRef};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while running the report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Opening the database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A catalogue query failed.
    #[error("report query {name} failed")]
    Query {
        /// Name of the failing query.
        name: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Writing the rendered report failed.
    #[error("failed to write report")]
    Write(#[source] std::io::Error),
}

/// A named, parameterless, read-only query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportQuery {
    /// Stable identifier.
    pub name: &'static str,
    /// Human-readable heading.
    pub title: &'static str,
    /// SQL text.
    pub sql: &'static str,
}

/// The reporting catalogue, in presentation order.
pub const REPORT_QUERIES: [ReportQuery; 13] = [
    ReportQuery {
        name: "unique_users",
        title: "Unique users",
        sql: "SELECT COUNT(DISTINCT u.uid) AS users \
              FROM (SELECT uid FROM nodes UNION ALL SELECT uid FROM ways) AS u",
    },
    ReportQuery {
        name: "node_count",
        title: "Number of nodes",
        sql: "SELECT COUNT(DISTINCT id) AS nodes FROM nodes",
    },
    ReportQuery {
        name: "way_count",
        title: "Number of ways",
        sql: "SELECT COUNT(DISTINCT id) AS ways FROM ways",
    },
    ReportQuery {
        name: "node_tag_types",
        title: "Most common node tag types",
        sql: "SELECT type, COUNT(*) AS num FROM nodes_tags \
              GROUP BY type ORDER BY num DESC LIMIT 10",
    },
    ReportQuery {
        name: "cafes",
        title: "Cafes",
        sql: "SELECT value, COUNT(*) AS num \
              FROM (SELECT key, value FROM nodes_tags UNION ALL SELECT key, value FROM ways_tags) \
              WHERE value LIKE '%cafe%' GROUP BY value ORDER BY num DESC",
    },
    ReportQuery {
        name: "top_users",
        title: "Top contributing users",
        sql: "SELECT u.user AS user, COUNT(*) AS num \
              FROM (SELECT user FROM nodes UNION ALL SELECT user FROM ways) AS u \
              GROUP BY u.user ORDER BY num DESC LIMIT 10",
    },
    ReportQuery {
        name: "top_cuisines",
        title: "Most popular cuisines",
        sql: "SELECT value, COUNT(*) AS num \
              FROM (SELECT key, value FROM nodes_tags UNION ALL SELECT key, value FROM ways_tags) AS u \
              WHERE u.key LIKE '%cuisine%' GROUP BY value ORDER BY num DESC LIMIT 10",
    },
    ReportQuery {
        name: "websites",
        title: "Most referenced websites",
        sql: "SELECT u.value AS value, COUNT(*) AS num \
              FROM (SELECT value FROM nodes_tags UNION ALL SELECT value FROM ways_tags) AS u \
              WHERE u.value LIKE '%www.%' GROUP BY u.value ORDER BY num DESC LIMIT 15",
    },
    ReportQuery {
        name: "amenities",
        title: "Most common amenities",
        sql: "SELECT value, COUNT(*) AS num FROM nodes_tags WHERE key = 'amenity' \
              GROUP BY value ORDER BY num DESC LIMIT 10",
    },
    ReportQuery {
        name: "museums",
        title: "Museums",
        sql: "SELECT u.value AS value, COUNT(*) AS num \
              FROM (SELECT value FROM nodes_tags UNION ALL SELECT value FROM ways_tags) AS u \
              WHERE u.value LIKE '%museum%' AND u.value NOT LIKE 'en%' AND u.value NOT LIKE 'http%' \
              GROUP BY u.value ORDER BY num DESC LIMIT 10",
    },
    ReportQuery {
        name: "religions",
        title: "Religions",
        sql: "SELECT value, COUNT(*) AS num \
              FROM (SELECT key, value FROM nodes_tags UNION ALL SELECT key, value FROM ways_tags) \
              WHERE key = 'religion' GROUP BY value ORDER BY num DESC",
    },
    ReportQuery {
        name: "christian_denominations",
        title: "Christian denominations of places of worship",
        sql: "SELECT b.value AS denomination, COUNT(*) AS num FROM ways_tags \
              JOIN (SELECT DISTINCT id FROM ways_tags WHERE value = 'place_of_worship') a \
                ON ways_tags.id = a.id \
              JOIN (SELECT DISTINCT id, value FROM ways_tags WHERE key = 'denomination') b \
                ON a.id = b.id \
              WHERE ways_tags.key = 'religion' AND ways_tags.value = 'christian' \
              GROUP BY b.value ORDER BY num DESC",
    },
    ReportQuery {
        name: "phone_samples",
        title: "Sample phone numbers",
        sql: "SELECT value FROM (SELECT key, value FROM nodes_tags UNION ALL SELECT key, value FROM ways_tags) \
              WHERE key = 'phone' LIMIT 5",
    },
];

/// Result of one catalogue query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSection {
    /// Query identifier.
    pub name: &'static str,
    /// Heading.
    pub title: &'static str,
    /// Result column names.
    pub columns: Vec<String>,
    /// Result rows rendered as text; `NULL` becomes an empty string.
    pub rows: Vec<Vec<String>>,
}

/// Open a database read-only for reporting.
///
/// # Errors
/// Returns [`ReportError::Open`] when the file is missing or unreadable.
pub fn open_report_database(path: &Utf8Path) -> Result<Connection, ReportError> {
    Connection::open_with_flags(
        path.as_std_path(),
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|source| ReportError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Run one query.
///
/// # Errors
/// Returns [`ReportError::Query`] if preparing or stepping the query fails.
pub fn run_query(
    connection: &Connection,
    query: &ReportQuery,
) -> Result<ReportSection, ReportError> {
    let failed = |source: SqliteError| ReportError::Query {
        name: query.name,
        source,
    };
    let mut statement = connection.prepare(query.sql).map_err(failed)?;
    let columns: Vec<String> = statement
        .column_names()
        .into_iter()
        .map(str::to_owned)
        .collect();
    let width = columns.len();
    let rows = statement
        .query_map([], |row| {
            (0..width)
                .map(|index| row.get_ref(index).map(render_value))
                .collect::<Result<Vec<_>, _>>()
        })
        .map_err(failed)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(failed)?;
    Ok(ReportSection {
        name: query.name,
        title: query.title,
        columns,
        rows,
    })
}

/// Run the whole catalogue in order.
///
/// # Errors
/// Returns the first [`ReportError::Query`].
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use wrangle_data::{REPORT_QUERIES, run_report};
///
/// let connection = Connection::open_in_memory().expect("create in-memory database");
/// connection
///     .execute_batch(
///         "CREATE TABLE nodes (id INTEGER PRIMARY KEY, uid INTEGER, user TEXT);
///          CREATE TABLE ways (id INTEGER PRIMARY KEY, uid INTEGER, user TEXT);
///          CREATE TABLE nodes_tags (id INTEGER, key TEXT, value TEXT, type TEXT);
///          CREATE TABLE ways_tags (id INTEGER, key TEXT, value TEXT, type TEXT);
///          INSERT INTO nodes VALUES (1, 7, 'ann');",
///     )
///     .expect("create tables");
///
/// let sections = run_report(&connection).expect("run report");
/// assert_eq!(sections.len(), REPORT_QUERIES.len());
/// assert_eq!(sections[1].rows, [["1"]]);
/// ```
pub fn run_report(connection: &Connection) -> Result<Vec<ReportSection>, ReportError> {
    REPORT_QUERIES
        .iter()
        .map(|query| run_query(connection, query))
        .collect()
}

/// Render sections as plain text, one block per query.
///
/// # Errors
/// Returns [`ReportError::Write`] if the writer fails.
pub fn write_report(sections: &[ReportSection], out: &mut dyn Write) -> Result<(), ReportError> {
    for section in sections {
        writeln!(out, "## {}", section.title).map_err(ReportError::Write)?;
        writeln!(out, "{}", section.columns.join(" | ")).map_err(ReportError::Write)?;
        if section.rows.is_empty() {
            writeln!(out, "(no rows)").map_err(ReportError::Write)?;
        }
        for row in &section.rows {
            writeln!(out, "{}", row.join(" | ")).map_err(ReportError::Write)?;
        }
        writeln!(out).map_err(ReportError::Write)?;
    }
    Ok(())
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(number) => number.to_string(),
        ValueRef::Real(number) => number.to_string(),
        ValueRef::Text(text) => String::from_utf8_lossy(text).into_owned(),
        ValueRef::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}
