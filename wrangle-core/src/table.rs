//! Catalogue of the five output tables.
//!
//! Every layer (schema validation, CSV emission, SQLite loading) names tables
//! through [`Table`] so the column order is defined exactly once.

use std::fmt;

use serde::Serialize;

/// Primary-attribute fields copied from `node` elements.
pub const NODE_FIELDS: [&str; 8] = [
    "id",
    "lat",
    "lon",
    "user",
    "uid",
    "version",
    "changeset",
    "timestamp",
];

/// Primary-attribute fields copied from `way` elements.
pub const WAY_FIELDS: [&str; 6] = ["id", "user", "uid", "version", "changeset", "timestamp"];

/// Columns shared by both attribute tables.
pub const TAG_FIELDS: [&str; 4] = ["id", "key", "value", "type"];

/// Columns of the way-membership table.
pub const WAY_NODE_FIELDS: [&str; 3] = ["id", "node_id", "position"];

/// One of the five output tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    /// Primary node rows.
    Nodes,
    /// Node attribute entries.
    NodeTags,
    /// Primary way rows.
    Ways,
    /// Way-membership entries.
    WayNodes,
    /// Way attribute entries.
    WayTags,
}

impl Table {
    /// All tables in emission order.
    pub const ALL: [Self; 5] = [
        Self::Nodes,
        Self::NodeTags,
        Self::Ways,
        Self::WayNodes,
        Self::WayTags,
    ];

    /// Name used by the record schema and in validation errors.
    #[must_use]
    pub const fn schema_name(self) -> &'static str {
        match self {
            Self::Nodes => "node",
            Self::NodeTags => "node_tags",
            Self::Ways => "way",
            Self::WayNodes => "way_nodes",
            Self::WayTags => "way_tags",
        }
    }

    /// SQLite table name.
    #[must_use]
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::NodeTags => "nodes_tags",
            Self::Ways => "ways",
            Self::WayNodes => "ways_nodes",
            Self::WayTags => "ways_tags",
        }
    }

    /// Default CSV file name.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Nodes => "nodes.csv",
            Self::NodeTags => "nodes_tags.csv",
            Self::Ways => "ways.csv",
            Self::WayNodes => "ways_nodes.csv",
            Self::WayTags => "ways_tags.csv",
        }
    }

    /// Column names in output order.
    #[must_use]
    pub const fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Nodes => &NODE_FIELDS,
            Self::NodeTags | Self::WayTags => &TAG_FIELDS,
            Self::Ways => &WAY_FIELDS,
            Self::WayNodes => &WAY_NODE_FIELDS,
        }
    }

    /// Whether rows hold attribute entries (`INSERT OR IGNORE` on load).
    #[must_use]
    pub const fn is_attribute_table(self) -> bool {
        matches!(self, Self::NodeTags | Self::WayTags)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// One value per table, addressed by [`Table`].
///
/// Used for output paths, open writers and row counts alike.
///
/// # Examples
/// ```
/// use wrangle_core::{PerTable, Table};
///
/// let files = PerTable::from_fn(Table::file_name);
/// assert_eq!(*files.get(Table::WayNodes), "ways_nodes.csv");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PerTable<T> {
    /// Value for [`Table::Nodes`].
    pub nodes: T,
    /// Value for [`Table::NodeTags`].
    pub node_tags: T,
    /// Value for [`Table::Ways`].
    pub ways: T,
    /// Value for [`Table::WayNodes`].
    pub way_nodes: T,
    /// Value for [`Table::WayTags`].
    pub way_tags: T,
}

impl<T> PerTable<T> {
    /// Build a value for every table.
    pub fn from_fn(mut f: impl FnMut(Table) -> T) -> Self {
        Self {
            nodes: f(Table::Nodes),
            node_tags: f(Table::NodeTags),
            ways: f(Table::Ways),
            way_nodes: f(Table::WayNodes),
            way_tags: f(Table::WayTags),
        }
    }

    /// Convert every value, stopping at the first failure in [`Table::ALL`]
    /// order.
    ///
    /// # Errors
    /// Returns the first error produced by `f`.
    pub fn try_map<U, E>(
        self,
        mut f: impl FnMut(Table, T) -> Result<U, E>,
    ) -> Result<PerTable<U>, E> {
        Ok(PerTable {
            nodes: f(Table::Nodes, self.nodes)?,
            node_tags: f(Table::NodeTags, self.node_tags)?,
            ways: f(Table::Ways, self.ways)?,
            way_nodes: f(Table::WayNodes, self.way_nodes)?,
            way_tags: f(Table::WayTags, self.way_tags)?,
        })
    }

    /// Value for `table`.
    #[must_use]
    pub const fn get(&self, table: Table) -> &T {
        match table {
            Table::Nodes => &self.nodes,
            Table::NodeTags => &self.node_tags,
            Table::Ways => &self.ways,
            Table::WayNodes => &self.way_nodes,
            Table::WayTags => &self.way_tags,
        }
    }

    /// Mutable value for `table`.
    pub const fn get_mut(&mut self, table: Table) -> &mut T {
        match table {
            Table::Nodes => &mut self.nodes,
            Table::NodeTags => &mut self.node_tags,
            Table::Ways => &mut self.ways,
            Table::WayNodes => &mut self.way_nodes,
            Table::WayTags => &mut self.way_tags,
        }
    }

    /// Iterate in [`Table::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Table, &T)> + '_ {
        Table::ALL.into_iter().map(move |table| (table, self.get(table)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Table::Nodes, "node", "nodes", 8)]
    #[case(Table::NodeTags, "node_tags", "nodes_tags", 4)]
    #[case(Table::Ways, "way", "ways", 6)]
    #[case(Table::WayNodes, "way_nodes", "ways_nodes", 3)]
    #[case(Table::WayTags, "way_tags", "ways_tags", 4)]
    fn names_and_columns_line_up(
        #[case] table: Table,
        #[case] schema_name: &str,
        #[case] sql_name: &str,
        #[case] width: usize,
    ) {
        assert_eq!(table.schema_name(), schema_name);
        assert_eq!(table.sql_name(), sql_name);
        assert_eq!(table.file_name(), format!("{sql_name}.csv"));
        assert_eq!(table.columns().len(), width);
        assert_eq!(table.columns().first(), Some(&"id"));
    }

    #[rstest]
    fn try_map_stops_at_first_failure() {
        let mut visited = Vec::new();
        let outcome = PerTable::from_fn(|table| table).try_map(|table, _| {
            visited.push(table);
            if table == Table::Ways { Err(table) } else { Ok(()) }
        });
        assert_eq!(outcome, Err(Table::Ways));
        assert_eq!(visited, [Table::Nodes, Table::NodeTags, Table::Ways]);
    }

    #[rstest]
    fn get_mut_addresses_one_table() {
        let mut counts = PerTable::<u64>::default();
        *counts.get_mut(Table::WayTags) += 2;
        let totals: Vec<_> = counts.iter().map(|(_, count)| *count).collect();
        assert_eq!(totals, [0, 0, 0, 0, 2]);
    }
}
