//! Behavioural tests for the convert, load and report entry points.

use camino::{Utf8Path, Utf8PathBuf};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::{cell::RefCell, fs, path::Path};
use tempfile::TempDir;
use wrangle_core::{PerTable, Table};
use wrangle_data::{
    ConvertOptions, ConvertSummary, PipelineError, load_csv_files, open_report_database,
    output_paths, process_map, run_report,
};

fn utf8(path: &Path) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("UTF-8 temp path")
}

fn fixture_path(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Scenario state shared between steps.
struct ConvertWorld {
    workspace: TempDir,
    input: RefCell<Option<Utf8PathBuf>>,
    outcome: RefCell<Option<Result<ConvertSummary, PipelineError>>>,
    database: RefCell<Option<Utf8PathBuf>>,
}

impl ConvertWorld {
    fn output_dir(&self) -> Utf8PathBuf {
        utf8(self.workspace.path()).join("csv")
    }

    fn outputs(&self) -> PerTable<Utf8PathBuf> {
        output_paths(&self.output_dir())
    }

    fn read_table(&self, table: Table) -> String {
        let path = self.outputs().get(table).clone();
        fs::read_to_string(&path).unwrap_or_else(|err| panic!("failed to read {path}: {err}"))
    }

    fn convert(&self, validate: bool) {
        let outcome = {
            let input = self.input.borrow();
            let input = input.as_ref().expect("input fixture selected");
            let options = ConvertOptions {
                validate,
                ..ConvertOptions::default()
            };
            process_map(input, &self.outputs(), &options)
        };
        self.outcome.replace(Some(outcome));
    }
}

#[fixture]
fn world() -> ConvertWorld {
    ConvertWorld {
        workspace: TempDir::new().expect("create temp workspace"),
        input: RefCell::new(None),
        outcome: RefCell::new(None),
        database: RefCell::new(None),
    }
}

fn select_fixture(world: &ConvertWorld, name: &str) {
    world.input.replace(Some(fixture_path(name)));
}

fn table_lines(world: &ConvertWorld, table: Table) -> Vec<String> {
    world
        .read_table(table)
        .lines()
        .map(str::to_owned)
        .collect()
}

#[given("the end-to-end fixture extract")]
fn end_to_end_fixture(world: &ConvertWorld) {
    select_fixture(world, "end_to_end.osm");
}

#[given("an extract whose node lacks a latitude")]
fn missing_latitude_fixture(world: &ConvertWorld) {
    select_fixture(world, "missing_latitude.osm");
}

#[given("the neighbourhood fixture extract")]
fn neighbourhood_fixture(world: &ConvertWorld) {
    select_fixture(world, "neighbourhood.osm");
}

#[when("I convert the extract without validation")]
fn convert_without_validation(world: &ConvertWorld) {
    world.convert(false);
}

#[when("I convert the extract with validation")]
fn convert_with_validation(world: &ConvertWorld) {
    world.convert(true);
}

#[when("I load the tables into SQLite")]
fn load_tables(world: &ConvertWorld) {
    assert!(
        matches!(*world.outcome.borrow(), Some(Ok(_))),
        "conversion should succeed before loading"
    );
    let database = utf8(world.workspace.path()).join("db/extract.db");
    load_csv_files(&database, &world.outputs()).expect("load CSV tables");
    world.database.replace(Some(database));
}

fn assert_table_contains(world: &ConvertWorld, table: Table, line: &str) {
    let expected = line.trim_matches('"');
    let lines = table_lines(world, table);
    assert!(
        lines.iter().any(|candidate| candidate == expected),
        "{table} should contain {expected:?}, got {lines:?}"
    );
}

#[then("the node tags file contains {line}")]
fn node_tags_contain(world: &ConvertWorld, line: String) {
    assert_table_contains(world, Table::NodeTags, &line);
}

#[then("the way nodes file contains {line}")]
fn way_nodes_contain(world: &ConvertWorld, line: String) {
    assert_table_contains(world, Table::WayNodes, &line);
}

#[then("the way tags file contains {line}")]
fn way_tags_contain(world: &ConvertWorld, line: String) {
    assert_table_contains(world, Table::WayTags, &line);
}

#[then("the conversion fails naming the node table")]
fn conversion_fails(world: &ConvertWorld) {
    let outcome = world.outcome.borrow();
    match outcome.as_ref() {
        Some(Err(PipelineError::Validation { source, .. })) => {
            assert_eq!(source.table, Table::Nodes);
            assert!(
                source.to_string().starts_with("element of type 'node'"),
                "unexpected message: {source}"
            );
        }
        other => panic!("expected a validation failure, got {other:?}"),
    }
}

#[then("the nodes file has {count} row")]
fn nodes_file_rows(world: &ConvertWorld, count: usize) {
    let lines = table_lines(world, Table::Nodes);
    assert_eq!(lines.len(), count + 1, "header plus {count} rows: {lines:?}");
}

fn report_rows(world: &ConvertWorld, name: &str) -> Vec<Vec<String>> {
    let database = world.database.borrow();
    let database: &Utf8Path = database.as_ref().expect("database loaded");
    let connection = open_report_database(database).expect("open database");
    run_report(&connection)
        .expect("run report")
        .into_iter()
        .find(|section| section.name == name)
        .unwrap_or_else(|| panic!("missing report section {name}"))
        .rows
}

#[then("the report counts {count} unique users")]
fn report_unique_users(world: &ConvertWorld, count: u64) {
    assert_eq!(report_rows(world, "unique_users"), [[count.to_string()]]);
}

#[then("the report lists {value} among christian denominations")]
fn report_denominations(world: &ConvertWorld, value: String) {
    let expected = value.trim_matches('"');
    let rows = report_rows(world, "christian_denominations");
    assert!(
        rows.iter()
            .any(|row| row.first().map(String::as_str) == Some(expected)),
        "expected {expected:?} in {rows:?}"
    );
}

#[scenario(path = "tests/features/convert_map.feature", index = 0)]
fn cleaning_values_on_the_way_to_csv(world: ConvertWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/convert_map.feature", index = 1)]
fn rejecting_invalid_extracts(world: ConvertWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/convert_map.feature", index = 2)]
fn accepting_invalid_extracts_without_validation(world: ConvertWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/convert_map.feature", index = 3)]
fn reporting_on_a_loaded_extract(world: ConvertWorld) {
    let _ = world;
}
