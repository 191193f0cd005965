//! Behaviour-driven step definitions driving the wrangle command scenarios.

use super::helpers::{Workspace, invoke, write_utf8};
use super::*;
use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use rusqlite::Connection;
use std::cell::{Cell, RefCell};

/// Aggregates command scenario state so each step only needs a single world
/// argument.
#[derive(Debug)]
struct CommandWorld {
    workspace: Workspace,
    extract_configured: Cell<bool>,
    output_dir: RefCell<Option<Utf8PathBuf>>,
    outcome: RefCell<Option<Result<(), CliError>>>,
}

impl CommandWorld {
    fn new() -> Self {
        Self {
            workspace: Workspace::new(),
            extract_configured: Cell::new(false),
            output_dir: RefCell::new(None),
            outcome: RefCell::new(None),
        }
    }

    fn output_dir(&self) -> Utf8PathBuf {
        self.output_dir
            .borrow()
            .clone()
            .unwrap_or_else(|| self.workspace.csv_dir())
    }

    fn run(&self, command: &str, with_database: bool) {
        let mut args = vec![command.to_owned()];
        if self.extract_configured.get() {
            args.extend([
                format!("--{ARG_OSM_XML}"),
                self.workspace.extract().into_string(),
            ]);
        }
        args.extend([format!("--{ARG_OUTPUT_DIR}"), self.output_dir().into_string()]);
        if with_database {
            args.extend([
                format!("--{ARG_DATABASE}"),
                self.workspace.database().into_string(),
            ]);
        }
        let (outcome, _) = invoke(args);
        self.outcome.replace(Some(outcome));
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.outcome.borrow(), |outcome| {
            outcome
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }
}

#[fixture]
fn world() -> CommandWorld {
    CommandWorld::new()
}

#[given("an extract on disk")]
fn extract_on_disk(#[from(world)] world: &CommandWorld) {
    world.workspace.write_extract();
    world.extract_configured.set(true);
}

#[given("no extract is configured")]
fn no_extract(#[from(world)] world: &CommandWorld) {
    world.extract_configured.set(false);
}

#[given("the output directory is an existing file")]
fn output_dir_is_file(#[from(world)] world: &CommandWorld) {
    let path = world.workspace.root().join("occupied");
    write_utf8(&path, b"not a directory");
    world.output_dir.replace(Some(path));
}

#[when("I run the {command} command with the extract and a database")]
fn run_with_database(#[from(world)] world: &CommandWorld, command: String) {
    world.run(command.trim_matches('"'), true);
}

#[when("I run the {command} command with the extract")]
fn run_without_database(#[from(world)] world: &CommandWorld, command: String) {
    world.run(command.trim_matches('"'), false);
}

#[then("the command succeeds")]
fn command_succeeds(#[from(world)] world: &CommandWorld) {
    let outcome = world.outcome.borrow();
    if let Some(Err(err)) = outcome.as_ref() {
        panic!("command failed: {err}");
    }
    assert!(outcome.is_some(), "command was not run");
}

#[then("the database records {count} unique users")]
fn database_records_users(#[from(world)] world: &CommandWorld, count: i64) {
    let connection = Connection::open(world.workspace.database()).expect("open database");
    let users: i64 = connection
        .query_row(
            "SELECT COUNT(DISTINCT uid) FROM (SELECT uid FROM nodes UNION ALL SELECT uid FROM ways)",
            [],
            |row| row.get(0),
        )
        .expect("count users");
    assert_eq!(users, count);
}

#[then("the CLI reports that the {flag} flag is missing")]
fn reports_missing_flag(#[from(world)] world: &CommandWorld, flag: String) {
    match &*world.error() {
        CliError::MissingArgument { field, .. } => assert_eq!(*field, flag.trim_matches('"')),
        other => panic!("unexpected error {other:?}"),
    }
}

#[then("the CLI reports that the output directory is not a directory")]
fn reports_output_not_directory(#[from(world)] world: &CommandWorld) {
    match &*world.error() {
        CliError::OutputDirectoryNotDirectory { path } => {
            assert_eq!(*path, world.output_dir());
        }
        other => panic!("unexpected error {other:?}"),
    }
}

macro_rules! register_command_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/wrangle_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: CommandWorld) {
            let _ = world;
        }
    };
}

register_command_scenario!(ingesting_into_sqlite, "ingesting an extract into SQLite");
register_command_scenario!(rejecting_missing_extract, "rejecting a missing extract flag");
register_command_scenario!(refusing_file_output_dir, "refusing to write tables over a file");
