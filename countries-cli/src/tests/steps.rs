//! Behaviour-driven step definitions driving the CLI scenarios.

use std::cell::RefCell;
use std::path::PathBuf;

use super::helpers::StubLookupBuilder;
use super::*;
use crate::import::run_import_with;
use crate::prefetch::run_prefetch_with;
use crate::search::run_search_with;
use countries_core::CountryView;
use countries_data::lookup::{SearchDimension, SearchError};
use countries_data::test_support::nigeria;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use tempfile::TempDir;

#[derive(Debug)]
struct CliWorld {
    _tmp: TempDir,
    database: PathBuf,
    builder: RefCell<StubLookupBuilder>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl CliWorld {
    fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let database = tmp.path().join("cache").join("countries.db");
        Self {
            _tmp: tmp,
            database,
            builder: RefCell::new(StubLookupBuilder::default()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn database_arg(&self) -> String {
        self.database.display().to_string()
    }

    fn run(&self, argv: &[&str]) {
        let parsed = Cli::try_parse_from(argv).map_err(CliError::from);
        let builder = self.builder.borrow();
        let mut buffer = self.stdout.borrow_mut();
        buffer.clear();
        let outcome = parsed.and_then(|cli| match cli.command {
            Command::Prefetch(args) => run_prefetch_with(args, &mut *buffer),
            Command::Search(args) => run_search_with(args, &*builder, &mut *buffer),
            Command::Import(args) => run_import_with(args, &*builder, &mut *buffer),
        });
        drop(buffer);
        self.result.replace(Some(outcome));
    }

    fn assert_succeeded(&self) {
        let borrowed = self.result.borrow();
        let result = borrowed.as_ref().expect("result recorded");
        if let Err(err) = result {
            panic!("expected success, found {err:?}");
        }
    }

    fn stdout_json(&self) -> Value {
        let stdout = String::from_utf8(self.stdout.borrow().clone()).expect("stdout utf-8");
        serde_json::from_str(&stdout).expect("output should be JSON")
    }

    fn with_error(&self, check: impl FnOnce(&CliError)) {
        let borrowed = self.result.borrow();
        let error = borrowed
            .as_ref()
            .expect("result recorded")
            .as_ref()
            .expect_err("expected error");
        check(error);
    }
}

#[fixture]
fn world() -> CliWorld {
    CliWorld::new()
}

#[given("a fresh cache database path")]
fn fresh_database(#[from(world)] world: &CliWorld) {
    assert!(!world.database.exists());
}

#[given("an upstream service that knows Nigeria")]
fn upstream_knows_nigeria(#[from(world)] world: &CliWorld) {
    world.builder.replace(
        StubLookupBuilder::default().with_records(SearchDimension::Name, vec![nigeria()]),
    );
}

#[when("I run the prefetch command")]
fn run_prefetch_command(#[from(world)] world: &CliWorld) {
    let database = world.database_arg();
    world.run(&["countries", "prefetch", "--database", database.as_str()]);
}

#[when("I run the prefetch command without a database")]
fn run_prefetch_without_database(#[from(world)] world: &CliWorld) {
    world.run(&["countries", "prefetch"]);
}

#[when("I import Nigeria")]
fn import_nigeria(#[from(world)] world: &CliWorld) {
    let database = world.database_arg();
    world.run(&["countries", "import", "Nigeria", "--database", database.as_str()]);
}

#[when("I search for Nigeria")]
fn search_nigeria(#[from(world)] world: &CliWorld) {
    world.run(&["countries", "search", " Nige ria "]);
}

#[when("I search for a blank term")]
fn search_blank(#[from(world)] world: &CliWorld) {
    world.run(&["countries", "search", "   "]);
}

#[then("the command succeeds and prints an empty JSON list")]
fn prints_empty_list(#[from(world)] world: &CliWorld) {
    world.assert_succeeded();
    assert_eq!(world.stdout_json(), Value::Array(Vec::new()));
}

#[then("the cache database file exists")]
fn database_exists(#[from(world)] world: &CliWorld) {
    assert!(world.database.is_file());
}

#[then("the command succeeds and reports one country created")]
fn reports_one_created(#[from(world)] world: &CliWorld) {
    world.assert_succeeded();
    let summary = world.stdout_json();
    assert_eq!(summary["countries_created"], 1);
    assert_eq!(summary["currencies_created"], 1);
    assert_eq!(summary["failed_dimensions"], Value::Array(Vec::new()));
}

#[then("the printed snapshot lists Nigeria with the currency NGN")]
fn snapshot_lists_nigeria(#[from(world)] world: &CliWorld) {
    world.assert_succeeded();
    let views: Vec<CountryView> =
        serde_json::from_value(world.stdout_json()).expect("output should be country views");
    assert_eq!(views.len(), 1);
    let nigeria = &views[0];
    assert_eq!(nigeria.name, "Nigeria");
    let codes: Vec<_> = nigeria
        .currencies
        .iter()
        .map(|currency| currency.code.as_str())
        .collect();
    assert_eq!(codes, vec!["NGN"]);
}

#[then("the command succeeds and prints one raw record")]
fn prints_one_raw_record(#[from(world)] world: &CliWorld) {
    world.assert_succeeded();
    let records = world.stdout_json();
    let records = records.as_array().expect("output should be a JSON list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "Nigeria");
    assert_eq!(records[0]["alpha2Code"], "NG");
    let settings = world
        .builder
        .borrow()
        .settings()
        .expect("lookup should have been built");
    assert_eq!(settings.user_agent, "countries-cache/0.1");
}

#[then("the command fails because the search term is empty")]
fn fails_empty_term(#[from(world)] world: &CliWorld) {
    world.with_error(|error| match error {
        CliError::Search(SearchError::EmptyTerm) => {}
        other => panic!("expected Search(EmptyTerm), found {other:?}"),
    });
}

#[then("the command fails because the database is missing")]
fn fails_missing_database(#[from(world)] world: &CliWorld) {
    world.with_error(|error| match error {
        CliError::MissingArgument { field, env } => {
            assert_eq!(*field, ARG_DATABASE);
            assert_eq!(*env, ENV_PREFETCH_DATABASE);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    });
}

macro_rules! register_cli_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/countries_cli.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: CliWorld) {
            let _ = world;
        }
    };
}

register_cli_scenario!(prefetch_new_cache, "prefetching a new cache");
register_cli_scenario!(import_then_prefetch, "importing a country then prefetching it");
register_cli_scenario!(search_prints_raw_records, "searching prints the raw upstream records");
register_cli_scenario!(search_rejects_blank_term, "rejecting a blank search term");
register_cli_scenario!(prefetch_requires_database, "rejecting a missing database");
