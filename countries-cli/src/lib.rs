//! Command-line interface for the countries cache.
//!
//! `prefetch` prints the cached snapshot, `search` queries the upstream
//! service across every dimension, and `import` reconciles search results
//! into the cache.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use serde::Serialize;

mod error;
mod import;
mod prefetch;
mod remote;
mod search;

pub use error::CliError;

use import::{ImportArgs, run_import};
use prefetch::{PrefetchArgs, run_prefetch};
use search::{SearchArgs, run_search};

pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_API_BASE_URL: &str = "api-base-url";
pub(crate) const ARG_TIMEOUT_SECS: &str = "timeout-secs";
pub(crate) const ARG_USER_AGENT: &str = "user-agent";
pub(crate) const ARG_QUERY: &str = "query";
pub(crate) const ENV_PREFETCH_DATABASE: &str = "COUNTRIES_CMDS_PREFETCH_DATABASE";
pub(crate) const ENV_IMPORT_DATABASE: &str = "COUNTRIES_CMDS_IMPORT_DATABASE";
pub(crate) const ENV_IMPORT_QUERY: &str = "COUNTRIES_CMDS_IMPORT_QUERY";
pub(crate) const ENV_SEARCH_QUERY: &str = "COUNTRIES_CMDS_SEARCH_QUERY";

/// Run the countries CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when argument parsing, configuration, storage, the
/// upstream service or output fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Prefetch(args) => run_prefetch(args),
        Command::Search(args) => run_search(args),
        Command::Import(args) => run_import(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "countries",
    about = "Cache and search country reference data",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every cached country with its currencies, languages and time zones.
    Prefetch(PrefetchArgs),
    /// Search the upstream service by name, code, capital, currency and language.
    Search(SearchArgs),
    /// Search the upstream service and store new countries in the cache.
    Import(ImportArgs),
}

/// Pretty-print `value` as JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
