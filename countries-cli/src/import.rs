//! Import command: search upstream and reconcile the results into the cache.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use countries_data::{ReconcileReport, Reconciler, batch_search};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::prefetch::open_cache;
use crate::remote::{ApiSettings, HttpLookupBuilder, LookupBuilder};
use crate::{
    ARG_API_BASE_URL, ARG_DATABASE, ARG_QUERY, ARG_TIMEOUT_SECS, ARG_USER_AGENT, CliError,
    ENV_IMPORT_DATABASE, ENV_IMPORT_QUERY, write_json,
};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import",
    long_about = "Search the upstream service like `search`, then store every \
                 country not already cached together with its currencies, \
                 languages and time zones. Prints the reconciliation counts.",
    about = "Import matching countries into the cache"
)]
#[ortho_config(prefix = "COUNTRIES")]
pub(crate) struct ImportArgs {
    /// Term to search for.
    #[arg(value_name = "query")]
    #[serde(default)]
    pub(crate) query: Option<String>,
    /// Path to the SQLite cache database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<PathBuf>,
    /// Base URL of the REST Countries API.
    #[arg(long = ARG_API_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) api_base_url: Option<String>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// User agent sent with upstream requests.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
}

impl ImportArgs {
    fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

/// Resolved `import` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    pub(crate) query: String,
    pub(crate) database: PathBuf,
    pub(crate) api: ApiSettings,
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let query = args.query.ok_or(CliError::MissingArgument {
            field: ARG_QUERY,
            env: ENV_IMPORT_QUERY,
        })?;
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_IMPORT_DATABASE,
        })?;
        let api = ApiSettings::resolve(args.api_base_url, args.timeout_secs, args.user_agent)?;
        Ok(Self {
            query,
            database,
            api,
        })
    }
}

/// Output of a successful import.
#[derive(Debug, Serialize)]
pub(crate) struct ImportSummary {
    /// Records returned by the search, duplicates included.
    pub(crate) records_found: usize,
    /// Search dimensions that failed.
    pub(crate) failed_dimensions: Vec<&'static str>,
    /// Reconciliation counts.
    #[serde(flatten)]
    pub(crate) report: ReconcileReport,
}

pub(super) fn run_import(args: ImportArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_import_with(args, &HttpLookupBuilder, &mut stdout)
}

pub(super) fn run_import_with(
    args: ImportArgs,
    builder: &dyn LookupBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let (mut gateway, mut store) = open_cache(&config.database)?;
    let lookup = builder.build(&config.api)?;
    let outcome = batch_search(&*lookup, &config.query)?;
    let report = Reconciler::new(&mut gateway, &mut store).reconcile(&outcome.records)?;
    info!(
        "imported {} new countries into {}",
        report.countries_created,
        config.database.display()
    );
    let summary = ImportSummary {
        records_found: outcome.records.len(),
        failed_dimensions: outcome
            .failures
            .iter()
            .map(|failure| failure.dimension.as_str())
            .collect(),
        report,
    };
    write_json(writer, &summary)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ImportConfig, CliError> {
    let merged = ImportArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ImportConfig::try_from(merged)
}
