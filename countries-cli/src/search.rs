//! Search command: query the upstream service without touching the cache.

use std::io::Write;

use clap::Parser;
use countries_data::batch_search;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::remote::{ApiSettings, HttpLookupBuilder, LookupBuilder};
use crate::{
    ARG_API_BASE_URL, ARG_QUERY, ARG_TIMEOUT_SECS, ARG_USER_AGENT, CliError, ENV_SEARCH_QUERY,
    write_json,
};

/// CLI arguments for the `search` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "search",
    long_about = "Look the term up by name, code, capital city, currency and \
                 language, in that order, and print every matching record as \
                 a single JSON list. Whitespace in the term is ignored and \
                 failing lookups are skipped with a warning.",
    about = "Search the upstream country service"
)]
#[ortho_config(prefix = "COUNTRIES")]
pub(crate) struct SearchArgs {
    /// Term to search for.
    #[arg(value_name = "query")]
    #[serde(default)]
    pub(crate) query: Option<String>,
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

impl SearchArgs {
    fn into_config(self) -> Result<SearchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SearchConfig::try_from(merged)
    }
}

/// Resolved `search` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchConfig {
    pub(crate) query: String,
    pub(crate) api: ApiSettings,
}

impl TryFrom<SearchArgs> for SearchConfig {
    type Error = CliError;

    fn try_from(args: SearchArgs) -> Result<Self, Self::Error> {
        let query = args.query.ok_or(CliError::MissingArgument {
            field: ARG_QUERY,
            env: ENV_SEARCH_QUERY,
        })?;
        let api = ApiSettings::resolve(args.api_base_url, args.timeout_secs, args.user_agent)?;
        Ok(Self { query, api })
    }
}

pub(super) fn run_search(args: SearchArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_search_with(args, &HttpLookupBuilder, &mut stdout)
}

pub(super) fn run_search_with(
    args: SearchArgs,
    builder: &dyn LookupBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let lookup = builder.build(&config.api)?;
    let outcome = batch_search(&*lookup, &config.query)?;
    write_json(writer, &outcome)
}
