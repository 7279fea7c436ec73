//! Prefetch command: print the cached snapshot.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use countries_core::{EntityStore, snapshot};
use countries_data::{SqliteGateway, load_store};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{ARG_DATABASE, CliError, ENV_PREFETCH_DATABASE, write_json};

/// CLI arguments for the `prefetch` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "prefetch",
    long_about = "Load the cache database and print every country with its \
                 currencies, languages and time zones as JSON. The database \
                 is created empty when it does not exist yet.",
    about = "Print the cached countries"
)]
#[ortho_config(prefix = "COUNTRIES")]
pub(crate) struct PrefetchArgs {
    /// Path to the SQLite cache database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<PathBuf>,
}

impl PrefetchArgs {
    fn into_config(self) -> Result<PrefetchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        PrefetchConfig::try_from(merged)
    }
}

/// Resolved `prefetch` configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PrefetchConfig {
    pub(crate) database: PathBuf,
}

impl TryFrom<PrefetchArgs> for PrefetchConfig {
    type Error = CliError;

    fn try_from(args: PrefetchArgs) -> Result<Self, Self::Error> {
        let database = args.database.ok_or(CliError::MissingArgument {
            field: ARG_DATABASE,
            env: ENV_PREFETCH_DATABASE,
        })?;
        Ok(Self { database })
    }
}

/// Open the cache database and hydrate a store from it.
pub(crate) fn open_cache(path: &Path) -> Result<(SqliteGateway, EntityStore), CliError> {
    let gateway = SqliteGateway::open(path).map_err(|source| CliError::OpenCache {
        path: path.to_path_buf(),
        source,
    })?;
    let store = load_store(&gateway).map_err(|source| CliError::LoadCache {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((gateway, store))
}

pub(super) fn run_prefetch(args: PrefetchArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_prefetch_with(args, &mut stdout)
}

pub(super) fn run_prefetch_with(args: PrefetchArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let (_gateway, store) = open_cache(&config.database)?;
    let views = snapshot(&store)?;
    info!("prefetched {} countries from {}", views.len(), config.database.display());
    write_json(writer, &views)
}
