//! Error types emitted by the countries CLI.

use std::{path::PathBuf, sync::Arc};

use countries_core::ReferentialError;
use countries_data::lookup::{ApiBuildError, SearchError};
use countries_data::{GatewayError, LoadError, ReconcileError};
use thiserror::Error;

/// Errors emitted by the countries CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag or positional name.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// The request timeout must be at least one second.
    #[error("{field} must be greater than zero")]
    ZeroTimeout {
        /// Flag carrying the timeout.
        field: &'static str,
    },
    /// Opening or initialising the cache database failed.
    #[error("failed to open cache database {path:?}: {source}")]
    OpenCache {
        /// Database path.
        path: PathBuf,
        /// Gateway failure.
        #[source]
        source: GatewayError,
    },
    /// Hydrating the entity store from the database failed.
    #[error("failed to load cache from {path:?}: {source}")]
    LoadCache {
        /// Database path.
        path: PathBuf,
        /// Loader failure.
        #[source]
        source: LoadError,
    },
    /// The loaded cache holds a dangling relation.
    #[error("cache is inconsistent: {0}")]
    Inconsistent(#[from] ReferentialError),
    /// Constructing the upstream client failed.
    #[error("failed to build country lookup for {base_url:?}: {source}")]
    BuildLookup {
        /// Configured base URL.
        base_url: String,
        /// Construction failure.
        #[source]
        source: ApiBuildError,
    },
    /// The search term was rejected.
    #[error(transparent)]
    Search(#[from] SearchError),
    /// Reconciling search results into the cache failed.
    #[error("failed to import countries: {0}")]
    Reconcile(#[from] ReconcileError),
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
