//! Storage, loading, reconciliation and upstream lookups for the countries
//! cache.
//!
//! Responsibilities:
//! - Wrap SQLite behind the [`StorageGateway`] seam and own the schema.
//! - Hydrate an [`EntityStore`](countries_core::EntityStore) at startup.
//! - Reconcile upstream [`CountryRecord`]s into storage and the store.
//! - Query the REST Countries API through [`CountryLookup`].
//!
//! Boundaries:
//! - Entity rules and projections live in `countries-core`.
//! - Configuration and output formatting live in the CLI.
//!
//! Invariants:
//! - Statements are parameterised; values are never spliced into SQL.
//! - No global mutable state.
#![forbid(unsafe_code)]

pub mod gateway;
mod loader;
pub mod lookup;
mod persist;
mod reconcile;
mod record;
pub mod schema;

#[doc(hidden)]
pub mod test_support;

pub use gateway::{GatewayError, SqliteGateway, StorageGateway};
pub use loader::{LoadError, load_store};
pub use lookup::{
    CountryLookup, HttpCountryApi, HttpCountryApiConfig, LookupError, SearchDimension,
    SearchOutcome, batch_search,
};
pub use reconcile::{ReconcileError, ReconcileReport, Reconciler};
pub use record::{CountryRecord, CurrencyRecord, LanguageRecord, NO_CURRENCY_CODE};
