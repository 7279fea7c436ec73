//! Facade crate for the countries reference-data cache.
//!
//! Re-exports the entity model and store from `countries-core` and, behind
//! the `data` feature, the SQLite gateway, loader, reconciler and upstream
//! lookup client from `countries-data`.

#![forbid(unsafe_code)]

pub use countries_core::{
    Country, CountryProfile, CountryView, Currency, CurrencyView, Entity, EntityId, EntityKind,
    EntityStore, Language, LanguageView, LinkError, ProjectionError, ReferentialError, Related,
    StoreError, TimeZone, TimeZoneView, project_country, snapshot, snapshot_json,
};

#[cfg(feature = "data")]
pub use countries_data::{
    CountryLookup, CountryRecord, HttpCountryApi, HttpCountryApiConfig, LoadError, ReconcileError,
    ReconcileReport, Reconciler, SearchDimension, SearchOutcome, SqliteGateway, StorageGateway,
    batch_search, load_store,
};
