//! Core domain types for the countries cache.
//!
//! The crate defines the four cached entity kinds, the [`Entity`] capability
//! they share, the in-memory [`EntityStore`] that owns them, and the
//! serialisable projections served to clients. It performs no I/O; loading
//! and persistence live in `countries-data`.
//!
//! Invariants:
//! - Natural keys are unique per kind within a store.
//! - Relations only reference persisted entities.
//! - No global mutable state: callers own the store explicitly.
#![forbid(unsafe_code)]

mod entity;
mod model;
mod projection;
mod store;

pub use entity::{Entity, EntityId, EntityKind, LinkError};
pub use model::{Country, CountryProfile, Currency, Language, TimeZone};
pub use projection::{
    CountryView, CurrencyView, LanguageView, ProjectionError, TimeZoneView, project_country,
    snapshot, snapshot_json,
};
pub use store::{Collection, EntityStore, ReferentialError, Related, StoreError, Stored};
