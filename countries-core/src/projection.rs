//! Serialisable views of cached entities.
//!
//! Views flatten a [`Country`] and the entities it references into plain
//! records suitable for JSON transport. Nested sequences follow the relation
//! set order, which is ascending by identifier.

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::model::{Country, Currency, Language, TimeZone};
use crate::store::{EntityStore, ReferentialError, Stored};

/// Projected currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyView {
    /// Storage identifier.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// ISO 4217 code.
    pub code: String,
    /// Currency symbol.
    pub symbol: String,
}

/// Projected language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageView {
    /// Storage identifier.
    pub id: EntityId,
    /// ISO 639-1 code.
    pub iso639_1: String,
    /// ISO 639-2 code.
    pub iso639_2: String,
    /// English name.
    pub name: String,
    /// Native name.
    #[serde(rename = "nativeName")]
    pub native_name: String,
}

/// Projected timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeZoneView {
    /// Storage identifier.
    pub id: EntityId,
    /// Offset label.
    pub name: String,
}

/// Projected country with its related entities inlined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryView {
    /// Storage identifier.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Capital city.
    pub capital: String,
    /// ISO 3166-1 alpha-2 code.
    pub alpha2: String,
    /// ISO 3166-1 alpha-3 code.
    pub alpha3: String,
    /// ISO 3166-1 numeric code, empty when unknown.
    pub numeric_code: String,
    /// Primary calling code.
    pub calling_code: String,
    /// Flag image URL.
    pub flag_url: String,
    /// Continental region.
    pub region: String,
    /// Linked currencies.
    pub currencies: Vec<CurrencyView>,
    /// Linked languages.
    pub languages: Vec<LanguageView>,
    /// Linked timezones.
    pub timezones: Vec<TimeZoneView>,
}

impl CurrencyView {
    fn new(id: EntityId, currency: &Currency) -> Self {
        Self {
            id,
            name: currency.name().to_owned(),
            code: currency.code().to_owned(),
            symbol: currency.symbol().to_owned(),
        }
    }
}

impl LanguageView {
    fn new(id: EntityId, language: &Language) -> Self {
        Self {
            id,
            iso639_1: language.iso639_1().to_owned(),
            iso639_2: language.iso639_2().to_owned(),
            name: language.name().to_owned(),
            native_name: language.native_name().to_owned(),
        }
    }
}

impl TimeZoneView {
    fn new(id: EntityId, timezone: &TimeZone) -> Self {
        Self {
            id,
            name: timezone.name().to_owned(),
        }
    }
}

/// Project one registered country.
///
/// # Errors
///
/// Returns [`ReferentialError`] when a relation names an entity the store
/// does not hold.
///
/// # Examples
///
/// ```
/// use countries_core::{Country, CountryProfile, Currency, EntityId, EntityStore, project_country};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = EntityStore::new();
/// let naira = Currency::new("NGN", "Nigerian naira", "₦").with_id(EntityId::new(1));
/// let mut nigeria = Country::new(CountryProfile {
///     name: "Nigeria".into(),
///     ..CountryProfile::default()
/// })
/// .with_id(EntityId::new(1));
/// nigeria.link_currency(&naira)?;
/// store.add_currency(naira)?;
///
/// let view = project_country(&store, EntityId::new(1), &nigeria)?;
/// assert_eq!(view.currencies[0].code, "NGN");
/// # Ok(())
/// # }
/// ```
pub fn project_country(
    store: &EntityStore,
    id: EntityId,
    country: &Country,
) -> Result<CountryView, ReferentialError> {
    let profile = country.profile();
    Ok(CountryView {
        id,
        name: profile.name.clone(),
        capital: profile.capital.clone(),
        alpha2: profile.alpha2.clone(),
        alpha3: profile.alpha3.clone(),
        numeric_code: profile.numeric_code.clone(),
        calling_code: profile.calling_code.clone(),
        flag_url: profile.flag_url.clone(),
        region: profile.region.clone(),
        currencies: project_related(store, id, country.currencies(), CurrencyView::new)?,
        languages: project_related(store, id, country.languages(), LanguageView::new)?,
        timezones: project_related(store, id, country.timezones(), TimeZoneView::new)?,
    })
}

/// Project every registered country in identifier order.
///
/// # Errors
///
/// Returns the first [`ReferentialError`] encountered.
pub fn snapshot(store: &EntityStore) -> Result<Vec<CountryView>, ReferentialError> {
    store
        .all::<Country>()
        .iter()
        .map(|(id, country)| project_country(store, id, country))
        .collect()
}

/// Render the snapshot as a JSON value.
///
/// # Errors
///
/// Returns [`ProjectionError`] when the store is inconsistent or the views
/// cannot be encoded.
pub fn snapshot_json(store: &EntityStore) -> Result<serde_json::Value, ProjectionError> {
    let views = snapshot(store)?;
    serde_json::to_value(views).map_err(ProjectionError::Encode)
}

/// Errors raised while rendering a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    /// A relation pointed at a missing entity.
    #[error(transparent)]
    Referential(#[from] ReferentialError),
    /// JSON encoding failed.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
}

fn project_related<'a, E, V, I>(
    store: &EntityStore,
    country: EntityId,
    ids: I,
    view: fn(EntityId, &E) -> V,
) -> Result<Vec<V>, ReferentialError>
where
    E: Stored,
    I: IntoIterator<Item = &'a EntityId>,
{
    ids.into_iter()
        .map(|id| {
            store
                .find::<E>(*id)
                .map(|entity| view(*id, entity))
                .ok_or(ReferentialError {
                    country,
                    kind: E::KIND,
                    id: *id,
                })
        })
        .collect()
}
