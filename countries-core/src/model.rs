//! Entity structs for the four cached kinds.
//!
//! Attributes are fixed at construction. Only the identifier changes, once,
//! when storage assigns it; a [`Country`] additionally accumulates relation
//! entries as its currencies, languages and timezones are linked.

use std::collections::BTreeSet;

use crate::entity::{Entity, EntityId, EntityKind, LinkError, require_id};

/// A currency keyed by its ISO 4217 code.
///
/// # Examples
///
/// ```
/// use countries_core::{Currency, Entity, EntityId};
///
/// let mut currency = Currency::new("NGN", "Nigerian naira", "₦");
/// assert!(!currency.is_persisted());
/// currency.assign_id(EntityId::new(1));
/// assert_eq!(currency.natural_key(), "NGN");
/// assert!(currency.is_persisted());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    id: Option<EntityId>,
    code: String,
    name: String,
    symbol: String,
}

impl Currency {
    /// Build a transient currency.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: None,
            code: code.into(),
            name: name.into(),
            symbol: symbol.into(),
        }
    }

    /// Attach a storage identifier, typically when hydrating from rows.
    #[must_use]
    pub const fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// ISO 4217 code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Currency symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Entity for Currency {
    const KIND: EntityKind = EntityKind::Currency;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn natural_key(&self) -> &str {
        &self.code
    }
}

/// A language keyed by its ISO 639-1 code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    id: Option<EntityId>,
    iso639_1: String,
    iso639_2: String,
    name: String,
    native_name: String,
}

impl Language {
    /// Build a transient language.
    #[must_use]
    pub fn new(
        iso639_1: impl Into<String>,
        iso639_2: impl Into<String>,
        name: impl Into<String>,
        native_name: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            iso639_1: iso639_1.into(),
            iso639_2: iso639_2.into(),
            name: name.into(),
            native_name: native_name.into(),
        }
    }

    /// Attach a storage identifier.
    #[must_use]
    pub const fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Two-letter ISO 639-1 code.
    #[must_use]
    pub fn iso639_1(&self) -> &str {
        &self.iso639_1
    }

    /// Three-letter ISO 639-2 code.
    #[must_use]
    pub fn iso639_2(&self) -> &str {
        &self.iso639_2
    }

    /// English name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name in the language itself.
    #[must_use]
    pub fn native_name(&self) -> &str {
        &self.native_name
    }
}

impl Entity for Language {
    const KIND: EntityKind = EntityKind::Language;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn natural_key(&self) -> &str {
        &self.iso639_1
    }
}

/// A timezone keyed by its raw UTC offset label, e.g. `UTC+01:00`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeZone {
    id: Option<EntityId>,
    name: String,
}

impl TimeZone {
    /// Build a transient timezone.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// Attach a storage identifier.
    #[must_use]
    pub const fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Offset label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for TimeZone {
    const KIND: EntityKind = EntityKind::TimeZone;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn natural_key(&self) -> &str {
        &self.name
    }
}

/// Scalar attributes of a country.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryProfile {
    /// Display name; the natural key.
    pub name: String,
    /// Capital city.
    pub capital: String,
    /// ISO 3166-1 alpha-2 code.
    pub alpha2: String,
    /// ISO 3166-1 alpha-3 code.
    pub alpha3: String,
    /// ISO 3166-1 numeric code, empty when unknown.
    pub numeric_code: String,
    /// Primary international calling code.
    pub calling_code: String,
    /// URL of the flag image.
    pub flag_url: String,
    /// Continental region.
    pub region: String,
}

/// A country together with its currency, language and timezone relations.
///
/// Relation sets hold identifiers of entities owned by the
/// [`EntityStore`](crate::EntityStore); linking requires the target to be
/// persisted.
///
/// # Examples
///
/// ```
/// use countries_core::{Country, CountryProfile, Currency, EntityId, LinkError};
///
/// let mut country = Country::new(CountryProfile {
///     name: "Nigeria".into(),
///     ..CountryProfile::default()
/// });
/// let transient = Currency::new("NGN", "Nigerian naira", "₦");
/// assert!(matches!(
///     country.link_currency(&transient),
///     Err(LinkError::Unpersisted { .. })
/// ));
///
/// let naira = transient.with_id(EntityId::new(3));
/// assert_eq!(country.link_currency(&naira), Ok(true));
/// assert_eq!(country.link_currency(&naira), Ok(false));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    id: Option<EntityId>,
    profile: CountryProfile,
    currencies: BTreeSet<EntityId>,
    languages: BTreeSet<EntityId>,
    timezones: BTreeSet<EntityId>,
}

impl Country {
    /// Build a transient country with empty relation sets.
    #[must_use]
    pub const fn new(profile: CountryProfile) -> Self {
        Self {
            id: None,
            profile,
            currencies: BTreeSet::new(),
            languages: BTreeSet::new(),
            timezones: BTreeSet::new(),
        }
    }

    /// Attach a storage identifier.
    #[must_use]
    pub const fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Scalar attributes.
    #[must_use]
    pub const fn profile(&self) -> &CountryProfile {
        &self.profile
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.profile.name
    }

    /// Identifiers of linked currencies, ascending.
    #[must_use]
    pub const fn currencies(&self) -> &BTreeSet<EntityId> {
        &self.currencies
    }

    /// Identifiers of linked languages, ascending.
    #[must_use]
    pub const fn languages(&self) -> &BTreeSet<EntityId> {
        &self.languages
    }

    /// Identifiers of linked timezones, ascending.
    #[must_use]
    pub const fn timezones(&self) -> &BTreeSet<EntityId> {
        &self.timezones
    }

    /// Link a persisted currency. Returns `false` when it was already linked.
    pub fn link_currency(&mut self, currency: &Currency) -> Result<bool, LinkError> {
        Ok(self.currencies.insert(require_id(currency)?))
    }

    /// Link a persisted language. Returns `false` when it was already linked.
    pub fn link_language(&mut self, language: &Language) -> Result<bool, LinkError> {
        Ok(self.languages.insert(require_id(language)?))
    }

    /// Link a persisted timezone. Returns `false` when it was already linked.
    pub fn link_timezone(&mut self, timezone: &TimeZone) -> Result<bool, LinkError> {
        Ok(self.timezones.insert(require_id(timezone)?))
    }

    /// Relation set holding identifiers of `kind`. Countries never relate to
    /// other countries.
    pub(crate) const fn relation_mut(
        &mut self,
        kind: EntityKind,
    ) -> Option<&mut BTreeSet<EntityId>> {
        match kind {
            EntityKind::Currency => Some(&mut self.currencies),
            EntityKind::Language => Some(&mut self.languages),
            EntityKind::TimeZone => Some(&mut self.timezones),
            EntityKind::Country => None,
        }
    }
}

impl Entity for Country {
    const KIND: EntityKind = EntityKind::Country;

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn assign_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn natural_key(&self) -> &str {
        &self.profile.name
    }
}
