//! In-memory registry of cached entities.
//!
//! The [`EntityStore`] owns one [`Collection`] per entity kind. Collections
//! are keyed by storage identifier and maintain a secondary natural-key index
//! so deduplication lookups do not scan. Iteration is in ascending identifier
//! order.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::entity::{Entity, EntityId, EntityKind};
use crate::model::{Country, Currency, Language, TimeZone};

/// Errors raised when registering entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The entity has no storage identifier to be keyed under.
    #[error("{kind} {key:?} has no identifier; persist it before registering")]
    Unidentified {
        /// Kind of the rejected entity.
        kind: EntityKind,
        /// Natural key of the rejected entity.
        key: String,
    },
    /// Another entity of the same kind already holds the natural key.
    #[error("{kind} {key:?} is already registered under {existing}")]
    DuplicateKey {
        /// Kind of the rejected entity.
        kind: EntityKind,
        /// Contested natural key.
        key: String,
        /// Identifier currently holding the key.
        existing: EntityId,
    },
}

/// A relation entry pointing at an entity the store does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("country {country} references {kind} {id}, which is not in the store")]
pub struct ReferentialError {
    /// Country holding the dangling relation.
    pub country: EntityId,
    /// Kind of the missing entity.
    pub kind: EntityKind,
    /// Identifier of the missing entity.
    pub id: EntityId,
}

/// Identifier-keyed entities of one kind with a natural-key index.
#[derive(Debug, Clone)]
pub struct Collection<E> {
    by_id: BTreeMap<EntityId, E>,
    by_key: HashMap<String, EntityId>,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self {
            by_id: BTreeMap::new(),
            by_key: HashMap::new(),
        }
    }
}

impl<E: Entity> Collection<E> {
    /// Register `entity` under its identifier, replacing any previous entry
    /// with the same identifier. The replaced entry is returned.
    ///
    /// A natural key held by a different identifier is rejected and the
    /// collection is left unchanged.
    pub fn insert(&mut self, entity: E) -> Result<Option<E>, StoreError> {
        let key = entity.natural_key().to_owned();
        let Some(id) = entity.id() else {
            return Err(StoreError::Unidentified { kind: E::KIND, key });
        };
        if let Some(&existing) = self.by_key.get(&key)
            && existing != id
        {
            return Err(StoreError::DuplicateKey {
                kind: E::KIND,
                key,
                existing,
            });
        }
        let previous = self.by_id.insert(id, entity);
        if let Some(old) = &previous
            && self.by_key.get(old.natural_key()) == Some(&id)
        {
            self.by_key.remove(old.natural_key());
        }
        self.by_key.insert(key, id);
        Ok(previous)
    }

    /// Look up an entity by identifier.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&E> {
        self.by_id.get(&id)
    }

    /// Look up an entity by natural key.
    #[must_use]
    pub fn find_by_key(&self, key: &str) -> Option<&E> {
        self.by_key.get(key).and_then(|id| self.by_id.get(id))
    }

    /// Whether an entity with `id` is registered.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Entities in ascending identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &E)> + '_ {
        self.by_id.iter().map(|(id, entity)| (*id, entity))
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the collection holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for crate::Currency {}
    impl Sealed for crate::Language {}
    impl Sealed for crate::TimeZone {}
}

/// Entity kinds a country can be related to.
pub trait Related: Stored + sealed::Sealed {}

impl Related for Currency {}
impl Related for Language {}
impl Related for TimeZone {}

/// Gives generic access to the collection holding an entity kind.
pub trait Stored: Entity + Sized {
    /// Collection for this kind.
    fn collection(store: &EntityStore) -> &Collection<Self>;

    /// Mutable collection for this kind.
    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self>;
}

macro_rules! stored {
    ($entity:ty, $field:ident) => {
        impl Stored for $entity {
            fn collection(store: &EntityStore) -> &Collection<Self> {
                &store.$field
            }

            fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
                &mut store.$field
            }
        }
    };
}

stored!(Country, countries);
stored!(Currency, currencies);
stored!(Language, languages);
stored!(TimeZone, timezones);

/// Authoritative in-memory cache of countries and their related entities.
///
/// # Examples
///
/// ```
/// use countries_core::{Currency, EntityId, EntityStore};
///
/// # fn main() -> Result<(), countries_core::StoreError> {
/// let mut store = EntityStore::new();
/// store.add_currency(Currency::new("NGN", "Nigerian naira", "₦").with_id(EntityId::new(1)))?;
///
/// let found = store.find_by_key::<Currency>("NGN").map(Currency::name);
/// assert_eq!(found, Some("Nigerian naira"));
/// assert!(store.find::<Currency>(EntityId::new(2)).is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    countries: Collection<Country>,
    currencies: Collection<Currency>,
    languages: Collection<Language>,
    timezones: Collection<TimeZone>,
}

impl EntityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a persisted entity of any kind (last write wins per identifier).
    pub fn insert<E: Stored>(&mut self, entity: E) -> Result<Option<E>, StoreError> {
        E::collection_mut(self).insert(entity)
    }

    /// Look up an entity of kind `E` by identifier.
    #[must_use]
    pub fn find<E: Stored>(&self, id: EntityId) -> Option<&E> {
        E::collection(self).get(id)
    }

    /// Look up an entity of kind `E` by natural key.
    #[must_use]
    pub fn find_by_key<E: Stored>(&self, key: &str) -> Option<&E> {
        E::collection(self).find_by_key(key)
    }

    /// Collection holding kind `E`.
    #[must_use]
    pub fn all<E: Stored>(&self) -> &Collection<E> {
        E::collection(self)
    }

    /// Register a country.
    pub fn add_country(&mut self, country: Country) -> Result<(), StoreError> {
        self.insert(country).map(drop)
    }

    /// Register a currency.
    pub fn add_currency(&mut self, currency: Currency) -> Result<(), StoreError> {
        self.insert(currency).map(drop)
    }

    /// Register a language.
    pub fn add_language(&mut self, language: Language) -> Result<(), StoreError> {
        self.insert(language).map(drop)
    }

    /// Register a timezone.
    pub fn add_timezone(&mut self, timezone: TimeZone) -> Result<(), StoreError> {
        self.insert(timezone).map(drop)
    }

    /// Relate the registered country `country` to the registered entity
    /// `related` of kind `E`. Returns `false` when the relation already
    /// existed.
    ///
    /// # Errors
    ///
    /// Returns [`ReferentialError`] naming the endpoint that is not
    /// registered; the related entity is checked first.
    pub fn link_country<E: Related>(
        &mut self,
        country: EntityId,
        related: EntityId,
    ) -> Result<bool, ReferentialError> {
        let missing = |kind, id| ReferentialError { country, kind, id };
        if !E::collection(self).contains(related) {
            return Err(missing(E::KIND, related));
        }
        let entry = self
            .countries
            .by_id
            .get_mut(&country)
            .ok_or_else(|| missing(EntityKind::Country, country))?;
        Ok(entry
            .relation_mut(E::KIND)
            .is_some_and(|ids| ids.insert(related)))
    }

    /// Whether an entity of `kind` with `id` is registered.
    #[must_use]
    pub fn contains(&self, kind: EntityKind, id: EntityId) -> bool {
        match kind {
            EntityKind::Country => self.countries.contains(id),
            EntityKind::Currency => self.currencies.contains(id),
            EntityKind::Language => self.languages.contains(id),
            EntityKind::TimeZone => self.timezones.contains(id),
        }
    }

    /// Check every country relation resolves to a registered entity.
    pub fn verify_integrity(&self) -> Result<(), ReferentialError> {
        for (country_id, country) in self.countries.iter() {
            let relations = [
                (EntityKind::Currency, country.currencies()),
                (EntityKind::Language, country.languages()),
                (EntityKind::TimeZone, country.timezones()),
            ];
            for (kind, ids) in relations {
                if let Some(missing) = ids.iter().find(|id| !self.contains(kind, **id)) {
                    return Err(ReferentialError {
                        country: country_id,
                        kind,
                        id: *missing,
                    });
                }
            }
        }
        Ok(())
    }
}
