//! The capability shared by every cached entity kind.
//!
//! Each kind carries an identifier assigned by persistent storage and a
//! natural key used for deduplication. An entity without an identifier is
//! transient: it has been built from upstream data but not yet inserted.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier assigned to an entity row by persistent storage.
///
/// # Examples
///
/// ```
/// use countries_core::EntityId;
///
/// let id = EntityId::new(7);
/// assert_eq!(id.get(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    /// Wrap a raw storage identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Return the raw storage identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for EntityId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of entity kinds held by the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A country and its relation sets.
    Country,
    /// A currency keyed by ISO code.
    Currency,
    /// A language keyed by ISO 639-1 code.
    Language,
    /// A timezone keyed by its UTC offset label.
    TimeZone,
}

impl EntityKind {
    /// Lower-case label used in log lines and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Currency => "currency",
            Self::Language => "language",
            Self::TimeZone => "timezone",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity and deduplication behaviour common to all entity kinds.
pub trait Entity {
    /// Kind tag for this entity type.
    const KIND: EntityKind;

    /// Identifier assigned by storage, if the entity has been persisted.
    fn id(&self) -> Option<EntityId>;

    /// Record the identifier assigned by storage, marking the entity persisted.
    fn assign_id(&mut self, id: EntityId);

    /// Natural key used for deduplication within the kind.
    fn natural_key(&self) -> &str;

    /// Whether the entity has a storage row and identifier.
    fn is_persisted(&self) -> bool {
        self.id().is_some()
    }
}

/// Returned when a relation is requested towards a transient entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The target entity has not been persisted and carries no identifier.
    #[error("cannot link {kind} {key:?} before it has been persisted")]
    Unpersisted {
        /// Kind of the transient entity.
        kind: EntityKind,
        /// Natural key of the transient entity.
        key: String,
    },
}

/// Extract the identifier of `entity`, rejecting transient entities.
pub(crate) fn require_id<E: Entity>(entity: &E) -> Result<EntityId, LinkError> {
    entity.id().ok_or_else(|| LinkError::Unpersisted {
        kind: E::KIND,
        key: entity.natural_key().to_owned(),
    })
}
