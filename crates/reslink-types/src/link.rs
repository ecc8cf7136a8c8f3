//! Links between entities
//!
//! A [`Link`] is a directed, named edge between two [`EntityRef`]s carrying an
//! opaque [`LinkData`] payload. Links are immutable once stored; "changing" a
//! link means deleting it and inserting a new one.

use crate::entity::{EntityId, EntityRef, TypeTag};
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use ulid::Ulid;

/// Store-assigned link identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub Ulid);

impl LinkId {
    /// Generate new link ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LinkId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}

/// Opaque key/value side metadata on a link (e.g. provenance)
///
/// No schema is enforced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkData(Map<String, Value>);

impl LinkData {
    /// Empty payload
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Lookup a value
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for LinkData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for LinkData {
    type Error = ValidationError;

    /// Accepts a JSON object or `null` (empty payload).
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(ValidationError::InvalidData(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

/// Composite index key: `(kind, id, name)`
///
/// The store keeps one index keyed on the source side and one on the
/// destination side, both with this shape. The replacement transaction uses
/// the source-side key as its unit of locking.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkKey {
    kind: TypeTag,
    id: EntityId,
    name: String,
}

impl LinkKey {
    /// Key for `entity` under link `name`
    #[must_use]
    pub fn new(entity: &EntityRef, name: impl Into<String>) -> Self {
        Self {
            kind: entity.kind().clone(),
            id: entity.id().clone(),
            name: name.into(),
        }
    }

    /// Smallest key for `entity`; every key of that entity sorts at or after it
    #[must_use]
    pub fn lower_bound(entity: &EntityRef) -> Self {
        Self::new(entity, String::new())
    }

    /// Entity half of the key
    #[must_use]
    pub fn entity(&self) -> EntityRef {
        EntityRef::new(self.kind.clone(), self.id.clone())
    }

    /// True if the key belongs to `entity`
    #[inline]
    #[must_use]
    pub fn is_for(&self, entity: &EntityRef) -> bool {
        &self.kind == entity.kind() && &self.id == entity.id()
    }

    /// Link name half of the key
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for LinkKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}#{}", self.kind, self.id, self.name)
    }
}

/// A link that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    /// Source entity
    pub from: EntityRef,
    /// Destination entity
    pub to: EntityRef,
    /// Semantic label
    pub name: String,
    /// Side metadata
    pub data: LinkData,
}

impl NewLink {
    /// Create a link with an empty payload
    #[must_use]
    pub fn new(from: EntityRef, to: EntityRef, name: impl Into<String>) -> Self {
        Self {
            from,
            to,
            name: name.into(),
            data: LinkData::default(),
        }
    }

    /// With payload
    #[inline]
    #[must_use]
    pub fn with_data(mut self, data: LinkData) -> Self {
        self.data = data;
        self
    }

    /// Check that `from`, `to` and `name` are all present
    ///
    /// # Errors
    /// Returns the first missing field as a [`ValidationError`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.from.is_resolvable() {
            return Err(ValidationError::MissingFrom);
        }
        if !self.to.is_resolvable() {
            return Err(ValidationError::MissingTo);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        Ok(())
    }

    /// Source-side index key
    #[inline]
    #[must_use]
    pub fn from_key(&self) -> LinkKey {
        LinkKey::new(&self.from, self.name.clone())
    }

    /// Validate and stamp with an id and creation time
    ///
    /// # Errors
    /// Propagates [`NewLink::validate`] failures.
    pub fn into_link(self, id: LinkId, created_at: DateTime<Utc>) -> Result<Link, ValidationError> {
        self.validate()?;
        Ok(Link {
            id,
            from: self.from,
            to: self.to,
            name: self.name,
            data: self.data,
            created_at,
        })
    }
}

/// A stored, immutable link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    id: LinkId,
    from: EntityRef,
    to: EntityRef,
    name: String,
    #[serde(default)]
    data: LinkData,
    created_at: DateTime<Utc>,
}

impl Link {
    /// Link identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Source entity
    #[inline]
    #[must_use]
    pub fn from(&self) -> &EntityRef {
        &self.from
    }

    /// Destination entity
    #[inline]
    #[must_use]
    pub fn to(&self) -> &EntityRef {
        &self.to
    }

    /// Link name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Side metadata
    #[inline]
    #[must_use]
    pub fn data(&self) -> &LinkData {
        &self.data
    }

    /// Creation timestamp
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Source-side index key `(from.kind, from.id, name)`
    #[must_use]
    pub fn from_key(&self) -> LinkKey {
        LinkKey::new(&self.from, self.name.clone())
    }

    /// Destination-side index key `(to.kind, to.id, name)`
    #[must_use]
    pub fn to_key(&self) -> LinkKey {
        LinkKey::new(&self.to, self.name.clone())
    }

    /// The endpoint opposite to `entity`, if `entity` is one of the endpoints
    ///
    /// For a self-link both endpoints are `entity` and `entity` is returned.
    #[must_use]
    pub fn other_end(&self, entity: &EntityRef) -> Option<&EntityRef> {
        if &self.from == entity {
            Some(&self.to)
        } else if &self.to == entity {
            Some(&self.from)
        } else {
            None
        }
    }
}
