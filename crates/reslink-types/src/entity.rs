//! Polymorphic entity references
//!
//! Provides [`EntityRef`], a `(kind, id)` pair naming a record owned by some
//! other domain. The link graph never owns the referenced record; an
//! [`EntityRef`] is only a relation plus a lookup key.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Stable name of a concrete entity type (e.g. `"process"`, `"proposal"`)
///
/// Kinds are registered by the host application at runtime, so the tag is an
/// open string rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(String);

impl TypeTag {
    /// Create a type tag
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Create a type tag, rejecting blank names
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyTypeTag`] if `name` is blank.
    pub fn parse(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyTypeTag);
        }
        Ok(Self(name))
    }

    /// Tag as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the tag is blank
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TypeTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeTag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeTag {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Opaque identifier, unique within one [`TypeTag`]'s namespace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an entity id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the id is blank
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// Weak reference to a domain record: `(kind, id)`
///
/// Two references are equal iff both kind and id match. Ordering is by kind,
/// then id, which is also the prefix order of the store's composite indices.
///
/// # Example
/// ```
/// use reslink_types::EntityRef;
///
/// let process = EntityRef::new("process", 7u64);
/// assert_eq!(process.to_string(), "process:7");
/// assert_eq!("process:7".parse::<EntityRef>().unwrap(), process);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    kind: TypeTag,
    id: EntityId,
}

impl EntityRef {
    /// Create a reference
    #[inline]
    #[must_use]
    pub fn new(kind: impl Into<TypeTag>, id: impl Into<EntityId>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Entity kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &TypeTag {
        &self.kind
    }

    /// Entity id within its kind
    #[inline]
    #[must_use]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// True if both kind and id are present
    #[inline]
    #[must_use]
    pub fn is_resolvable(&self) -> bool {
        !self.kind.is_blank() && !self.id.is_blank()
    }

    /// True if this reference is of the given kind
    #[inline]
    #[must_use]
    pub fn is_kind(&self, kind: &TypeTag) -> bool {
        &self.kind == kind
    }
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for EntityRef {
    type Err = ValidationError;

    /// Parse `kind:id`. The id may itself contain `:`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| ValidationError::MalformedReference(s.to_string()))?;
        let kind = TypeTag::parse(kind)?;
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyEntityId);
        }
        Ok(Self::new(kind, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ref_equality_needs_kind_and_id() {
        let a = EntityRef::new("process", 1u64);
        assert_eq!(a, EntityRef::new("process", "1"));
        assert_ne!(a, EntityRef::new("proposal", 1u64));
        assert_ne!(a, EntityRef::new("process", 2u64));
    }

    #[test]
    fn entity_ref_parse_roundtrip() {
        let parsed: EntityRef = "meeting:abc:def".parse().unwrap();
        assert_eq!(parsed.kind().as_str(), "meeting");
        assert_eq!(parsed.id().as_str(), "abc:def");
        assert_eq!(parsed.to_string(), "meeting:abc:def");
    }

    #[test]
    fn entity_ref_parse_rejects_malformed() {
        assert!(matches!(
            "process".parse::<EntityRef>(),
            Err(ValidationError::MalformedReference(_))
        ));
        assert!(matches!(
            ":7".parse::<EntityRef>(),
            Err(ValidationError::EmptyTypeTag)
        ));
        assert!(matches!(
            "process: ".parse::<EntityRef>(),
            Err(ValidationError::EmptyEntityId)
        ));
    }

    #[test]
    fn entity_ref_resolvable() {
        assert!(EntityRef::new("process", 1u64).is_resolvable());
        assert!(!EntityRef::new("", 1u64).is_resolvable());
        assert!(!EntityRef::new("process", "  ").is_resolvable());
    }

    #[test]
    fn entity_ref_orders_by_kind_then_id() {
        let mut refs = vec![
            EntityRef::new("proposal", "1"),
            EntityRef::new("process", "2"),
            EntityRef::new("process", "1"),
        ];
        refs.sort();
        assert_eq!(refs[0], EntityRef::new("process", "1"));
        assert_eq!(refs[2], EntityRef::new("proposal", "1"));
    }

    #[test]
    fn entity_ref_serde_shape() {
        let r = EntityRef::new("process", 3u64);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "process", "id": "3"}));
    }
}
