//! Type resolver interface
//!
//! The link graph treats entities as opaque `(kind, id)` pairs. To hand back
//! concrete records it asks the host application, through [`TypeResolver`],
//! for an [`EntityLoader`] able to fetch records of one kind by id.

use reslink_types::{EntityId, EntityRef, StorageError, TypeTag};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A materialized entity: its reference plus the host's attribute document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Which entity this is
    pub entity: EntityRef,
    /// Attributes as loaded by the host
    pub attributes: Value,
}

impl Record {
    /// Create record
    #[inline]
    #[must_use]
    pub fn new(entity: EntityRef, attributes: Value) -> Self {
        Self { entity, attributes }
    }

    /// Record from a serializable value
    ///
    /// # Errors
    /// Returns the serializer error if `value` cannot be encoded as JSON.
    pub fn from_value<T: Serialize>(entity: EntityRef, value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(entity, serde_json::to_value(value)?))
    }

    /// Decode attributes into a concrete type
    ///
    /// # Errors
    /// Returns the deserializer error if the attributes do not fit `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.attributes)
    }

    /// Entity id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &EntityId {
        self.entity.id()
    }
}

/// Fetches records of one kind by id
#[cfg_attr(test, mockall::automock)]
pub trait EntityLoader: Send + Sync {
    /// Kind this loader serves
    fn kind(&self) -> TypeTag;

    /// Load every existing record among `ids`
    ///
    /// Ids without a record are omitted from the result, not reported.
    ///
    /// # Errors
    /// [`StorageError`] if the backing store fails.
    fn load_many(&self, ids: &BTreeSet<EntityId>) -> Result<Vec<Record>, StorageError>;
}

/// Maps a resource kind name to its loader
#[cfg_attr(test, mockall::automock)]
pub trait TypeResolver: Send + Sync {
    /// Loader for `kind`, or `None` if the kind is not registered
    fn resolve(&self, kind: &str) -> Option<Arc<dyn EntityLoader>>;
}
