//! Linkable resources
//!
//! Any host type can take part in the link graph by implementing
//! [`Resource`]: a stable kind name plus an id. [`Resourceable`] is the
//! narrower "has an entity reference" capability accepted by the
//! [`LinkGraph`](crate::LinkGraph) write methods, so raw [`EntityRef`]s and
//! loaded [`Record`]s can be passed alongside typed resources.

use reslink_query::Record;
use reslink_types::{EntityId, EntityRef, TypeTag};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A host type that can be linked and loaded back from a [`Record`]
pub trait Resource: Serialize + DeserializeOwned {
    /// Kind name under which records of this type are registered
    const KIND: &'static str;

    /// Id of this instance within [`Self::KIND`]
    fn resource_id(&self) -> EntityId;

    /// Kind as a type tag
    #[must_use]
    fn type_tag() -> TypeTag {
        TypeTag::new(Self::KIND)
    }
}

/// Anything that names an entity
pub trait Resourceable {
    /// Reference to the named entity
    fn entity_ref(&self) -> EntityRef;
}

impl<T: Resource> Resourceable for T {
    fn entity_ref(&self) -> EntityRef {
        EntityRef::new(T::KIND, self.resource_id())
    }
}

impl Resourceable for EntityRef {
    fn entity_ref(&self) -> EntityRef {
        self.clone()
    }
}

impl Resourceable for Record {
    fn entity_ref(&self) -> EntityRef {
        self.entity.clone()
    }
}
