//! reslink Query
//!
//! Resolves entities linked to a given entity, in both directions.
//!
//! # Overview
//!
//! - **TypeResolver / EntityLoader**: the host-supplied capability to load records of a kind
//! - **TypeRegistry**: explicit kind-to-loader table, injected at construction
//! - **LinkQueryEngine**: outbound + inbound lookup, union, single batched load
//!
//! # Example
//!
//! ```rust
//! use reslink_query::{EntityLoader, LinkQueryEngine, Record, TypeRegistry};
//! use reslink_store::{replace_links, InMemoryLinkStore, ReplaceOptions};
//! use reslink_types::{EntityId, EntityRef, LinkData, StorageError, TypeTag};
//! use std::collections::BTreeSet;
//! use std::sync::Arc;
//!
//! struct Processes;
//!
//! impl EntityLoader for Processes {
//!     fn kind(&self) -> TypeTag {
//!         TypeTag::new("process")
//!     }
//!
//!     fn load_many(&self, ids: &BTreeSet<EntityId>) -> Result<Vec<Record>, StorageError> {
//!         Ok(ids
//!             .iter()
//!             .map(|id| Record::new(EntityRef::new("process", id.clone()), serde_json::Value::Null))
//!             .collect())
//!     }
//! }
//!
//! let store = Arc::new(InMemoryLinkStore::new());
//! let a = EntityRef::new("process", 1u64);
//! let b = EntityRef::new("process", 2u64);
//! replace_links(&*store, &a, [b.clone()], "related_to", &LinkData::new(), &ReplaceOptions::new())
//!     .unwrap();
//!
//! let registry = TypeRegistry::new().with_loader(Arc::new(Processes)).unwrap();
//! let engine = LinkQueryEngine::new(store, Arc::new(registry));
//!
//! let linked = engine.resolve_linked(&b, "related_to", "process").unwrap();
//! assert_eq!(linked[0].entity, a);
//! ```

#![warn(missing_docs)]

pub mod engine;
pub mod registry;
pub mod resolver;

// Re-exports
pub use engine::LinkQueryEngine;
pub use registry::TypeRegistry;
pub use resolver::{EntityLoader, Record, TypeResolver};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for link queries
    pub use crate::{EntityLoader, LinkQueryEngine, Record, TypeRegistry, TypeResolver};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
