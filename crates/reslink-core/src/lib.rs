//! reslink Core
//!
//! Named, directional, metadata-bearing links between independently typed
//! entities, queryable in both directions.
//!
//! # Overview
//!
//! - **LinkGraph**: the read/write boundary over store, query engine and config
//! - **Resource / Resourceable**: how host types take part in the graph
//! - **LinkGraphConfig**: lock timeout, duplicate policy, target limit, snapshot path
//!
//! # Example
//!
//! ```rust
//! use reslink_core::prelude::*;
//! use std::sync::Arc;
//!
//! let graph = LinkGraph::new(LinkGraphConfig::default(), Arc::new(TypeRegistry::new()));
//! let a = EntityRef::new("process", 1u64);
//! let b = EntityRef::new("process", 2u64);
//!
//! graph.replace(&a, [b.clone()], "related_to", &LinkData::new()).unwrap();
//!
//! assert!(graph.linked_refs(&b, "related_to").unwrap().contains(&a));
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod graph;
pub mod resource;

// Re-exports
pub use config::{ConfigError, LinkGraphConfig};
pub use graph::LinkGraph;
pub use resource::{Resource, Resourceable};

pub use reslink_query::{EntityLoader, LinkQueryEngine, Record, TypeRegistry, TypeResolver};
pub use reslink_store::{InMemoryLinkStore, LinkStore, Replaced, StoreStats};
pub use reslink_types::{
    EntityId, EntityRef, Link, LinkData, LinkError, LinkId, LinkResult, StorageError, TypeTag,
    ValidationError,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the link graph
    pub use crate::{
        EntityId, EntityLoader, EntityRef, LinkData, LinkError, LinkGraph, LinkGraphConfig,
        LinkResult, Record, Resource, Resourceable, TypeRegistry, TypeTag,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
