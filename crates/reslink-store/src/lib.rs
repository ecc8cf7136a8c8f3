//! reslink Store
//!
//! Indexed storage of links and the atomic replacement transaction.
//!
//! # Overview
//!
//! - **LinkStore**: storage interface with `(from, name)` and `(to, name)` indexed lookups
//! - **InMemoryLinkStore**: thread-safe store with JSON snapshot persistence
//! - **WriteBatch**: staged mutations committed all-or-nothing
//! - **KeyLocks**: per-`(from, name)` transaction locks
//! - **replace_links**: delete-then-insert of a key's full link set as one unit
//!
//! # Example
//!
//! ```rust
//! use reslink_store::{replace_links, InMemoryLinkStore, LinkStore, ReplaceOptions};
//! use reslink_types::{EntityRef, LinkData};
//!
//! let store = InMemoryLinkStore::new();
//! let a = EntityRef::new("process", 1u64);
//! let b = EntityRef::new("process", 2u64);
//!
//! replace_links(&store, &a, [b.clone()], "related_to", &LinkData::new(), &ReplaceOptions::new())
//!     .unwrap();
//!
//! let inbound = store.find_by_to_and_name(&b, "related_to").unwrap();
//! assert_eq!(inbound[0].from(), &a);
//! ```

#![warn(missing_docs)]

pub mod locks;
pub mod memory;
pub mod snapshot;
pub mod store;
pub mod transaction;

// Re-exports
pub use locks::{KeyLock, KeyLocks};
pub use memory::{InMemoryLinkStore, StoreStats};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
pub use store::{BatchOp, CommitReport, LinkStore, WriteBatch};
pub use transaction::{replace_links, ReplaceOptions, Replaced, DEFAULT_LOCK_TIMEOUT};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for link storage
    pub use crate::{replace_links, InMemoryLinkStore, LinkStore, ReplaceOptions, WriteBatch};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
