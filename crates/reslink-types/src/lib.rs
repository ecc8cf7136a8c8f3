//! reslink Types
//!
//! Foundation types for the polymorphic resource-link graph.
//!
//! # Overview
//!
//! - **EntityRef**: weak `(kind, id)` reference to a record owned elsewhere
//! - **Link**: named, directed, metadata-bearing edge between two references
//! - **LinkKey**: `(kind, id, name)` composite index key
//! - **LinkError**: error taxonomy shared by every reslink crate
//!
//! # Example
//!
//! ```rust
//! use reslink_types::{EntityRef, LinkData, NewLink};
//!
//! let link = NewLink::new(
//!     EntityRef::new("process", 1u64),
//!     EntityRef::new("proposal", 42u64),
//!     "included_proposals",
//! )
//! .with_data(LinkData::new().with("origin", "import"));
//!
//! assert!(link.validate().is_ok());
//! ```

#![warn(missing_docs)]

pub mod entity;
pub mod error;
pub mod link;

// Re-exports
pub use entity::{EntityId, EntityRef, TypeTag};
pub use error::{LinkError, LinkResult, StorageError, ValidationError};
pub use link::{Link, LinkData, LinkId, LinkKey, NewLink};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for link graph types
    pub use crate::{
        EntityId, EntityRef, Link, LinkData, LinkError, LinkId, LinkKey, LinkResult, NewLink,
        StorageError, TypeTag, ValidationError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
