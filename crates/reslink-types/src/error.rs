//! Error types for the link graph
//!
//! Taxonomy:
//! - [`ValidationError`]: malformed input, caller error, never retried
//! - `UnknownResourceKind`: no loader registered for a kind, configuration error
//! - [`StorageError`]: persistence or loader failure, retryable at the caller's discretion
//! - `TransactionAborted`: a replacement lost to a concurrent one on the same key

use crate::link::LinkKey;
use std::path::PathBuf;

/// Main link graph error type
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Link failed validation
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Type resolver has no registration for the kind
    #[error("unknown resource kind: {kind}")]
    UnknownResourceKind {
        /// Requested kind name
        kind: String,
    },

    /// Underlying persistence failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Replacement could not commit because of a concurrent transaction
    #[error("transaction on {key} aborted: {reason}")]
    TransactionAborted {
        /// Source-side key the transaction was replacing
        key: LinkKey,
        /// Why it was aborted
        reason: String,
    },
}

impl LinkError {
    /// Create unknown kind error
    #[inline]
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        Self::UnknownResourceKind { kind: kind.into() }
    }

    /// Create aborted transaction error
    #[inline]
    pub fn aborted(key: LinkKey, reason: impl Into<String>) -> Self {
        Self::TransactionAborted {
            key,
            reason: reason.into(),
        }
    }

    /// Check if the caller may retry the whole call
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::TransactionAborted { .. })
    }

    /// Check if the error stems from caller input or configuration
    #[inline]
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UnknownResourceKind { .. })
    }
}

/// Input validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Source reference is missing kind or id
    #[error("link is missing its source entity")]
    MissingFrom,

    /// Destination reference is missing kind or id
    #[error("link is missing its destination entity")]
    MissingTo,

    /// Link name is blank
    #[error("link is missing its name")]
    MissingName,

    /// Blank type tag
    #[error("type tag must not be empty")]
    EmptyTypeTag,

    /// Blank entity id
    #[error("entity id must not be empty")]
    EmptyEntityId,

    /// Entity reference text is not `kind:id`
    #[error("malformed entity reference `{0}` (expected kind:id)")]
    MalformedReference(String),

    /// Link payload is not a key/value object
    #[error("invalid link data: {0}")]
    InvalidData(String),

    /// Replacement exceeds the configured target limit
    #[error("too many targets: {count} (max {max})")]
    TooManyTargets {
        /// Supplied target count
        count: usize,
        /// Configured maximum
        max: usize,
    },
}

/// Persistence and loader failures
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// File I/O failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisted state violates a store invariant
    #[error("corrupted store: {0}")]
    Corrupted(String),

    /// An entity loader failed to fetch records
    #[error("loader for `{kind}` failed: {reason}")]
    LoaderFailed {
        /// Kind being loaded
        kind: String,
        /// Loader-supplied reason
        reason: String,
    },
}

impl StorageError {
    /// Create I/O error for a path
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create loader failure
    #[inline]
    pub fn loader(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LoaderFailed {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for link graph operations
pub type LinkResult<T> = Result<T, LinkError>;
