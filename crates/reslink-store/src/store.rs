//! Link store interface
//!
//! Provides the [`LinkStore`] trait implemented by every storage backend and
//! the [`WriteBatch`] unit of atomic mutation.
//!
//! # Contract
//! - `(from.kind, from.id, name)` and `(to.kind, to.id, name)` lookups are
//!   direct indexed reads; backends must not fall back to full scans.
//! - [`LinkStore::commit`] applies a whole batch or nothing. Readers observe
//!   either the state before the batch or the state after it.

use crate::locks::KeyLock;
use chrono::{DateTime, Utc};
use reslink_types::{EntityRef, Link, LinkId, LinkKey, LinkResult, NewLink, ValidationError};
use std::time::Duration;

/// Durable, indexed storage of [`Link`] records
pub trait LinkStore: Send + Sync {
    /// Store a new link
    ///
    /// # Errors
    /// - `LinkError::Validation` if `from`, `to` or `name` is missing
    /// - `LinkError::Storage` on persistence failure
    fn insert(&self, link: NewLink) -> LinkResult<LinkId> {
        let mut batch = WriteBatch::new();
        let id = batch.insert(link)?;
        self.commit(batch)?;
        Ok(id)
    }

    /// Remove every link with exactly this source and name
    ///
    /// Returns the number removed; zero matches is not an error.
    ///
    /// # Errors
    /// `LinkError::Storage` on persistence failure
    fn delete_by_from_and_name(&self, from: &EntityRef, name: &str) -> LinkResult<usize> {
        let mut batch = WriteBatch::new();
        batch.delete_by_from_and_name(LinkKey::new(from, name));
        Ok(self.commit(batch)?.deleted)
    }

    /// Links with exactly this source and name, in insertion order
    ///
    /// # Errors
    /// `LinkError::Storage` on persistence failure
    fn find_by_from_and_name(&self, from: &EntityRef, name: &str) -> LinkResult<Vec<Link>>;

    /// Links with exactly this destination and name, in insertion order
    ///
    /// # Errors
    /// `LinkError::Storage` on persistence failure
    fn find_by_to_and_name(&self, to: &EntityRef, name: &str) -> LinkResult<Vec<Link>>;

    /// Every link originating from `from`, whatever its name
    ///
    /// # Errors
    /// `LinkError::Storage` on persistence failure
    fn links_from(&self, from: &EntityRef) -> LinkResult<Vec<Link>>;

    /// Every link pointing at `to`, whatever its name
    ///
    /// # Errors
    /// `LinkError::Storage` on persistence failure
    fn links_to(&self, to: &EntityRef) -> LinkResult<Vec<Link>>;

    /// Acquire the transaction lock for a source-side key
    ///
    /// # Errors
    /// `LinkError::TransactionAborted` if the key stays held past `timeout`
    fn lock_key(&self, key: &LinkKey, timeout: Duration) -> LinkResult<KeyLock>;

    /// Apply a batch atomically, in operation order
    ///
    /// # Errors
    /// `LinkError::Storage` if the batch cannot be applied; nothing is applied then
    fn commit(&self, batch: WriteBatch) -> LinkResult<CommitReport>;

    /// Total number of stored links
    fn len(&self) -> usize;

    /// True if the store holds no links
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One staged mutation
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    /// Remove all links under a source-side key
    DeleteByFromAndName(LinkKey),
    /// Store a validated, stamped link
    Insert(Link),
}

/// Ordered set of staged mutations, applied atomically by [`LinkStore::commit`]
///
/// Inserts are validated while staging, so an invalid link never reaches the
/// store. Dropping a batch without committing discards it.
#[derive(Debug, Clone)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
    created_at: DateTime<Utc>,
}

impl WriteBatch {
    /// Empty batch; every link it inserts shares one creation timestamp
    #[must_use]
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Stage deletion of every link under `key`
    pub fn delete_by_from_and_name(&mut self, key: LinkKey) -> &mut Self {
        self.ops.push(BatchOp::DeleteByFromAndName(key));
        self
    }

    /// Validate, stamp and stage a link
    ///
    /// # Errors
    /// Returns the [`ValidationError`] of the link; the batch is left unchanged.
    pub fn insert(&mut self, link: NewLink) -> Result<LinkId, ValidationError> {
        let id = LinkId::new();
        let link = link.into_link(id, self.created_at)?;
        self.ops.push(BatchOp::Insert(link));
        Ok(id)
    }

    #[cfg(test)]
    pub(crate) fn push(&mut self, op: BatchOp) {
        self.ops.push(op);
    }

    /// Staged operations in application order
    #[inline]
    #[must_use]
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Consume into operations
    #[inline]
    #[must_use]
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }

    /// Number of staged inserts
    #[must_use]
    pub fn insert_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, BatchOp::Insert(_)))
            .count()
    }

    /// Number of staged operations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True if nothing is staged
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Default for WriteBatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a committed batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Links removed by delete operations
    pub deleted: usize,
    /// Ids of inserted links, in batch order
    pub inserted: Vec<LinkId>,
}
