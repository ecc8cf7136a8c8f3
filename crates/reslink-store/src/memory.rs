//! In-memory link store
//!
//! Provides [`InMemoryLinkStore`], a [`LinkStore`] keeping the link table and
//! both composite indices behind one `RwLock`. Batches are validated before
//! the write lock is taken, so the lock is held only to apply them.

use crate::locks::{KeyLock, KeyLocks};
use crate::snapshot::Snapshot;
use crate::store::{BatchOp, CommitReport, LinkStore, WriteBatch};
use parking_lot::RwLock;
use reslink_types::{EntityRef, Link, LinkError, LinkId, LinkKey, LinkResult, StorageError};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

/// Link table plus `(from.kind, from.id, name)` and `(to.kind, to.id, name)` indices
#[derive(Debug, Default)]
struct LinkTables {
    links: HashMap<LinkId, Link>,
    by_from: BTreeMap<LinkKey, Vec<LinkId>>,
    by_to: BTreeMap<LinkKey, Vec<LinkId>>,
}

impl LinkTables {
    fn put(&mut self, link: Link) {
        let id = link.id();
        self.by_from.entry(link.from_key()).or_default().push(id);
        self.by_to.entry(link.to_key()).or_default().push(id);
        self.links.insert(id, link);
    }

    fn remove_from_key(&mut self, key: &LinkKey) -> usize {
        let Some(ids) = self.by_from.remove(key) else {
            return 0;
        };

        for id in &ids {
            if let Some(link) = self.links.remove(id) {
                let to_key = link.to_key();
                if let Some(inbound) = self.by_to.get_mut(&to_key) {
                    inbound.retain(|other| other != id);
                    if inbound.is_empty() {
                        self.by_to.remove(&to_key);
                    }
                }
            }
        }

        ids.len()
    }

    fn resolve(&self, ids: &[LinkId]) -> Vec<Link> {
        ids.iter()
            .filter_map(|id| self.links.get(id).cloned())
            .collect()
    }

    fn lookup(index: &BTreeMap<LinkKey, Vec<LinkId>>, key: &LinkKey) -> Vec<LinkId> {
        index.get(key).cloned().unwrap_or_default()
    }

    /// All ids under keys belonging to `entity`, via a prefix range scan
    fn lookup_entity(index: &BTreeMap<LinkKey, Vec<LinkId>>, entity: &EntityRef) -> Vec<LinkId> {
        index
            .range(LinkKey::lower_bound(entity)..)
            .take_while(|(key, _)| key.is_for(entity))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }
}

/// Store statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Stored links
    pub links: usize,
    /// Distinct `(from, name)` keys
    pub outbound_keys: usize,
    /// Distinct `(to, name)` keys
    pub inbound_keys: usize,
}

/// Thread-safe in-memory [`LinkStore`]
///
/// Reads take the shared lock; commits take the exclusive lock only for the
/// in-memory apply of an already validated batch. Replacement transactions
/// serialize on per-key locks from [`KeyLocks`], so transactions on different
/// keys never wait for each other's staging.
#[derive(Debug, Default)]
pub struct InMemoryLinkStore {
    tables: RwLock<LinkTables>,
    locks: KeyLocks,
}

impl InMemoryLinkStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already stored links
    ///
    /// # Errors
    /// [`StorageError::Corrupted`] if two links share an id or a link lacks
    /// `from`, `to` or `name`.
    pub fn from_links(links: impl IntoIterator<Item = Link>) -> Result<Self, StorageError> {
        let mut tables = LinkTables::default();
        for link in links {
            if link.name().trim().is_empty()
                || !link.from().is_resolvable()
                || !link.to().is_resolvable()
            {
                return Err(StorageError::Corrupted(format!(
                    "link {} is missing an endpoint or name",
                    link.id()
                )));
            }
            if tables.links.contains_key(&link.id()) {
                return Err(StorageError::Corrupted(format!(
                    "duplicate link id {}",
                    link.id()
                )));
            }
            tables.put(link);
        }

        Ok(Self {
            tables: RwLock::new(tables),
            locks: KeyLocks::new(),
        })
    }

    /// Load a store from a JSON snapshot file
    ///
    /// # Errors
    /// [`StorageError`] if the file cannot be read, parsed or violates a store invariant.
    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let snapshot = Snapshot::read(path)?;
        let store = Self::from_links(snapshot.into_links())?;
        tracing::debug!("Loaded {} links from {}", store.len(), path.display());
        Ok(store)
    }

    /// Write all links to a JSON snapshot file
    ///
    /// # Errors
    /// [`StorageError`] if the snapshot cannot be encoded or written.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        let snapshot = Snapshot::new(self.all_links());
        let count = snapshot.len();
        snapshot.write(path)?;
        tracing::debug!("Saved {} links to {}", count, path.display());
        Ok(())
    }

    /// Every stored link, ordered by id
    #[must_use]
    pub fn all_links(&self) -> Vec<Link> {
        let tables = self.tables.read();
        let mut links: Vec<Link> = tables.links.values().cloned().collect();
        links.sort_by_key(Link::id);
        links
    }

    /// Lookup one link by id
    #[must_use]
    pub fn get(&self, id: LinkId) -> Option<Link> {
        self.tables.read().links.get(&id).cloned()
    }

    /// Current statistics
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let tables = self.tables.read();
        StoreStats {
            links: tables.links.len(),
            outbound_keys: tables.by_from.len(),
            inbound_keys: tables.by_to.len(),
        }
    }

    /// Per-key lock registry
    #[inline]
    #[must_use]
    pub fn key_locks(&self) -> &KeyLocks {
        &self.locks
    }
}

impl LinkStore for InMemoryLinkStore {
    fn find_by_from_and_name(&self, from: &EntityRef, name: &str) -> LinkResult<Vec<Link>> {
        let tables = self.tables.read();
        let ids = LinkTables::lookup(&tables.by_from, &LinkKey::new(from, name));
        Ok(tables.resolve(&ids))
    }

    fn find_by_to_and_name(&self, to: &EntityRef, name: &str) -> LinkResult<Vec<Link>> {
        let tables = self.tables.read();
        let ids = LinkTables::lookup(&tables.by_to, &LinkKey::new(to, name));
        Ok(tables.resolve(&ids))
    }

    fn links_from(&self, from: &EntityRef) -> LinkResult<Vec<Link>> {
        let tables = self.tables.read();
        let ids = LinkTables::lookup_entity(&tables.by_from, from);
        Ok(tables.resolve(&ids))
    }

    fn links_to(&self, to: &EntityRef) -> LinkResult<Vec<Link>> {
        let tables = self.tables.read();
        let ids = LinkTables::lookup_entity(&tables.by_to, to);
        Ok(tables.resolve(&ids))
    }

    fn lock_key(&self, key: &LinkKey, timeout: Duration) -> LinkResult<KeyLock> {
        self.locks.acquire(key, timeout).ok_or_else(|| {
            tracing::warn!("Lock on {} not acquired within {:?}", key, timeout);
            LinkError::aborted(
                key.clone(),
                format!("lock not acquired within {}ms", timeout.as_millis()),
            )
        })
    }

    fn commit(&self, batch: WriteBatch) -> LinkResult<CommitReport> {
        if batch.is_empty() {
            return Ok(CommitReport::default());
        }

        let mut tables = self.tables.write();

        // Reject the whole batch before touching any table.
        let mut staged = HashSet::new();
        for op in batch.ops() {
            if let BatchOp::Insert(link) = op {
                if tables.links.contains_key(&link.id()) || !staged.insert(link.id()) {
                    return Err(StorageError::Corrupted(format!(
                        "duplicate link id {}",
                        link.id()
                    ))
                    .into());
                }
            }
        }

        let mut report = CommitReport::default();
        for op in batch.into_ops() {
            match op {
                BatchOp::DeleteByFromAndName(key) => {
                    let removed = tables.remove_from_key(&key);
                    tracing::debug!("Deleted {} links under {}", removed, key);
                    report.deleted += removed;
                }
                BatchOp::Insert(link) => {
                    tracing::debug!(
                        "Inserted link {} ({} -> {})",
                        link.id(),
                        link.from(),
                        link.to()
                    );
                    report.inserted.push(link.id());
                    tables.put(link);
                }
            }
        }

        Ok(report)
    }

    fn len(&self) -> usize {
        self.tables.read().links.len()
    }
}
