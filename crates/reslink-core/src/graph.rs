//! Link graph facade
//!
//! [`LinkGraph`] wires an [`InMemoryLinkStore`], a [`LinkQueryEngine`] and a
//! [`LinkGraphConfig`] together and is the boundary host code talks to:
//!
//! - writes: [`link`](LinkGraph::link), [`replace`](LinkGraph::replace),
//!   [`unlink_all`](LinkGraph::unlink_all)
//! - reads: [`linked_resources`](LinkGraph::linked_resources),
//!   [`linked_as`](LinkGraph::linked_as), [`links_from`](LinkGraph::links_from),
//!   [`links_to`](LinkGraph::links_to)
//!
//! Every write on a `(from, name)` key holds that key's lock, so single-link
//! creation, bulk deletion and replacement never interleave on the same key.

use crate::config::LinkGraphConfig;
use crate::resource::{Resource, Resourceable};
use reslink_query::{LinkQueryEngine, Record, TypeResolver};
use reslink_store::{replace_links, InMemoryLinkStore, LinkStore, Replaced, StoreStats};
use reslink_types::{
    EntityRef, Link, LinkData, LinkId, LinkKey, LinkResult, NewLink, StorageError,
};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Polymorphic link graph over host-owned entities
#[derive(Debug, Clone)]
pub struct LinkGraph {
    store: Arc<InMemoryLinkStore>,
    engine: LinkQueryEngine,
    config: LinkGraphConfig,
}

impl LinkGraph {
    /// Empty graph
    #[must_use]
    pub fn new(config: LinkGraphConfig, resolver: Arc<dyn TypeResolver>) -> Self {
        Self::with_store(Arc::new(InMemoryLinkStore::new()), config, resolver)
    }

    /// Graph over an existing store
    #[must_use]
    pub fn with_store(
        store: Arc<InMemoryLinkStore>,
        config: LinkGraphConfig,
        resolver: Arc<dyn TypeResolver>,
    ) -> Self {
        let engine = LinkQueryEngine::new(store.clone(), resolver);
        Self {
            store,
            engine,
            config,
        }
    }

    /// Graph restored from the configured snapshot
    ///
    /// Starts empty when no snapshot path is configured or the file does not
    /// exist yet.
    ///
    /// # Errors
    /// `LinkError::Storage` if the snapshot exists but cannot be loaded.
    pub fn open(config: LinkGraphConfig, resolver: Arc<dyn TypeResolver>) -> LinkResult<Self> {
        let store = match &config.snapshot_path {
            Some(path) if path.exists() => {
                let store = InMemoryLinkStore::load_snapshot(path)?;
                tracing::info!("Loaded {} links from {}", store.len(), path.display());
                store
            }
            _ => InMemoryLinkStore::new(),
        };
        Ok(Self::with_store(Arc::new(store), config, resolver))
    }

    /// Write the store to the configured snapshot
    ///
    /// Returns `false` when no snapshot path is configured.
    ///
    /// # Errors
    /// `LinkError::Storage` if writing fails.
    pub fn persist(&self) -> LinkResult<bool> {
        let Some(path) = &self.config.snapshot_path else {
            return Ok(false);
        };
        self.store.save_snapshot(path)?;
        tracing::info!("Saved {} links to {}", self.store.len(), path.display());
        Ok(true)
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LinkGraphConfig {
        &self.config
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<InMemoryLinkStore> {
        &self.store
    }

    /// Query engine
    #[inline]
    #[must_use]
    pub fn engine(&self) -> &LinkQueryEngine {
        &self.engine
    }

    /// Store statistics
    #[inline]
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Create one `from --name--> to` link
    ///
    /// Existing links under the key are kept.
    ///
    /// # Errors
    /// - `LinkError::Validation` if an endpoint or the name is missing
    /// - `LinkError::TransactionAborted` if the key lock is not acquired in time
    pub fn link(
        &self,
        from: &impl Resourceable,
        to: &impl Resourceable,
        name: &str,
        data: LinkData,
    ) -> LinkResult<LinkId> {
        let new_link = NewLink::new(from.entity_ref(), to.entity_ref(), name).with_data(data);
        new_link.validate()?;

        let _lock = self
            .store
            .lock_key(&new_link.from_key(), self.config.lock_timeout())?;
        let id = self.store.insert(new_link)?;
        tracing::debug!("Linked {}", id);
        Ok(id)
    }

    /// Make the `from --name--> *` links equal exactly `targets`
    ///
    /// Accepts a single resource (`[item]`, `Some(item)`) or any collection.
    /// Duplicate handling and the target limit follow the configuration.
    ///
    /// # Errors
    /// As [`replace_links`]. On error the previous links are kept.
    pub fn replace<I>(
        &self,
        from: &impl Resourceable,
        targets: I,
        name: &str,
        data: &LinkData,
    ) -> LinkResult<Replaced>
    where
        I: IntoIterator,
        I::Item: Resourceable,
    {
        let targets = targets.into_iter().map(|target| target.entity_ref());
        replace_links(
            self.store.as_ref(),
            &from.entity_ref(),
            targets,
            name,
            data,
            &self.config.replace_options(),
        )
    }

    /// Link `from` to typed resources, replacing any previous set
    ///
    /// # Errors
    /// As [`replace`](Self::replace).
    pub fn link_resources<T: Resource>(
        &self,
        from: &impl Resourceable,
        resources: &[T],
        name: &str,
        data: &LinkData,
    ) -> LinkResult<Replaced> {
        self.replace(from, resources.iter().map(Resourceable::entity_ref), name, data)
    }

    /// Remove every `from --name--> *` link
    ///
    /// Returns the number removed; zero is not an error.
    ///
    /// # Errors
    /// `LinkError::TransactionAborted` if the key lock is not acquired in time.
    pub fn unlink_all(&self, from: &impl Resourceable, name: &str) -> LinkResult<usize> {
        let from = from.entity_ref();
        let key = LinkKey::new(&from, name);
        let _lock = self.store.lock_key(&key, self.config.lock_timeout())?;
        let removed = self.store.delete_by_from_and_name(&from, name)?;
        tracing::debug!("Unlinked {} link(s) under {}", removed, key);
        Ok(removed)
    }

    /// Records of `resource_kind` linked to or from `entity` under `name`
    ///
    /// # Errors
    /// As [`LinkQueryEngine::resolve_linked`].
    pub fn linked_resources(
        &self,
        entity: &impl Resourceable,
        name: &str,
        resource_kind: &str,
    ) -> LinkResult<Vec<Record>> {
        self.engine
            .resolve_linked(&entity.entity_ref(), name, resource_kind)
    }

    /// Typed resources linked to or from `entity` under `name`
    ///
    /// # Errors
    /// As [`linked_resources`](Self::linked_resources); a record whose
    /// attributes do not decode as `T` is a `StorageError::LoaderFailed`.
    pub fn linked_as<T: Resource>(&self, entity: &impl Resourceable, name: &str) -> LinkResult<Vec<T>> {
        self.linked_resources(entity, name, T::KIND)?
            .iter()
            .map(|record| {
                record.decode::<T>().map_err(|e| {
                    StorageError::loader(T::KIND, format!("{} does not decode: {e}", record.entity))
                        .into()
                })
            })
            .collect()
    }

    /// Endpoints linked to or from `entity` under `name`, any kind, unloaded
    ///
    /// # Errors
    /// `LinkError::Storage` if a lookup fails.
    pub fn linked_refs(&self, entity: &impl Resourceable, name: &str) -> LinkResult<BTreeSet<EntityRef>> {
        self.engine.linked_refs(&entity.entity_ref(), name)
    }

    /// Every link originating from `entity`, any name
    ///
    /// # Errors
    /// `LinkError::Storage` if the lookup fails.
    pub fn links_from(&self, entity: &impl Resourceable) -> LinkResult<Vec<Link>> {
        self.store.links_from(&entity.entity_ref())
    }

    /// Every link pointing at `entity`, any name
    ///
    /// # Errors
    /// `LinkError::Storage` if the lookup fails.
    pub fn links_to(&self, entity: &impl Resourceable) -> LinkResult<Vec<Link>> {
        self.store.links_to(&entity.entity_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reslink_query::TypeRegistry;
    use reslink_types::LinkError;
    use std::time::Duration;

    fn empty_graph(config: LinkGraphConfig) -> LinkGraph {
        LinkGraph::new(config, Arc::new(TypeRegistry::new()))
    }

    fn process(id: u64) -> EntityRef {
        EntityRef::new("process", id)
    }

    #[test]
    fn link_appends_under_key() {
        let graph = empty_graph(LinkGraphConfig::new());
        graph.link(&process(1), &process(2), "related_to", LinkData::new()).unwrap();
        graph.link(&process(1), &process(3), "related_to", LinkData::new()).unwrap();

        let refs = graph.linked_refs(&process(1), "related_to").unwrap();
        assert_eq!(refs, BTreeSet::from([process(2), process(3)]));
    }

    #[test]
    fn link_rejects_blank_name() {
        let graph = empty_graph(LinkGraphConfig::new());
        let err = graph.link(&process(1), &process(2), "", LinkData::new()).unwrap_err();
        assert!(err.is_caller_error());
        assert!(graph.store().is_empty());
    }

    #[test]
    fn link_waits_on_held_key() {
        let graph = empty_graph(LinkGraphConfig::new().with_lock_timeout(Duration::from_millis(20)));
        let key = LinkKey::new(&process(1), "related_to");
        let _held = graph.store().lock_key(&key, Duration::from_millis(10)).unwrap();

        let err = graph
            .link(&process(1), &process(2), "related_to", LinkData::new())
            .unwrap_err();
        assert!(matches!(err, LinkError::TransactionAborted { .. }));
    }

    #[test]
    fn replace_honours_unique_config() {
        let graph = empty_graph(LinkGraphConfig::new().with_unique_targets(true));
        let replaced = graph
            .replace(&process(1), [process(2), process(2)], "related_to", &LinkData::new())
            .unwrap();
        assert_eq!(replaced.inserted.len(), 1);
    }

    #[test]
    fn replace_accepts_single_target() {
        let graph = empty_graph(LinkGraphConfig::new());
        graph
            .replace(&process(1), Some(process(2)), "related_to", &LinkData::new())
            .unwrap();
        assert_eq!(graph.store().len(), 1);
    }

    #[test]
    fn replace_honours_target_limit() {
        let graph = empty_graph(LinkGraphConfig::new().with_max_targets(1));
        let err = graph
            .replace(&process(1), [process(2), process(3)], "related_to", &LinkData::new())
            .unwrap_err();
        assert!(err.is_caller_error());
    }

    #[test]
    fn unlink_all_is_idempotent() {
        let graph = empty_graph(LinkGraphConfig::new());
        graph
            .replace(&process(1), [process(2), process(3)], "related_to", &LinkData::new())
            .unwrap();

        assert_eq!(graph.unlink_all(&process(1), "related_to").unwrap(), 2);
        assert_eq!(graph.unlink_all(&process(1), "related_to").unwrap(), 0);
    }

    #[test]
    fn persist_without_path_is_noop() {
        let graph = empty_graph(LinkGraphConfig::new());
        assert!(!graph.persist().unwrap());
    }

    #[test]
    fn open_missing_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = LinkGraphConfig::new().with_snapshot_path(dir.path().join("links.json"));
        let graph = LinkGraph::open(config, Arc::new(TypeRegistry::new())).unwrap();
        assert!(graph.store().is_empty());
    }

    #[test]
    fn unknown_kind_from_empty_registry() {
        let graph = empty_graph(LinkGraphConfig::new());
        let err = graph
            .linked_resources(&process(1), "related_to", "process")
            .unwrap_err();
        assert!(matches!(err, LinkError::UnknownResourceKind { .. }));
    }
}
