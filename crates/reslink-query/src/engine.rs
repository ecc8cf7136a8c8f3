//! Bidirectional link query engine
//!
//! [`LinkQueryEngine::resolve_linked`] answers "which entities of kind K are
//! linked to or from E under name N". It issues exactly one indexed lookup
//! per direction, unions the endpoints and materializes them with a single
//! batched load through the kind's [`EntityLoader`](crate::EntityLoader).

use crate::resolver::{Record, TypeResolver};
use reslink_store::LinkStore;
use reslink_types::{EntityId, EntityRef, LinkError, LinkResult, TypeTag};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// Read boundary over a link store and a type resolver
#[derive(Clone)]
pub struct LinkQueryEngine {
    store: Arc<dyn LinkStore>,
    resolver: Arc<dyn TypeResolver>,
}

impl LinkQueryEngine {
    /// Create engine
    #[must_use]
    pub fn new(store: Arc<dyn LinkStore>, resolver: Arc<dyn TypeResolver>) -> Self {
        Self { store, resolver }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LinkStore> {
        &self.store
    }

    /// Underlying resolver
    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &Arc<dyn TypeResolver> {
        &self.resolver
    }

    /// Endpoints linked to or from `entity` under `link_name`, any kind
    ///
    /// Outbound targets and inbound sources are unioned and deduplicated by
    /// `(kind, id)`. Returned in `(kind, id)` order.
    ///
    /// # Errors
    /// `LinkError::Storage` if either lookup fails.
    pub fn linked_refs(&self, entity: &EntityRef, link_name: &str) -> LinkResult<BTreeSet<EntityRef>> {
        let outbound = self.store.find_by_from_and_name(entity, link_name)?;
        let inbound = self.store.find_by_to_and_name(entity, link_name)?;

        let refs = outbound
            .into_iter()
            .map(|link| link.to().clone())
            .chain(inbound.into_iter().map(|link| link.from().clone()))
            .collect();
        Ok(refs)
    }

    /// Records of `resource_kind` linked to or from `entity` under `link_name`
    ///
    /// Endpoints of other kinds are excluded. Endpoints whose record no
    /// longer exists are dropped without error. Records come back in id
    /// order, though callers should not rely on any particular order.
    ///
    /// # Errors
    /// - `LinkError::UnknownResourceKind` if the resolver has no loader for `resource_kind`
    /// - `LinkError::Storage` if a lookup or the batched load fails
    pub fn resolve_linked(
        &self,
        entity: &EntityRef,
        link_name: &str,
        resource_kind: &str,
    ) -> LinkResult<Vec<Record>> {
        let loader = self
            .resolver
            .resolve(resource_kind)
            .ok_or_else(|| LinkError::unknown_kind(resource_kind))?;
        let kind = TypeTag::new(resource_kind);

        let ids: BTreeSet<EntityId> = self
            .linked_refs(entity, link_name)?
            .into_iter()
            .filter(|endpoint| endpoint.is_kind(&kind))
            .map(|endpoint| endpoint.id().clone())
            .collect();

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let loaded = loader.load_many(&ids)?;

        // Keep only what was asked for, once per id.
        let mut records = BTreeMap::new();
        for record in loaded {
            if record.entity.is_kind(&kind) && ids.contains(record.id()) {
                records.entry(record.id().clone()).or_insert(record);
            }
        }

        let dangling = ids.len() - records.len();
        if dangling > 0 {
            tracing::debug!(
                "Dropped {} dangling {} reference(s) linked with {} under '{}'",
                dangling,
                kind,
                entity,
                link_name
            );
        }

        Ok(records.into_values().collect())
    }
}

impl fmt::Debug for LinkQueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkQueryEngine")
            .field("links", &self.store.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{MockEntityLoader, MockTypeResolver};
    use reslink_store::{replace_links, InMemoryLinkStore, ReplaceOptions};
    use reslink_types::{LinkData, StorageError};
    use serde_json::json;

    fn process(id: u64) -> EntityRef {
        EntityRef::new("process", id)
    }

    fn proposal(id: u64) -> EntityRef {
        EntityRef::new("proposal", id)
    }

    fn relate(store: &InMemoryLinkStore, from: &EntityRef, targets: Vec<EntityRef>, name: &str) {
        replace_links(store, from, targets, name, &LinkData::new(), &ReplaceOptions::new()).unwrap();
    }

    /// Resolver whose single kind echoes back every requested id as a record
    fn echo_resolver(kind: &'static str, expected_calls: usize) -> MockTypeResolver {
        let mut loader = MockEntityLoader::new();
        loader.expect_kind().returning(move || TypeTag::new(kind));
        loader
            .expect_load_many()
            .times(expected_calls)
            .returning(move |ids| {
                Ok(ids
                    .iter()
                    .map(|id| Record::new(EntityRef::new(kind, id.clone()), json!({"id": id})))
                    .collect())
            });
        let loader: Arc<dyn crate::EntityLoader> = Arc::new(loader);

        let mut resolver = MockTypeResolver::new();
        resolver
            .expect_resolve()
            .returning(move |requested| (requested == kind).then(|| loader.clone()));
        resolver
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id().as_str()).collect()
    }

    #[test]
    fn unions_both_directions_with_single_load() {
        let store = Arc::new(InMemoryLinkStore::new());
        relate(&store, &process(1), vec![process(2)], "related_to");
        relate(&store, &process(3), vec![process(1)], "related_to");

        let engine = LinkQueryEngine::new(store, Arc::new(echo_resolver("process", 1)));
        let records = engine.resolve_linked(&process(1), "related_to", "process").unwrap();

        assert_eq!(ids(&records), vec!["2", "3"]);
    }

    #[test]
    fn unknown_kind_is_reported() {
        let store = Arc::new(InMemoryLinkStore::new());
        let engine = LinkQueryEngine::new(store, Arc::new(echo_resolver("process", 0)));

        let err = engine.resolve_linked(&process(1), "related_to", "meeting").unwrap_err();

        assert!(matches!(err, LinkError::UnknownResourceKind { ref kind } if kind == "meeting"));
        assert!(err.is_caller_error());
    }

    #[test]
    fn no_matching_endpoints_skips_load() {
        let store = Arc::new(InMemoryLinkStore::new());
        relate(&store, &process(1), vec![proposal(9)], "included");

        let engine = LinkQueryEngine::new(store, Arc::new(echo_resolver("process", 0)));
        let records = engine.resolve_linked(&process(1), "included", "process").unwrap();

        assert!(records.is_empty());
    }

    #[test]
    fn other_kinds_filtered_out() {
        let store = Arc::new(InMemoryLinkStore::new());
        relate(&store, &process(1), vec![proposal(5), process(2)], "included");

        let engine = LinkQueryEngine::new(store, Arc::new(echo_resolver("proposal", 1)));
        let records = engine.resolve_linked(&process(1), "included", "proposal").unwrap();

        assert_eq!(ids(&records), vec!["5"]);
        assert_eq!(records[0].entity, proposal(5));
    }

    #[test]
    fn both_directions_to_same_entity_dedupe() {
        let store = Arc::new(InMemoryLinkStore::new());
        relate(&store, &process(1), vec![process(2), process(2)], "related_to");
        relate(&store, &process(2), vec![process(1)], "related_to");

        let engine = LinkQueryEngine::new(store, Arc::new(echo_resolver("process", 1)));
        let records = engine.resolve_linked(&process(1), "related_to", "process").unwrap();

        assert_eq!(ids(&records), vec!["2"]);
    }

    #[test]
    fn missing_records_dropped() {
        let store = Arc::new(InMemoryLinkStore::new());
        relate(&store, &process(1), vec![process(2), process(3)], "related_to");

        let mut loader = MockEntityLoader::new();
        loader.expect_kind().returning(|| TypeTag::new("process"));
        loader.expect_load_many().times(1).returning(|_| {
            Ok(vec![Record::new(EntityRef::new("process", 3u64), json!({}))])
        });
        let loader: Arc<dyn crate::EntityLoader> = Arc::new(loader);
        let mut resolver = MockTypeResolver::new();
        resolver.expect_resolve().returning(move |_| Some(loader.clone()));

        let engine = LinkQueryEngine::new(store, Arc::new(resolver));
        let records = engine.resolve_linked(&process(1), "related_to", "process").unwrap();

        assert_eq!(ids(&records), vec!["3"]);
    }

    #[test]
    fn loader_failure_propagates() {
        let store = Arc::new(InMemoryLinkStore::new());
        relate(&store, &process(1), vec![process(2)], "related_to");

        let mut loader = MockEntityLoader::new();
        loader.expect_kind().returning(|| TypeTag::new("process"));
        loader
            .expect_load_many()
            .returning(|_| Err(StorageError::loader("process", "connection reset")));
        let loader: Arc<dyn crate::EntityLoader> = Arc::new(loader);
        let mut resolver = MockTypeResolver::new();
        resolver.expect_resolve().returning(move |_| Some(loader.clone()));

        let engine = LinkQueryEngine::new(store, Arc::new(resolver));
        let err = engine.resolve_linked(&process(1), "related_to", "process").unwrap_err();

        assert!(matches!(err, LinkError::Storage(StorageError::LoaderFailed { .. })));
        assert!(err.is_retryable());
    }

    #[test]
    fn linked_refs_ignores_other_names() {
        let store = Arc::new(InMemoryLinkStore::new());
        relate(&store, &process(1), vec![process(2)], "related_to");
        relate(&store, &process(1), vec![proposal(7)], "included");

        let engine = LinkQueryEngine::new(store, Arc::new(MockTypeResolver::new()));
        let refs = engine.linked_refs(&process(1), "included").unwrap();

        assert_eq!(refs.into_iter().collect::<Vec<_>>(), vec![proposal(7)]);
    }
}
