//! Testing utilities for reslink workspace
//!
//! Shared fixture kinds, an in-memory catalog loader and graph builders.

#![allow(missing_docs)]

use dashmap::DashMap;
use reslink_core::{LinkGraph, LinkGraphConfig, Resource, TypeRegistry};
use reslink_query::{EntityLoader, Record};
use reslink_types::{EntityId, EntityRef, StorageError, TypeTag};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub id: u64,
    pub title: String,
}

impl Resource for Process {
    const KIND: &'static str = "process";

    fn resource_id(&self) -> EntityId {
        EntityId::from(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: u64,
    pub title: String,
}

impl Resource for Proposal {
    const KIND: &'static str = "proposal";

    fn resource_id(&self) -> EntityId {
        EntityId::from(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: u64,
    pub title: String,
}

impl Resource for Meeting {
    const KIND: &'static str = "meeting";

    fn resource_id(&self) -> EntityId {
        EntityId::from(self.id)
    }
}

pub fn process(id: u64) -> Process {
    Process {
        id,
        title: format!("Process {id}"),
    }
}

pub fn proposal(id: u64) -> Proposal {
    Proposal {
        id,
        title: format!("Proposal {id}"),
    }
}

pub fn meeting(id: u64) -> Meeting {
    Meeting {
        id,
        title: format!("Meeting {id}"),
    }
}

/// In-memory records of one kind; removing a record simulates deletion by its owner
#[derive(Debug)]
pub struct CatalogLoader {
    kind: TypeTag,
    records: DashMap<EntityId, Value>,
    loads: AtomicUsize,
}

impl CatalogLoader {
    pub fn new(kind: impl Into<TypeTag>) -> Self {
        Self {
            kind: kind.into(),
            records: DashMap::new(),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn for_resource<T: Resource>() -> Self {
        Self::new(T::KIND)
    }

    pub fn insert<T: Resource>(&self, resource: &T) {
        let value = serde_json::to_value(resource).unwrap();
        self.records.insert(resource.resource_id(), value);
    }

    pub fn insert_raw(&self, id: impl Into<EntityId>, value: Value) {
        self.records.insert(id.into(), value);
    }

    pub fn remove(&self, id: impl Into<EntityId>) -> bool {
        self.records.remove(&id.into()).is_some()
    }

    /// Number of `load_many` calls served
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl EntityLoader for CatalogLoader {
    fn kind(&self) -> TypeTag {
        self.kind.clone()
    }

    fn load_many(&self, ids: &BTreeSet<EntityId>) -> Result<Vec<Record>, StorageError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.records.get(id).map(|value| {
                    Record::new(EntityRef::new(self.kind.clone(), id.clone()), value.clone())
                })
            })
            .collect())
    }
}

/// Graph over the three fixture kinds with direct access to their catalogs
pub struct Fixture {
    pub graph: LinkGraph,
    pub processes: Arc<CatalogLoader>,
    pub proposals: Arc<CatalogLoader>,
    pub meetings: Arc<CatalogLoader>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(LinkGraphConfig::default())
    }

    pub fn with_config(config: LinkGraphConfig) -> Self {
        let processes = Arc::new(CatalogLoader::for_resource::<Process>());
        let proposals = Arc::new(CatalogLoader::for_resource::<Proposal>());
        let meetings = Arc::new(CatalogLoader::for_resource::<Meeting>());
        let graph = LinkGraph::new(config, Arc::new(registry(&processes, &proposals, &meetings)));
        Self {
            graph,
            processes,
            proposals,
            meetings,
        }
    }

    /// Create and register processes `1..=count`
    pub fn seed_processes(&self, count: u64) -> Vec<Process> {
        (1..=count)
            .map(|id| {
                let p = process(id);
                self.processes.insert(&p);
                p
            })
            .collect()
    }

    /// Create and register proposals `1..=count`
    pub fn seed_proposals(&self, count: u64) -> Vec<Proposal> {
        (1..=count)
            .map(|id| {
                let p = proposal(id);
                self.proposals.insert(&p);
                p
            })
            .collect()
    }

    /// Create and register meetings `1..=count`
    pub fn seed_meetings(&self, count: u64) -> Vec<Meeting> {
        (1..=count)
            .map(|id| {
                let m = meeting(id);
                self.meetings.insert(&m);
                m
            })
            .collect()
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

pub fn registry(
    processes: &Arc<CatalogLoader>,
    proposals: &Arc<CatalogLoader>,
    meetings: &Arc<CatalogLoader>,
) -> TypeRegistry {
    TypeRegistry::new()
        .with_loader(processes.clone())
        .and_then(|r| r.with_loader(proposals.clone()))
        .and_then(|r| r.with_loader(meetings.clone()))
        .unwrap()
}
