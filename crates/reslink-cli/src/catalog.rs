//! Entity catalog file
//!
//! The `resolve` command has no host application to load records from, so it
//! reads them from a JSON file shaped like:
//!
//! ```json
//! { "process": [{"id": 1, "title": "Budget"}], "proposal": [{"id": "p-7"}] }
//! ```

use anyhow::{bail, Context};
use reslink_core::{EntityId, EntityLoader, EntityRef, Record, StorageError, TypeRegistry, TypeTag};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

/// Records of one kind read from a catalog file
#[derive(Debug)]
pub(crate) struct CatalogKind {
    kind: TypeTag,
    records: HashMap<EntityId, Value>,
}

impl CatalogKind {
    fn from_records(kind: &str, records: Vec<Value>) -> anyhow::Result<Self> {
        let kind = TypeTag::parse(kind)?;
        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            let id = match record.get("id") {
                Some(Value::String(id)) => EntityId::new(id.clone()),
                Some(Value::Number(id)) => EntityId::new(id.to_string()),
                _ => bail!("a `{kind}` record has no string or numeric \"id\""),
            };
            by_id.insert(id, record);
        }
        Ok(Self {
            kind,
            records: by_id,
        })
    }
}

impl EntityLoader for CatalogKind {
    fn kind(&self) -> TypeTag {
        self.kind.clone()
    }

    fn load_many(&self, ids: &BTreeSet<EntityId>) -> Result<Vec<Record>, StorageError> {
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.records
                    .get(id)
                    .map(|value| Record::new(EntityRef::new(self.kind.clone(), id.clone()), value.clone()))
            })
            .collect())
    }
}

/// Registry with one loader per kind in the catalog text
pub(crate) fn parse(text: &str) -> anyhow::Result<TypeRegistry> {
    let kinds: BTreeMap<String, Vec<Value>> =
        serde_json::from_str(text).context("catalog must map kind names to arrays of records")?;

    let mut registry = TypeRegistry::new();
    for (kind, records) in kinds {
        let loader = CatalogKind::from_records(&kind, records)?;
        tracing::debug!("Catalog kind {} with {} records", kind, loader.records.len());
        registry.register(Arc::new(loader))?;
    }
    Ok(registry)
}

/// Registry from a catalog file
pub(crate) fn load(path: &Path) -> anyhow::Result<TypeRegistry> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read catalog {}", path.display()))?;
    parse(&text).with_context(|| format!("invalid catalog {}", path.display()))
}
