//! Loader registry
//!
//! Provides [`TypeRegistry`], the default [`TypeResolver`]: a table of
//! loaders keyed by the kind each one reports.

use crate::resolver::{EntityLoader, TypeResolver};
use reslink_types::{TypeTag, ValidationError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registry of entity loaders by kind
#[derive(Default, Clone)]
pub struct TypeRegistry {
    loaders: HashMap<TypeTag, Arc<dyn EntityLoader>>,
}

impl TypeRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loader under the kind it reports
    ///
    /// Returns the loader previously registered for that kind, if any.
    ///
    /// # Errors
    /// [`ValidationError::EmptyTypeTag`] if the loader's kind is blank.
    pub fn register(
        &mut self,
        loader: Arc<dyn EntityLoader>,
    ) -> Result<Option<Arc<dyn EntityLoader>>, ValidationError> {
        let kind = loader.kind();
        if kind.is_blank() {
            return Err(ValidationError::EmptyTypeTag);
        }
        Ok(self.loaders.insert(kind, loader))
    }

    /// Builder-style [`register`](Self::register)
    ///
    /// # Errors
    /// As [`register`](Self::register).
    pub fn with_loader(mut self, loader: Arc<dyn EntityLoader>) -> Result<Self, ValidationError> {
        self.register(loader)?;
        Ok(self)
    }

    /// Check if kind is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.loaders.contains_key(kind)
    }

    /// Remove a kind's loader
    #[inline]
    pub fn remove(&mut self, kind: &str) -> Option<Arc<dyn EntityLoader>> {
        self.loaders.remove(kind)
    }

    /// Registered kinds, sorted
    #[must_use]
    pub fn kinds(&self) -> Vec<&TypeTag> {
        let mut kinds: Vec<_> = self.loaders.keys().collect();
        kinds.sort();
        kinds
    }

    /// Number of registered kinds
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve(&self, kind: &str) -> Option<Arc<dyn EntityLoader>> {
        self.loaders.get(kind).cloned()
    }
}
