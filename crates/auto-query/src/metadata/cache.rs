//! Per-build memoization of entity metadata lookups

use std::collections::HashMap;
use std::sync::Arc;

use super::{EntityMeta, EntityType, MetadataSource};
use crate::error::{AutoQueryError, AutoQueryResult};

/// Resolves entity metadata once per entity type for the lifetime of one build
pub struct MetadataCache<'a> {
    source: &'a dyn MetadataSource,
    resolved: HashMap<EntityType, Arc<EntityMeta>>,
}

impl<'a> MetadataCache<'a> {
    pub fn new(source: &'a dyn MetadataSource) -> Self {
        Self {
            source,
            resolved: HashMap::new(),
        }
    }

    /// Resolve metadata, consulting the source only on first access
    pub fn resolve(&mut self, entity: &EntityType) -> AutoQueryResult<Arc<EntityMeta>> {
        if let Some(meta) = self.resolved.get(entity) {
            return Ok(Arc::clone(meta));
        }

        let meta = self
            .source
            .entity_meta(entity)
            .map(Arc::new)
            .ok_or_else(|| AutoQueryError::UnknownEntity(entity.to_string()))?;

        tracing::trace!("Resolved metadata for entity type {}", entity);
        self.resolved.insert(entity.clone(), Arc::clone(&meta));
        Ok(meta)
    }

    /// Resolve metadata for an entity type that is about to be queried
    pub fn resolve_queryable(&mut self, entity: &EntityType) -> AutoQueryResult<Arc<EntityMeta>> {
        let meta = self.resolve(entity)?;
        if meta.is_abstract {
            return Err(AutoQueryError::AbstractEntity(entity.to_string()));
        }
        Ok(meta)
    }

    /// Number of distinct entity types resolved so far
    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }
}
