//! Entity Registry - Thread-safe runtime storage for entity metadata

use dashmap::DashMap;
use std::sync::Arc;

use super::types::{EntityMeta, EntityType, RelationInfo};
use super::MetadataSource;
use crate::error::{AutoQueryError, AutoQueryResult};

/// Thread-safe registry of entity metadata
///
/// Relations registered with an `inverse` name are also visible from the
/// target entity type under that name.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: Arc<DashMap<EntityType, EntityMeta>>,
}

impl EntityRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register metadata for an entity type, replacing any previous entry
    pub fn register(&self, meta: EntityMeta) -> AutoQueryResult<()> {
        meta.validate()?;
        self.check_inverse_names(&meta)?;

        tracing::debug!(
            "Registering entity type {} ({} fields, {} relations)",
            meta.name,
            meta.fields.len(),
            meta.relations.len()
        );

        if self.entities.insert(meta.name.clone(), meta).is_some() {
            tracing::debug!("Replaced previously registered entity metadata");
        }

        Ok(())
    }

    /// An inverse name may be claimed by only one relation per target
    fn check_inverse_names(&self, meta: &EntityMeta) -> AutoQueryResult<()> {
        for (name, relation) in &meta.relations {
            let Some(inverse) = relation.inverse.as_deref() else {
                continue;
            };

            let duplicate = meta.relations.iter().find(|(other, claimed)| {
                *other != name
                    && claimed.target == relation.target
                    && claimed.inverse.as_deref() == Some(inverse)
            });
            if let Some((other, _)) = duplicate {
                return Err(inverse_clash(
                    &relation.target,
                    inverse,
                    (&meta.name, name.as_str()),
                    (&meta.name, other.as_str()),
                ));
            }

            for entry in self.entities.iter() {
                if entry.key() == &meta.name {
                    continue;
                }
                let claimed = entry.value().relations.iter().find(|(_, claimed)| {
                    claimed.target == relation.target && claimed.inverse.as_deref() == Some(inverse)
                });
                if let Some((other, _)) = claimed {
                    return Err(inverse_clash(
                        &relation.target,
                        inverse,
                        (entry.key(), other.as_str()),
                        (&meta.name, name.as_str()),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Chainable registration for building fixtures
    pub fn with(self, meta: EntityMeta) -> AutoQueryResult<Self> {
        self.register(meta)?;
        Ok(self)
    }

    /// Build a registry from a YAML list of entity definitions
    pub fn from_yaml_str(content: &str) -> AutoQueryResult<Self> {
        let definitions: Vec<EntityMeta> = serde_yaml::from_str(content)?;
        let registry = Self::new();
        for meta in definitions {
            registry.register(meta)?;
        }
        Ok(registry)
    }

    pub fn contains(&self, entity: &EntityType) -> bool {
        self.entities.contains_key(entity)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Registered entity type names, sorted
    pub fn entity_names(&self) -> Vec<EntityType> {
        let mut names: Vec<EntityType> =
            self.entities.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Get metadata for an entity type with inverse relations merged in
    pub fn get(&self, entity: &EntityType) -> Option<EntityMeta> {
        let mut meta = self.entities.get(entity)?.value().clone();

        for entry in self.entities.iter() {
            let owner = entry.key();
            for (name, relation) in &entry.value().relations {
                if &relation.target != entity {
                    continue;
                }
                let Some(inverse) = relation.inverse.as_ref() else {
                    continue;
                };
                if meta.relations.contains_key(inverse) || meta.has_field(inverse) {
                    continue;
                }

                meta.relations.insert(
                    inverse.clone(),
                    RelationInfo::new(relation.relationship_type.inverse(), owner.clone())
                        .with_inverse(name.clone()),
                );
            }
        }

        Some(meta)
    }
}

fn inverse_clash(
    target: &EntityType,
    inverse: &str,
    (first, first_relation): (&EntityType, &str),
    (second, second_relation): (&EntityType, &str),
) -> AutoQueryError {
    AutoQueryError::Configuration(format!(
        "Inverse relation '{}.{}' is claimed by both {}.{} and {}.{}",
        target, inverse, first, first_relation, second, second_relation
    ))
}

impl MetadataSource for EntityRegistry {
    fn entity_meta(&self, entity: &EntityType) -> Option<EntityMeta> {
        self.get(entity)
    }
}
