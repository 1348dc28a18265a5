//! Field Tree Builder - Mirrors a schema as a tree of relation-annotated nodes

use std::sync::Arc;

use super::node::{FieldNode, RelationKind};
use crate::config::PlannerConfig;
use crate::error::{AutoQueryError, AutoQueryResult};
use crate::metadata::{EntityMeta, EntityType, MetadataCache, MetadataSource};
use crate::schema::{Schema, SchemaField};

/// Builds field trees, resolving each entity type's metadata once per builder
pub struct FieldTreeBuilder<'a> {
    cache: MetadataCache<'a>,
    config: PlannerConfig,
}

impl<'a> FieldTreeBuilder<'a> {
    pub fn new(source: &'a dyn MetadataSource) -> Self {
        Self {
            cache: MetadataCache::new(source),
            config: PlannerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the tree for a schema field
    ///
    /// `entity` is the entity type the field's value lives in and
    /// `relation` links the field to its parent; the root of a build is
    /// usually given its entity type and `RelationKind::None`.
    pub fn build(
        &mut self,
        field: &SchemaField,
        entity: Option<&EntityType>,
        relation: RelationKind,
    ) -> AutoQueryResult<FieldNode> {
        tracing::debug!(
            "Building field tree for '{}' (entity: {:?}, relation: {})",
            field.name(),
            entity.map(EntityType::name),
            relation
        );
        self.build_node(field, entity.cloned(), relation, 0)
    }

    /// Build the tree for a top-level schema rendered from `entity`
    pub fn build_schema(&mut self, schema: &Schema, entity: &EntityType) -> AutoQueryResult<FieldNode> {
        tracing::debug!(
            "Building field tree for schema '{}' on {}",
            schema.name(),
            entity
        );
        let children = self.build_children(schema.fields(), Some(entity), 0)?;
        Ok(FieldNode::root(schema.name(), entity.clone()).with_children(children))
    }

    /// Number of entity types whose metadata this builder has resolved
    pub fn resolved_entities(&self) -> usize {
        self.cache.resolved_count()
    }

    fn build_node(
        &mut self,
        field: &SchemaField,
        entity: Option<EntityType>,
        relation: RelationKind,
        depth: usize,
    ) -> AutoQueryResult<FieldNode> {
        if depth > self.config.max_depth {
            return Err(AutoQueryError::MaxDepthExceeded {
                field: field.name().to_string(),
                max_depth: self.config.max_depth,
            });
        }

        let children = self.build_children(field.sub_fields(), entity.as_ref(), depth)?;

        Ok(FieldNode {
            field_name: field.name().to_string(),
            source: field.source().to_string(),
            entity,
            parent_relation: relation,
            children,
            custom_query: field.custom_query().map(Arc::clone),
        })
    }

    fn build_children(
        &mut self,
        fields: &[SchemaField],
        entity: Option<&EntityType>,
        depth: usize,
    ) -> AutoQueryResult<Vec<FieldNode>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }

        let meta = match entity {
            Some(entity) => Some(self.cache.resolve(entity)?),
            None => None,
        };

        let mut children = Vec::with_capacity(fields.len());
        for field in fields {
            let (child_entity, relation) = classify(meta.as_deref(), field);
            tracing::trace!(
                "Field '{}' (source '{}') classified as {}",
                field.name(),
                field.source(),
                relation
            );
            children.push(self.build_node(field, child_entity, relation, depth + 1)?);
        }

        Ok(children)
    }
}

/// Decide how a sub-field relates to the entity type of its parent
fn classify(meta: Option<&EntityMeta>, field: &SchemaField) -> (Option<EntityType>, RelationKind) {
    let Some(meta) = meta else {
        return (None, RelationKind::None);
    };

    let source = field.source();
    if meta.has_field(source) {
        return (None, RelationKind::Field);
    }

    let Some(relation) = meta.get_relation(source) else {
        return (None, RelationKind::None);
    };

    if field.shape().schema().is_some() && field.is_collection() != relation.to_many() {
        tracing::warn!(
            "Schema field '{}' is {} but {}.{} is a {:?} relation",
            field.name(),
            if field.is_collection() { "a collection" } else { "a single object" },
            meta.name,
            source,
            relation.relationship_type
        );
    }

    if let Some(bound) = field.bound_entity() {
        if bound != &relation.target {
            tracing::warn!(
                "Nested schema for '{}' is bound to {} but {}.{} targets {}",
                field.name(),
                bound,
                meta.name,
                source,
                relation.target
            );
        }
    }

    let kind = if field.custom_query().is_some() || relation.to_many() {
        RelationKind::ManyRelatedModel
    } else {
        RelationKind::RelatedModel
    };

    (Some(relation.target.clone()), kind)
}

/// Build the field tree for a schema field with default configuration
pub fn build_field_tree(
    source: &dyn MetadataSource,
    field: &SchemaField,
    entity: Option<&EntityType>,
    relation: RelationKind,
) -> AutoQueryResult<FieldNode> {
    FieldTreeBuilder::new(source).build(field, entity, relation)
}
