//! Schema-driven query sets - Entry points tying the tree and plan builders together

use crate::config::PlannerConfig;
use crate::error::{AutoQueryError, AutoQueryResult};
use crate::metadata::{EntityType, MetadataSource};
use crate::planner::QueryPlanBuilder;
use crate::query::QuerySet;
use crate::schema::Schema;
use crate::tree::{FieldNode, FieldTreeBuilder};

/// Extension trait for query sets to fetch exactly what a schema renders
pub trait AutoQuery: Sized {
    /// Augment the query set for `schema` with default configuration
    fn prefetch_for(self, schema: &Schema, source: &dyn MetadataSource) -> AutoQueryResult<QuerySet> {
        self.prefetch_for_with_config(schema, source, &PlannerConfig::default())
    }

    /// Augment the query set for `schema`
    fn prefetch_for_with_config(
        self,
        schema: &Schema,
        source: &dyn MetadataSource,
        config: &PlannerConfig,
    ) -> AutoQueryResult<QuerySet>;
}

impl AutoQuery for QuerySet {
    fn prefetch_for_with_config(
        self,
        schema: &Schema,
        source: &dyn MetadataSource,
        config: &PlannerConfig,
    ) -> AutoQueryResult<QuerySet> {
        plan_schema(source, config, self, schema)
    }
}

/// Metadata source and configuration bundled for repeated planning
#[derive(Debug, Clone)]
pub struct AutoQueryPlanner<S> {
    source: S,
    config: PlannerConfig,
}

impl<S: MetadataSource> AutoQueryPlanner<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            config: PlannerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Field tree for `schema` rendered from `entity`
    pub fn field_tree(&self, schema: &Schema, entity: &EntityType) -> AutoQueryResult<FieldNode> {
        FieldTreeBuilder::new(&self.source)
            .with_config(self.config.clone())
            .build_schema(schema, entity)
    }

    /// Augment `query` for `schema`
    pub fn plan(&self, query: QuerySet, schema: &Schema) -> AutoQueryResult<QuerySet> {
        plan_schema(&self.source, &self.config, query, schema)
    }

    /// Query set over all instances of the schema's bound entity type
    pub fn plan_for_schema(&self, schema: &Schema) -> AutoQueryResult<QuerySet> {
        let entity = schema
            .entity()
            .ok_or_else(|| AutoQueryError::MissingEntityBinding(schema.name().to_string()))?;
        self.plan(QuerySet::all(entity.clone()), schema)
    }
}

fn plan_schema(
    source: &dyn MetadataSource,
    config: &PlannerConfig,
    query: QuerySet,
    schema: &Schema,
) -> AutoQueryResult<QuerySet> {
    config.validate()?;

    let entity = query.entity().clone();
    if let Some(bound) = schema.entity() {
        if bound != &entity {
            return Err(AutoQueryError::Configuration(format!(
                "Schema '{}' is bound to '{}' but the query set targets '{}'",
                schema.name(),
                bound,
                entity
            )));
        }
    }

    let tree = FieldTreeBuilder::new(source)
        .with_config(config.clone())
        .build_schema(schema, &entity)?;

    QueryPlanBuilder::new(source)
        .with_config(config.clone())
        .build(&entity, &tree, query)
}
