//! # elif-auto-query: N+1-free query sets for nested serializers
//!
//! Walks a nested serialization schema together with entity metadata and
//! derives the query a store needs to render it: the attributes to
//! materialize, the to-one relations to join inline, and the to-many (or
//! caller-customized) relations to fetch in separate batched queries.
//!
//! ```
//! use elif_auto_query::{AutoQuery, EntityMeta, EntityRegistry, QuerySet, Schema};
//!
//! let registry = EntityRegistry::new();
//! registry.register(EntityMeta::new("Author").field("name").has_many("books", "Book")).unwrap();
//! registry.register(EntityMeta::new("Book").field("title")).unwrap();
//!
//! let schema = Schema::new("AuthorSerializer")
//!     .leaf("name")
//!     .many("books", Schema::new("BookSerializer").leaf("title"));
//!
//! let query = QuerySet::all("Author").prefetch_for(&schema, &registry).unwrap();
//! assert!(query.projection().unwrap().contains("name"));
//! assert_eq!(query.prefetches()[0].path(), "books");
//! ```

pub mod auto_query;
pub mod config;
pub mod error;
pub mod metadata;
pub mod planner;
pub mod query;
pub mod schema;
pub mod tree;

#[cfg(test)]
mod fixtures;

pub use auto_query::{AutoQuery, AutoQueryPlanner};
pub use config::{PlannerConfig, LOOKUP_SEP};
pub use error::{AutoQueryError, AutoQueryResult};
pub use metadata::{
    EntityMeta, EntityRegistry, EntityType, MetadataCache, MetadataSource, RelationInfo,
    RelationshipType,
};
pub use planner::{build_query_plan, QueryPlanBuilder};
pub use query::{OrderDirection, Prefetch, QueryOperator, QuerySet, WhereCondition};
pub use schema::{FieldShape, Schema, SchemaField};
pub use tree::{build_field_tree, FieldNode, FieldTreeBuilder, RelationKind};
