//! Metadata Module - Entity metadata consumed by the tree and plan builders

pub mod cache;
pub mod registry;
pub mod types;

pub use cache::MetadataCache;
pub use registry::EntityRegistry;
pub use types::{EntityMeta, EntityType, RelationInfo, RelationshipType};

/// Source of static entity metadata
///
/// Implementations must be read-only and free of side effects: builders
/// call this at most once per entity type per build.
pub trait MetadataSource: Send + Sync {
    /// Metadata for an entity type, or None if it is unknown
    fn entity_meta(&self, entity: &EntityType) -> Option<EntityMeta>;
}
