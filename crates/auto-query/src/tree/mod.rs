//! Field Tree Module - Schema trees annotated with entity relations

pub mod builder;
pub mod node;

pub use builder::{build_field_tree, FieldTreeBuilder};
pub use node::{FieldNode, RelationKind};
