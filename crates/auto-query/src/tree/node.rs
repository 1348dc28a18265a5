//! Field Node - One node per schema field, annotated with its model relation

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::metadata::EntityType;
use crate::query::QuerySet;

/// How a schema field relates to its parent node's entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    /// No attribute or relation backs the field (computed fields, the root)
    #[default]
    None,
    /// Scalar attribute
    Field,
    /// To-one relation, forward or reverse
    RelatedModel,
    /// To-many relation, or any relation fetched through a supplied query set
    ManyRelatedModel,
}

impl RelationKind {
    /// Returns true if nodes of this kind carry a target entity type
    pub fn has_target(self) -> bool {
        matches!(self, Self::RelatedModel | Self::ManyRelatedModel)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::None => write!(f, "NONE"),
            RelationKind::Field => write!(f, "FIELD"),
            RelationKind::RelatedModel => write!(f, "RELATED_MODEL"),
            RelationKind::ManyRelatedModel => write!(f, "MANY_RELATED_MODEL"),
        }
    }
}

/// A schema field together with the entity type its value lives in
#[derive(Debug, Clone, Serialize)]
pub struct FieldNode {
    /// Declared name in the schema
    pub field_name: String,
    /// First-level attribute or relation name on the parent entity type
    pub source: String,
    /// Entity type of this node's value, if it is a relation target or root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityType>,
    /// Relation to the parent node's entity type
    pub parent_relation: RelationKind,
    /// Child nodes in schema declaration order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldNode>,
    /// Query set supplied on the schema field
    #[serde(skip)]
    pub custom_query: Option<Arc<QuerySet>>,
}

impl FieldNode {
    /// A node with no relation and no entity type
    pub fn new(field_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            source: source.into(),
            entity: None,
            parent_relation: RelationKind::None,
            children: Vec::new(),
            custom_query: None,
        }
    }

    /// Root node for an entity type
    pub fn root(field_name: impl Into<String>, entity: impl Into<EntityType>) -> Self {
        let field_name = field_name.into();
        let mut node = Self::new(field_name.clone(), field_name);
        node.entity = Some(entity.into());
        node
    }

    /// Scalar attribute node
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut node = Self::new(name.clone(), name);
        node.parent_relation = RelationKind::Field;
        node
    }

    /// To-one relation node
    pub fn related(
        field_name: impl Into<String>,
        source: impl Into<String>,
        entity: impl Into<EntityType>,
    ) -> Self {
        let mut node = Self::new(field_name, source);
        node.parent_relation = RelationKind::RelatedModel;
        node.entity = Some(entity.into());
        node
    }

    /// To-many relation node
    pub fn many_related(
        field_name: impl Into<String>,
        source: impl Into<String>,
        entity: impl Into<EntityType>,
    ) -> Self {
        let mut node = Self::new(field_name, source);
        node.parent_relation = RelationKind::ManyRelatedModel;
        node.entity = Some(entity.into());
        node
    }

    pub fn with_relation(mut self, relation: RelationKind) -> Self {
        self.parent_relation = relation;
        self
    }

    pub fn with_child(mut self, child: FieldNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<FieldNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_custom_query(mut self, query: Arc<QuerySet>) -> Self {
        self.custom_query = Some(query);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// First child with the given declared name
    pub fn child(&self, field_name: &str) -> Option<&FieldNode> {
        self.children.iter().find(|child| child.field_name == field_name)
    }

    /// Number of nodes in this subtree, this one included
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }
}
