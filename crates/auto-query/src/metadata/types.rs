//! Entity Metadata - Scalar attributes, relations and primary keys per entity type

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{AutoQueryError, AutoQueryResult};

/// Identifier of an entity type (a model class)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Defines the type of relationship between entity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// One-to-one relationship, either side
    HasOne,
    /// Reverse side of a foreign key
    HasMany,
    /// Forward foreign key (many-to-one)
    BelongsTo,
    /// Many-to-many relationship, either side
    ManyToMany,
}

impl RelationshipType {
    /// Returns true if this relationship yields a collection
    pub fn is_collection(self) -> bool {
        matches!(self, Self::HasMany | Self::ManyToMany)
    }

    /// The relationship type seen from the other side
    pub fn inverse(self) -> Self {
        match self {
            Self::HasOne => Self::HasOne,
            Self::HasMany => Self::BelongsTo,
            Self::BelongsTo => Self::HasMany,
            Self::ManyToMany => Self::ManyToMany,
        }
    }
}

/// Relation from one entity type to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationInfo {
    /// The related entity type
    pub target: EntityType,

    /// Cardinality of the relation
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,

    /// Name under which the reverse relation is reachable from the target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<String>,
}

impl RelationInfo {
    pub fn new(relationship_type: RelationshipType, target: impl Into<EntityType>) -> Self {
        Self {
            target: target.into(),
            relationship_type,
            inverse: None,
        }
    }

    /// Set the inverse relationship name
    pub fn with_inverse(mut self, inverse: impl Into<String>) -> Self {
        self.inverse = Some(inverse.into());
        self
    }

    pub fn to_many(&self) -> bool {
        self.relationship_type.is_collection()
    }
}

fn default_primary_key() -> String {
    "id".to_string()
}

/// Everything the planner needs to know about one entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMeta {
    pub name: EntityType,

    /// Primary key attribute name, defaults to "id"
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Scalar attributes (the primary key is implied)
    #[serde(default)]
    pub fields: BTreeSet<String>,

    /// Relation attribute name -> relation
    #[serde(default)]
    pub relations: BTreeMap<String, RelationInfo>,

    /// Abstract entity types cannot be queried
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
}

impl EntityMeta {
    pub fn new(name: impl Into<EntityType>) -> Self {
        Self {
            name: name.into(),
            primary_key: default_primary_key(),
            fields: BTreeSet::new(),
            relations: BTreeMap::new(),
            is_abstract: false,
        }
    }

    /// Override the primary key attribute name
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into());
        self
    }

    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn relation(mut self, name: impl Into<String>, relation: RelationInfo) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    pub fn belongs_to(self, name: impl Into<String>, target: impl Into<EntityType>) -> Self {
        self.relation(name, RelationInfo::new(RelationshipType::BelongsTo, target))
    }

    pub fn has_one(self, name: impl Into<String>, target: impl Into<EntityType>) -> Self {
        self.relation(name, RelationInfo::new(RelationshipType::HasOne, target))
    }

    pub fn has_many(self, name: impl Into<String>, target: impl Into<EntityType>) -> Self {
        self.relation(name, RelationInfo::new(RelationshipType::HasMany, target))
    }

    pub fn many_to_many(self, name: impl Into<String>, target: impl Into<EntityType>) -> Self {
        self.relation(name, RelationInfo::new(RelationshipType::ManyToMany, target))
    }

    /// Mark the entity type as abstract
    pub fn abstract_model(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn primary_key_name(&self) -> &str {
        &self.primary_key
    }

    /// Returns true if `name` is a scalar attribute, including the primary key
    pub fn has_field(&self, name: &str) -> bool {
        name == self.primary_key || self.fields.contains(name)
    }

    pub fn get_relation(&self, name: &str) -> Option<&RelationInfo> {
        self.relations.get(name)
    }

    /// Returns true if `source` names any attribute or relation of this entity type
    pub fn has_source(&self, source: &str) -> bool {
        self.has_field(source) || self.relations.contains_key(source)
    }

    /// Validate the metadata for consistency
    pub fn validate(&self) -> AutoQueryResult<()> {
        if self.name.name().is_empty() {
            return Err(AutoQueryError::Configuration(
                "Entity type name cannot be empty".to_string(),
            ));
        }

        if self.primary_key.is_empty() {
            return Err(AutoQueryError::Configuration(format!(
                "Entity type '{}' must declare a primary key name",
                self.name
            )));
        }

        if let Some(clash) = self.relations.keys().find(|name| self.has_field(name)) {
            return Err(AutoQueryError::Configuration(format!(
                "Entity type '{}' declares '{}' as both an attribute and a relation",
                self.name, clash
            )));
        }

        Ok(())
    }
}
