//! Serialization schema - Declarative, possibly nested description of output fields

use std::sync::Arc;

use crate::metadata::EntityType;
use crate::query::QuerySet;

/// A named group of fields, optionally bound to the entity type it renders
#[derive(Debug, Clone, Default)]
pub struct Schema {
    name: String,
    entity: Option<EntityType>,
    fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity: None,
            fields: Vec::new(),
        }
    }

    /// Bind the schema to the entity type it renders
    pub fn bind(mut self, entity: impl Into<EntityType>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a scalar field whose source is its name
    pub fn leaf(self, name: impl Into<String>) -> Self {
        self.field(SchemaField::leaf(name))
    }

    /// Add a nested single-object field
    pub fn nested(self, name: impl Into<String>, schema: Schema) -> Self {
        self.field(SchemaField::nested(name, schema))
    }

    /// Add a nested collection field
    pub fn many(self, name: impl Into<String>, schema: Schema) -> Self {
        self.field(SchemaField::many(name, schema))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity(&self) -> Option<&EntityType> {
        self.entity.as_ref()
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Number of fields declared across all nesting levels
    pub fn field_count(&self) -> usize {
        self.fields.iter().map(SchemaField::field_count).sum()
    }
}

/// Shape of a schema field's value
#[derive(Debug, Clone)]
pub enum FieldShape {
    /// Scalar rendering, no sub-fields
    Leaf,
    /// Single nested object rendered with its own schema
    Composite(Schema),
    /// Collection wrapper around an element shape
    Collection(Box<FieldShape>),
}

impl FieldShape {
    /// Declared sub-fields, unwrapping one collection level
    pub fn sub_fields(&self) -> &[SchemaField] {
        match self {
            Self::Leaf => &[],
            Self::Composite(schema) => schema.fields(),
            Self::Collection(element) => match element.as_ref() {
                Self::Composite(schema) => schema.fields(),
                _ => &[],
            },
        }
    }

    /// The nested schema, unwrapping one collection level
    pub fn schema(&self) -> Option<&Schema> {
        match self {
            Self::Leaf => None,
            Self::Composite(schema) => Some(schema),
            Self::Collection(element) => match element.as_ref() {
                Self::Composite(schema) => Some(schema),
                _ => None,
            },
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection(_))
    }
}

/// One declared field of a schema
#[derive(Debug, Clone)]
pub struct SchemaField {
    name: String,
    source: String,
    shape: FieldShape,
    query: Option<Arc<QuerySet>>,
}

impl SchemaField {
    fn with_shape(name: impl Into<String>, shape: FieldShape) -> Self {
        let name = name.into();
        Self {
            source: name.clone(),
            name,
            shape,
            query: None,
        }
    }

    pub fn leaf(name: impl Into<String>) -> Self {
        Self::with_shape(name, FieldShape::Leaf)
    }

    /// A collection of scalar values
    pub fn list(name: impl Into<String>) -> Self {
        Self::with_shape(name, FieldShape::Collection(Box::new(FieldShape::Leaf)))
    }

    pub fn nested(name: impl Into<String>, schema: Schema) -> Self {
        Self::with_shape(name, FieldShape::Composite(schema))
    }

    pub fn many(name: impl Into<String>, schema: Schema) -> Self {
        Self::with_shape(
            name,
            FieldShape::Collection(Box::new(FieldShape::Composite(schema))),
        )
    }

    /// The root field for a top-level schema
    pub fn from_schema(schema: Schema) -> Self {
        Self::with_shape(schema.name().to_string(), FieldShape::Composite(schema))
    }

    /// Read the value from a differently named attribute or relation
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Fetch this field through an explicitly supplied sub-query
    pub fn with_queryset(mut self, query: QuerySet) -> Self {
        self.query = Some(Arc::new(query));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn shape(&self) -> &FieldShape {
        &self.shape
    }

    pub fn sub_fields(&self) -> &[SchemaField] {
        self.shape.sub_fields()
    }

    pub fn is_collection(&self) -> bool {
        self.shape.is_collection()
    }

    /// Entity type bound on the nested schema, if any
    pub fn bound_entity(&self) -> Option<&EntityType> {
        self.shape.schema().and_then(Schema::entity)
    }

    pub fn custom_query(&self) -> Option<&Arc<QuerySet>> {
        self.query.as_ref()
    }

    /// Number of fields in this subtree, this one included
    pub fn field_count(&self) -> usize {
        1 + self.sub_fields().iter().map(Self::field_count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_defaults_to_name() {
        let field = SchemaField::leaf("title");
        assert_eq!(field.name(), "title");
        assert_eq!(field.source(), "title");

        let aliased = SchemaField::leaf("book").with_source("favourite_book");
        assert_eq!(aliased.name(), "book");
        assert_eq!(aliased.source(), "favourite_book");
    }

    #[test]
    fn test_collection_unwraps_one_level() {
        let field = SchemaField::many("books", Schema::new("Book").leaf("title").leaf("num_of_pages"));
        assert!(field.is_collection());
        assert_eq!(field.sub_fields().len(), 2);
        assert_eq!(field.sub_fields()[0].name(), "title");

        let nested_twice = FieldShape::Collection(Box::new(FieldShape::Collection(Box::new(
            FieldShape::Composite(Schema::new("Inner").leaf("x")),
        ))));
        assert!(nested_twice.sub_fields().is_empty());

        assert!(SchemaField::list("tags").sub_fields().is_empty());
    }

    #[test]
    fn test_field_count_spans_all_levels() {
        let schema = Schema::new("Author")
            .bind("Author")
            .leaf("name")
            .many(
                "books",
                Schema::new("Book")
                    .leaf("title")
                    .nested("publisher", Schema::new("Publisher").leaf("first_name")),
            );

        assert_eq!(schema.field_count(), 5);
        assert_eq!(SchemaField::from_schema(schema).field_count(), 6);
    }

    #[test]
    fn test_bound_entity_and_custom_query() {
        let field = SchemaField::many("books", Schema::new("Book").bind("Book").leaf("title"))
            .with_queryset(QuerySet::all("Book"));

        assert_eq!(field.bound_entity(), Some(&EntityType::new("Book")));
        assert_eq!(field.custom_query().unwrap().entity(), &EntityType::new("Book"));
        assert!(SchemaField::leaf("name").bound_entity().is_none());
    }
}
