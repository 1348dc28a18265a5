//! Library models shared by the integration tests

#![allow(dead_code)]

use elif_auto_query::{EntityRegistry, EntityType, Schema};

const MODELS: &str = r#"
- name: Parent
  fields: [name, description]

- name: Child
  fields: [name]
  relations:
    parent:
      target: Parent
      type: BelongsTo
      inverse: children

- name: GrandChild
  fields: [name, age]
  relations:
    parent:
      target: Child
      type: BelongsTo
      inverse: grand_children

- name: Author
  fields: [name, description]
  relations:
    publisher_friends:
      target: Publisher
      type: ManyToMany
      inverse: author_friends
    favourite_book:
      target: Book
      type: BelongsTo
      inverse: authors_where_favourite_book

- name: Book
  fields: [title, num_of_pages]
  relations:
    author:
      target: Author
      type: BelongsTo
      inverse: books
    publisher:
      target: Publisher
      type: BelongsTo
      inverse: books

- name: Publisher
  fields: [name, first_name, last_name]

- name: TwinBrotherAuthor
  fields: [name, description]
  relations:
    author:
      target: Author
      type: HasOne
      inverse: twin_brother

- name: TwinSisterAuthor
  primary_key: uuid
  fields: [name, description]
  relations:
    author:
      target: Author
      type: HasOne
      inverse: twin_sister
    publisher_friends:
      target: Publisher
      type: ManyToMany
"#;

pub fn registry() -> EntityRegistry {
    EntityRegistry::from_yaml_str(MODELS).expect("fixture models are valid")
}

pub fn entity(name: &str) -> EntityType {
    EntityType::new(name)
}

pub fn book_schema() -> Schema {
    Schema::new("BookSerializer").bind("Book")
}

pub fn author_schema() -> Schema {
    Schema::new("AuthorSerializer").bind("Author")
}

pub fn full_family_schema() -> Schema {
    Schema::new("FullFamilySerializer")
        .bind("Parent")
        .many(
            "children",
            Schema::new("FullChildSerializer")
                .bind("Child")
                .many(
                    "grand_children",
                    Schema::new("GrandChildSerializer")
                        .bind("GrandChild")
                        .leaf("name")
                        .leaf("age"),
                )
                .leaf("name"),
        )
        .leaf("name")
        .leaf("description")
}
