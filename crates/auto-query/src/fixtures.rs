//! Shared entity metadata for unit tests

use crate::metadata::{EntityMeta, EntityRegistry, RelationInfo, RelationshipType};

pub(crate) fn registry() -> EntityRegistry {
    let registry = EntityRegistry::new();

    let entities = [
        EntityMeta::new("Author")
            .fields(["name", "description"])
            .relation(
                "favourite_book",
                RelationInfo::new(RelationshipType::BelongsTo, "Book")
                    .with_inverse("authors_where_favourite_book"),
            )
            .relation(
                "publisher_friends",
                RelationInfo::new(RelationshipType::ManyToMany, "Publisher")
                    .with_inverse("author_friends"),
            ),
        EntityMeta::new("Book")
            .fields(["title", "num_of_pages"])
            .relation(
                "author",
                RelationInfo::new(RelationshipType::BelongsTo, "Author").with_inverse("books"),
            )
            .relation(
                "publisher",
                RelationInfo::new(RelationshipType::BelongsTo, "Publisher").with_inverse("books"),
            ),
        EntityMeta::new("Publisher").fields(["name", "first_name", "last_name"]),
        EntityMeta::new("TwinSisterAuthor")
            .primary_key("uuid")
            .fields(["name", "description"])
            .relation(
                "author",
                RelationInfo::new(RelationshipType::HasOne, "Author").with_inverse("twin_sister"),
            )
            .many_to_many("publisher_friends", "Publisher"),
        EntityMeta::new("Person").field("name").abstract_model(),
    ];

    for meta in entities {
        registry
            .register(meta)
            .expect("fixture metadata is valid");
    }

    registry
}
