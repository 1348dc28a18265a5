//! Query Plan Builder - Projection, joins and batched prefetches from a field tree

use std::collections::BTreeSet;
use std::sync::Arc;

use super::joins::query_joins;
use crate::config::PlannerConfig;
use crate::error::{AutoQueryError, AutoQueryResult};
use crate::metadata::{EntityType, MetadataCache, MetadataSource};
use crate::query::{Prefetch, QuerySet};
use crate::tree::{FieldNode, RelationKind};

/// Augments query sets with everything a field tree needs
pub struct QueryPlanBuilder<'a> {
    cache: MetadataCache<'a>,
    config: PlannerConfig,
}

impl<'a> QueryPlanBuilder<'a> {
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

    /// Apply projection, joins and prefetches for `tree` to `base`
    ///
    /// Prefetches the caller already customized on `base` are kept as they
    /// are, shared with the returned query set.
    pub fn build(
        &mut self,
        entity: &EntityType,
        tree: &FieldNode,
        base: QuerySet,
    ) -> AutoQueryResult<QuerySet> {
        if base.entity() != entity {
            return Err(AutoQueryError::Configuration(format!(
                "Base query set targets '{}' but the plan was requested for '{}'",
                base.entity(),
                entity
            )));
        }
        self.cache.resolve_queryable(entity)?;

        let selected = self.selected_fields(tree, "")?;
        let joins = query_joins(&selected, &self.config.lookup_separator);
        tracing::debug!(
            "Plan for {}: projection {:?}, joins {:?}",
            entity,
            selected,
            joins
        );

        let mut query = base;
        if self.config.restrict_projection {
            query = query.only(selected);
        }
        if !joins.is_empty() {
            query = query.select_related(joins);
        }

        let prefetches = self.prefetch_objects(tree, &query, "")?;
        for prefetch in prefetches {
            query = query.prefetch_related(prefetch);
        }

        Ok(query)
    }

    /// Attribute paths to materialize for the children of `node`
    pub fn selected_fields(&mut self, node: &FieldNode, prefix: &str) -> AutoQueryResult<BTreeSet<String>> {
        let mut selected = BTreeSet::new();

        for child in &node.children {
            match child.parent_relation {
                RelationKind::None | RelationKind::ManyRelatedModel => continue,
                RelationKind::Field => {
                    selected.insert(self.config.join_path(prefix, &child.source));
                }
                RelationKind::RelatedModel => {
                    let path = self.config.join_path(prefix, &child.source);
                    let target = target_of(child, &path)?;
                    if child.is_leaf() {
                        let meta = self.cache.resolve(target)?;
                        selected.insert(self.config.join_path(&path, meta.primary_key_name()));
                    } else {
                        selected.extend(self.selected_fields(child, &path)?);
                    }
                }
            }
        }

        Ok(selected)
    }

    /// Batched fetches required by the children of `node`
    ///
    /// To-one children never get a fetch of their own; their to-many
    /// descendants are hoisted here with the compound path. Two fields
    /// fetching the same path is an error.
    pub fn prefetch_objects(
        &mut self,
        node: &FieldNode,
        base: &QuerySet,
        prefix: &str,
    ) -> AutoQueryResult<Vec<Prefetch>> {
        let mut prefetches = Vec::new();

        for child in &node.children {
            match child.parent_relation {
                RelationKind::None | RelationKind::Field => continue,
                RelationKind::RelatedModel => {
                    let path = self.config.join_path(prefix, &child.source);
                    target_of(child, &path)?;
                    for hoisted in self.prefetch_objects(child, base, &path)? {
                        push_unique(&mut prefetches, hoisted)?;
                    }
                }
                RelationKind::ManyRelatedModel => {
                    let path = self.config.join_path(prefix, &child.source);
                    let target = target_of(child, &path)?;
                    let prefetch = self.resolve_prefetch(child, target, path, base)?;
                    push_unique(&mut prefetches, prefetch)?;
                }
            }
        }

        Ok(prefetches)
    }

    fn resolve_prefetch(
        &mut self,
        node: &FieldNode,
        target: &EntityType,
        path: String,
        base: &QuerySet,
    ) -> AutoQueryResult<Prefetch> {
        if let Some(existing) = base.customized_prefetch(&path) {
            check_target(existing, target, &path)?;
            tracing::debug!("Reusing customized prefetch at {}", path);
            return Ok(Prefetch::shared(path, Arc::clone(existing)));
        }

        if let Some(custom) = &node.custom_query {
            check_target(custom, target, &path)?;
            tracing::debug!("Using schema-supplied query set for prefetch at {}", path);
            return Ok(Prefetch::shared(path, Arc::clone(custom)));
        }

        let queryset = QuerySet::all(target.clone());
        let queryset = if node.is_leaf() {
            self.cache.resolve_queryable(target)?;
            queryset
        } else {
            self.build(target, node, queryset)?
        };

        tracing::debug!("Derived prefetch at {} on {}", path, target);
        Ok(Prefetch::new(path, queryset))
    }
}

fn target_of<'n>(node: &'n FieldNode, path: &str) -> AutoQueryResult<&'n EntityType> {
    node.entity
        .as_ref()
        .ok_or_else(|| AutoQueryError::UnresolvedRelation {
            field: node.field_name.clone(),
            path: path.to_string(),
            kind: node.parent_relation.to_string(),
        })
}

fn push_unique(prefetches: &mut Vec<Prefetch>, prefetch: Prefetch) -> AutoQueryResult<()> {
    if prefetches.iter().any(|existing| existing.path() == prefetch.path()) {
        return Err(AutoQueryError::AmbiguousPrefetch {
            path: prefetch.path().to_string(),
        });
    }
    prefetches.push(prefetch);
    Ok(())
}

fn check_target(queryset: &QuerySet, target: &EntityType, path: &str) -> AutoQueryResult<()> {
    if queryset.entity() != target {
        return Err(AutoQueryError::PrefetchConflict {
            path: path.to_string(),
            expected: target.to_string(),
            found: queryset.entity().to_string(),
        });
    }
    Ok(())
}

/// Build the query plan for a field tree with default configuration
pub fn build_query_plan(
    source: &dyn MetadataSource,
    entity: &EntityType,
    tree: &FieldNode,
    base: QuerySet,
) -> AutoQueryResult<QuerySet> {
    QueryPlanBuilder::new(source).build(entity, tree, base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn author_node() -> FieldNode {
        FieldNode::root("AuthorSerializer", "Author")
    }

    fn selected(tree: &FieldNode) -> Vec<String> {
        let registry = fixtures::registry();
        QueryPlanBuilder::new(&registry)
            .selected_fields(tree, "")
            .unwrap()
            .into_iter()
            .collect()
    }

    fn prefetches(tree: &FieldNode, base: &QuerySet) -> Vec<Prefetch> {
        let registry = fixtures::registry();
        QueryPlanBuilder::new(&registry)
            .prefetch_objects(tree, base, "")
            .unwrap()
    }

    #[test]
    fn test_single_related_field() {
        let tree = author_node().with_child(FieldNode::related("book", "favourite_book", "Book"));
        assert_eq!(selected(&tree), vec!["favourite_book__id"]);
    }

    #[test]
    fn test_two_level_single_related_field() {
        let tree = author_node().with_child(
            FieldNode::related("book", "favourite_book", "Book").with_child(FieldNode::field("title")),
        );
        assert_eq!(selected(&tree), vec!["favourite_book__title"]);
    }

    #[test]
    fn test_three_level_relation() {
        let tree = author_node().with_child(
            FieldNode::related("book", "favourite_book", "Book").with_child(
                FieldNode::related("publisher", "publisher", "Publisher")
                    .with_child(FieldNode::field("name")),
            ),
        );
        assert_eq!(selected(&tree), vec!["favourite_book__publisher__name"]);
    }

    #[test]
    fn test_no_relation() {
        let tree = author_node().with_child(FieldNode::new("name", "name"));
        assert!(selected(&tree).is_empty());
    }

    #[test]
    fn test_overridden_primary_key_field() {
        let tree = author_node()
            .with_child(FieldNode::related("twin_sister", "twin_sister", "TwinSisterAuthor"));
        assert_eq!(selected(&tree), vec!["twin_sister__uuid"]);
    }

    #[test]
    fn test_many_relation_is_not_projected() {
        let tree = author_node()
            .with_child(FieldNode::field("name"))
            .with_child(
                FieldNode::many_related("books", "books", "Book").with_child(FieldNode::field("title")),
            );
        assert_eq!(selected(&tree), vec!["name"]);
    }

    #[test]
    fn test_simple_prefetch() {
        let tree = author_node().with_child(FieldNode::many_related(
            "publisher_friends",
            "publisher_friends",
            "Publisher",
        ));

        let prefetches = prefetches(&tree, &QuerySet::all("Author"));

        assert_eq!(prefetches.len(), 1);
        assert_eq!(prefetches[0].path(), "publisher_friends");
        assert_eq!(
            prefetches[0].queryset().unwrap().as_ref(),
            &QuerySet::all("Publisher")
        );
    }

    #[test]
    fn test_select_to_nested_prefetch() {
        let tree = author_node().with_child(
            FieldNode::many_related("books", "books", "Book")
                .with_child(FieldNode::related("publisher", "publisher", "Publisher")),
        );

        let prefetches = prefetches(&tree, &QuerySet::all("Author"));

        assert_eq!(prefetches.len(), 1);
        assert_eq!(prefetches[0].path(), "books");
        let queryset = prefetches[0].queryset().unwrap();
        assert!(queryset.joins().contains("publisher"));
        assert!(queryset.projection().unwrap().contains("publisher__id"));
    }

    #[test]
    fn test_do_not_overwrite_existing_prefetch() {
        let tree = author_node().with_child(
            FieldNode::many_related("books", "books", "Book").with_child(FieldNode::field("title")),
        );
        let base = QuerySet::all("Author").prefetch_related(Prefetch::new(
            "books",
            QuerySet::all("Book").annotate("test_annotation", "TRUE"),
        ));

        let prefetches = prefetches(&tree, &base);

        assert_eq!(prefetches.len(), 1);
        let queryset = prefetches[0].queryset().unwrap();
        assert!(queryset.annotations().contains_key("test_annotation"));
        assert!(Arc::ptr_eq(queryset, base.customized_prefetch("books").unwrap()));
        assert!(queryset.projection().is_none());
    }

    #[test]
    fn test_prefetch_on_nested_model() {
        let tree = author_node().with_child(
            FieldNode::related("twin_sister", "twin_sister", "TwinSisterAuthor").with_child(
                FieldNode::many_related("publisher_friends", "publisher_friends", "Publisher"),
            ),
        );

        let prefetches = prefetches(&tree, &QuerySet::all("Author"));

        assert_eq!(prefetches.len(), 1);
        assert_eq!(prefetches[0].path(), "twin_sister__publisher_friends");
    }

    #[test]
    fn test_missing_target_fails_fast() {
        let registry = fixtures::registry();
        let tree = author_node()
            .with_child(FieldNode::new("books", "books").with_relation(RelationKind::ManyRelatedModel));

        let err = QueryPlanBuilder::new(&registry)
            .build(&EntityType::new("Author"), &tree, QuerySet::all("Author"))
            .unwrap_err();

        assert!(matches!(
            err,
            AutoQueryError::UnresolvedRelation { ref path, ref kind, .. }
                if path == "books" && kind == "MANY_RELATED_MODEL"
        ));
    }

    #[test]
    fn test_missing_target_on_to_one_fails_fast() {
        let registry = fixtures::registry();
        let tree = author_node().with_child(
            FieldNode::new("book", "favourite_book").with_relation(RelationKind::RelatedModel),
        );

        let result = QueryPlanBuilder::new(&registry).build(
            &EntityType::new("Author"),
            &tree,
            QuerySet::all("Author"),
        );

        assert!(matches!(result, Err(AutoQueryError::UnresolvedRelation { .. })));
    }

    #[test]
    fn test_conflicting_customization_fails_fast() {
        let registry = fixtures::registry();
        let tree = author_node().with_child(FieldNode::many_related("books", "books", "Book"));
        let base = QuerySet::all("Author").prefetch_related(Prefetch::new("books", QuerySet::all("Publisher")));

        let err = QueryPlanBuilder::new(&registry)
            .build(&EntityType::new("Author"), &tree, base)
            .unwrap_err();

        assert!(matches!(err, AutoQueryError::PrefetchConflict { ref found, .. } if found == "Publisher"));
    }

    #[test]
    fn test_base_query_must_target_entity() {
        let registry = fixtures::registry();
        let result = QueryPlanBuilder::new(&registry).build(
            &EntityType::new("Author"),
            &author_node(),
            QuerySet::all("Book"),
        );
        assert!(matches!(result, Err(AutoQueryError::Configuration(_))));
    }

    #[test]
    fn test_abstract_entity_is_rejected() {
        let registry = fixtures::registry();
        let result = QueryPlanBuilder::new(&registry).build(
            &EntityType::new("Person"),
            &FieldNode::root("PersonSerializer", "Person"),
            QuerySet::all("Person"),
        );
        assert!(matches!(result, Err(AutoQueryError::AbstractEntity(_))));
    }

    #[test]
    fn test_unrestricted_projection_keeps_joins() {
        let registry = fixtures::registry();
        let tree = author_node().with_child(
            FieldNode::related("book", "favourite_book", "Book").with_child(FieldNode::field("title")),
        );

        let query = QueryPlanBuilder::new(&registry)
            .with_config(PlannerConfig::new().with_restrict_projection(false))
            .build(&EntityType::new("Author"), &tree, QuerySet::all("Author"))
            .unwrap();

        assert!(query.projection().is_none());
        assert!(query.joins().contains("favourite_book"));
    }

    #[test]
    fn test_schema_supplied_query_is_shared() {
        let custom = Arc::new(QuerySet::all("Book").where_eq("title", "Dune"));
        let tree = author_node().with_child(
            FieldNode::many_related("favourite_book", "favourite_book", "Book")
                .with_custom_query(Arc::clone(&custom))
                .with_child(FieldNode::field("title")),
        );

        let prefetches = prefetches(&tree, &QuerySet::all("Author"));

        assert_eq!(prefetches.len(), 1);
        assert!(Arc::ptr_eq(prefetches[0].queryset().unwrap(), &custom));
        assert!(custom.projection().is_none());
    }

    #[test]
    fn test_hoisted_prefetches_at_same_path_fail() {
        let registry = fixtures::registry();
        let sister = |name: &str| {
            FieldNode::related(name, "twin_sister", "TwinSisterAuthor").with_child(
                FieldNode::many_related("publisher_friends", "publisher_friends", "Publisher"),
            )
        };
        let tree = author_node()
            .with_child(sister("twin_sister"))
            .with_child(sister("sister"));

        let err = QueryPlanBuilder::new(&registry)
            .prefetch_objects(&tree, &QuerySet::all("Author"), "")
            .unwrap_err();

        assert!(matches!(
            err,
            AutoQueryError::AmbiguousPrefetch { ref path } if path == "twin_sister__publisher_friends"
        ));
    }
}
