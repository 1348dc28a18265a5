//! Query Set - Description of one query against an entity type
//!
//! A query set is never executed here. It records the projection, the
//! inline joins and the batched prefetches a store should apply, plus any
//! shaping the caller has already done.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::prefetch::Prefetch;
use super::types::{OrderDirection, QueryOperator, WhereCondition};
use crate::error::AutoQueryResult;
use crate::metadata::EntityType;

/// Query over all instances of an entity type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySet {
    entity: EntityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    only: Option<BTreeSet<String>>,
    select_related: BTreeSet<String>,
    prefetches: Vec<Prefetch>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    annotations: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    filters: Vec<WhereCondition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    order_by: Vec<(String, OrderDirection)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<i64>,
}

impl QuerySet {
    /// All instances of an entity type
    pub fn all(entity: impl Into<EntityType>) -> Self {
        Self {
            entity: entity.into(),
            only: None,
            select_related: BTreeSet::new(),
            prefetches: Vec::new(),
            annotations: BTreeMap::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Restrict the materialized attributes, replacing any previous restriction
    pub fn only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Join to-one relation paths inline
    pub fn select_related<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select_related.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Register a batched prefetch
    ///
    /// A customized prefetch already registered at the same path is kept
    /// as is. A plain lookup at the same path is replaced.
    pub fn prefetch_related(mut self, prefetch: impl Into<Prefetch>) -> Self {
        let prefetch = prefetch.into();
        match self
            .prefetches
            .iter_mut()
            .find(|existing| existing.path() == prefetch.path())
        {
            Some(existing) if existing.is_customized() => {
                tracing::trace!("Keeping customized prefetch at {}", existing.path());
            }
            Some(existing) => *existing = prefetch,
            None => self.prefetches.push(prefetch),
        }
        self
    }

    pub fn annotate(mut self, alias: impl Into<String>, expression: impl Into<String>) -> Self {
        self.annotations.insert(alias.into(), expression.into());
        self
    }

    pub fn filter(mut self, column: &str, operator: QueryOperator, value: Option<Value>) -> Self {
        self.filters.push(WhereCondition {
            column: column.to_string(),
            operator,
            value,
        });
        self
    }

    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(column, QueryOperator::Equal, Some(value.into()))
    }

    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.order_by.push((column.to_string(), direction));
        self
    }

    pub fn limit(mut self, count: i64) -> Self {
        self.limit = Some(count);
        self
    }

    pub fn entity(&self) -> &EntityType {
        &self.entity
    }

    /// The restricted projection, or None when every attribute is loaded
    pub fn projection(&self) -> Option<&BTreeSet<String>> {
        self.only.as_ref()
    }

    pub fn joins(&self) -> &BTreeSet<String> {
        &self.select_related
    }

    pub fn prefetches(&self) -> &[Prefetch] {
        &self.prefetches
    }

    pub fn find_prefetch(&self, path: &str) -> Option<&Prefetch> {
        self.prefetches.iter().find(|prefetch| prefetch.path() == path)
    }

    /// The caller's customized query set for exactly `path`, if any
    pub fn customized_prefetch(&self, path: &str) -> Option<&Arc<QuerySet>> {
        self.find_prefetch(path).and_then(Prefetch::queryset)
    }

    pub fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    pub fn filters(&self) -> &[WhereCondition] {
        &self.filters
    }

    pub fn ordering(&self) -> &[(String, OrderDirection)] {
        &self.order_by
    }

    pub fn limit_count(&self) -> Option<i64> {
        self.limit
    }

    /// Render the query set, nested prefetches included, as JSON
    pub fn explain(&self) -> AutoQueryResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}
