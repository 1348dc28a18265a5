//! Batched prefetch lookups

use serde::Serialize;
use std::sync::Arc;

use super::QuerySet;

/// A batched fetch of a relation path, optionally through its own query set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prefetch {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    queryset: Option<Arc<QuerySet>>,
}

impl Prefetch {
    /// Prefetch `path` through a customized query set
    pub fn new(path: impl Into<String>, queryset: QuerySet) -> Self {
        Self::shared(path, Arc::new(queryset))
    }

    /// Prefetch `path` through a query set that is shared with the caller
    pub fn shared(path: impl Into<String>, queryset: Arc<QuerySet>) -> Self {
        Self {
            path: path.into(),
            queryset: Some(queryset),
        }
    }

    /// Plain lookup of `path` with the store's default query
    pub fn lookup(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            queryset: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn queryset(&self) -> Option<&Arc<QuerySet>> {
        self.queryset.as_ref()
    }

    /// Returns true if the lookup carries its own query set
    pub fn is_customized(&self) -> bool {
        self.queryset.is_some()
    }
}

impl From<&str> for Prefetch {
    fn from(path: &str) -> Self {
        Self::lookup(path)
    }
}

impl From<String> for Prefetch {
    fn from(path: String) -> Self {
        Self::lookup(path)
    }
}
