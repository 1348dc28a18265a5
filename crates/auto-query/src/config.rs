//! Planner configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::AutoQueryResult;

/// Default separator between relation segments in query lookups
pub const LOOKUP_SEP: &str = "__";

/// Configuration for field tree and query plan building
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Separator used to join relation segments into lookup paths
    pub lookup_separator: String,
    /// Restrict the projection to the attributes required by the schema
    pub restrict_projection: bool,
    /// Maximum schema nesting depth accepted by the tree builder
    pub max_depth: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            lookup_separator: LOOKUP_SEP.to_string(),
            restrict_projection: true,
            max_depth: 32,
        }
    }
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lookup_separator(mut self, separator: impl Into<String>) -> Self {
        self.lookup_separator = separator.into();
        self
    }

    pub fn with_restrict_projection(mut self, restrict: bool) -> Self {
        self.restrict_projection = restrict;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse a configuration from YAML, filling omitted keys with defaults
    pub fn from_yaml_str(content: &str) -> AutoQueryResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> AutoQueryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> AutoQueryResult<()> {
        if self.lookup_separator.is_empty() {
            return Err(crate::error::AutoQueryError::Configuration(
                "Lookup separator cannot be empty".to_string(),
            ));
        }

        if self.max_depth == 0 {
            return Err(crate::error::AutoQueryError::Configuration(
                "Maximum depth must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Join a relation prefix and a segment with the lookup separator
    pub fn join_path(&self, prefix: &str, segment: &str) -> String {
        if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{}{}{}", prefix, self.lookup_separator, segment)
        }
    }
}
