//! Graph configuration.

use crate::error::{GraphError, Result};
use crate::traversal::TraversalType;
use serde::{Deserialize, Serialize};

/// How cycles are handled when relationships are added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Check every new relationship; refuse to store those that would close a
    /// cycle and remember the cycles they would have formed.
    #[default]
    RejectOnInsert,
    /// Store everything; find cycles when a view asks for them.
    StoreAndFlag,
}

/// Configuration for a [`RelationshipGraph`](crate::RelationshipGraph).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Cycle handling on insert.
    pub cycle_policy: CyclePolicy,

    /// Traversal order used when recomputing view membership.
    pub default_traversal: TraversalType,

    /// Log a warning when a rootless view forces a full-store scan.
    pub warn_on_full_scan: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            cycle_policy: CyclePolicy::RejectOnInsert,
            default_traversal: TraversalType::DepthFirst,
            warn_on_full_scan: true,
        }
    }
}

impl GraphConfig {
    /// Store cycles and report them lazily.
    pub fn permissive() -> Self {
        Self {
            cycle_policy: CyclePolicy::StoreAndFlag,
            ..Default::default()
        }
    }

    /// Set the cycle policy.
    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    /// Set the membership traversal order.
    pub fn with_default_traversal(mut self, traversal: TraversalType) -> Self {
        self.default_traversal = traversal;
        self
    }

    /// Enable or disable full-scan warnings.
    pub fn with_full_scan_warning(mut self, warn: bool) -> Self {
        self.warn_on_full_scan = warn;
        self
    }

    /// Parse a JSON configuration; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidConfig`] on malformed input.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GraphError::InvalidConfig {
            message: e.to_string(),
        })
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Serialization`] if encoding fails.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GraphError::serialization("Failed to serialize config", Some(e)))
    }
}
