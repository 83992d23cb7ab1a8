//! # Node Metadata
//!
//! Lifecycle timestamps and derived metrics carried by every node.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata about a node's lifecycle.
///
/// `importance` and `permanence` are derived values. The engine never
/// computes them on its own; the metric hook does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// When the node value was constructed.
    pub created: DateTime<Utc>,
    /// Last execution or explicit touch.
    pub updated: DateTime<Utc>,
    /// Degree-based importance, `>= 0`.
    pub importance: f64,
    /// Age-based permanence in seconds.
    pub permanence: f64,
    /// Stringified execution results, oldest first. Append-only.
    pub perception_history: Vec<String>,
}

impl NodeMetadata {
    /// Fresh metadata stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            updated: now,
            importance: 0.0,
            permanence: 0.0,
            perception_history: Vec::new(),
        }
    }

    /// Set `updated` to now.
    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }

    /// Append an execution result.
    pub fn record_perception(&mut self, perception: impl Into<String>) {
        self.perception_history.push(perception.into());
    }

    /// Seconds elapsed between `created` and `now`, clamped at zero.
    #[must_use]
    pub fn age_seconds(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created)
            .to_std()
            .map(|age| age.as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl Default for NodeMetadata {
    fn default() -> Self {
        Self::new()
    }
}
