//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the HyperHelix engine:
//! - Node identifiers (`NodeId`)
//! - Edge weights (`EdgeWeight`)
//! - Error types (`HelixError`)

use crate::primitives::DEFAULT_EDGE_WEIGHT;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use thiserror::Error;

// =============================================================================
// NODE IDENTIFIER
// =============================================================================

/// Unique identifier of a node inside a graph.
///
/// Identifiers are caller-chosen strings and are immutable once a node exists.
/// `NodeId` borrows as `str`, so every map keyed by it can be queried with a
/// plain string slice.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for NodeId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// =============================================================================
// EDGE WEIGHT
// =============================================================================

/// Weight of an undirected edge.
///
/// Weights are traversal costs for `shortest_path`: lower is closer.
/// A weight is valid when it is finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeWeight(f64);

impl EdgeWeight {
    /// The weight used when a caller does not pick one.
    pub const DEFAULT: Self = Self(DEFAULT_EDGE_WEIGHT);

    /// Create a new edge weight. Validity is checked when the edge is added.
    #[must_use]
    pub const fn new(weight: f64) -> Self {
        Self(weight)
    }

    /// Get the raw weight value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Finite and `>= 0`.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }
}

impl Default for EdgeWeight {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<f64> for EdgeWeight {
    fn from(weight: f64) -> Self {
        Self(weight)
    }
}

impl fmt::Display for EdgeWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the HyperHelix engine.
///
/// - `NodeNotFound` is always propagated to the caller
/// - `HookFailed` is produced internally, logged, and never returned by `add_node`
/// - Storage errors come back from the persistence port unchanged
#[derive(Debug, Error)]
pub enum HelixError {
    /// An operand node id is not present in the graph.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// An edge weight was negative, NaN or infinite.
    #[error("Invalid edge weight: {0} (weights must be finite and >= 0)")]
    InvalidWeight(f64),

    /// A hook callback returned an error.
    #[error("Hook '{hook}' failed for node {node}: {reason}")]
    HookFailed {
        hook: String,
        node: NodeId,
        reason: String,
    },

    /// A node executor returned an error.
    #[error("Execution failed for node {node}: {reason}")]
    Execution { node: NodeId, reason: String },

    /// A persistence backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl HelixError {
    /// Shorthand for a missing node.
    #[must_use]
    pub fn node_not_found(id: impl Into<NodeId>) -> Self {
        Self::NodeNotFound(id.into())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn node_id_borrows_as_str() {
        let mut map = BTreeMap::new();
        map.insert(NodeId::from("alpha"), 1);
        assert_eq!(map.get("alpha"), Some(&1));
        assert_eq!(NodeId::from("alpha"), "alpha");
    }

    #[test]
    fn edge_weight_validity() {
        assert!(EdgeWeight::new(0.0).is_valid());
        assert!(EdgeWeight::new(2.5).is_valid());
        assert!(!EdgeWeight::new(-1.0).is_valid());
        assert!(!EdgeWeight::new(f64::NAN).is_valid());
        assert!(!EdgeWeight::new(f64::INFINITY).is_valid());
    }

    #[test]
    fn edge_weight_default_is_one() {
        assert_eq!(EdgeWeight::default().value(), 1.0);
    }

    #[test]
    fn node_not_found_names_the_id() {
        let err = HelixError::node_not_found("ghost");
        assert_eq!(err.to_string(), "Node not found: ghost");
    }
}
