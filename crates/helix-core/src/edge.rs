//! # Edges
//!
//! An edge is not an object of its own: it is a pair of reciprocal entries in
//! the adjacency maps of its two endpoints. `EdgeMap` is that adjacency map.
//! It keeps insertion order, which is the order traversals expand neighbors in.

use crate::{EdgeWeight, NodeId};
use serde::{Deserialize, Serialize};

// =============================================================================
// ADJACENCY MAP
// =============================================================================

/// Insertion-ordered mapping from neighbor id to edge weight.
///
/// Updating an existing neighbor keeps its position; removing and re-adding
/// moves it to the end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeMap {
    entries: Vec<(NodeId, EdgeWeight)>,
}

impl EdgeMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of neighbors (the node's degree).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Weight of the edge to `neighbor`, if any.
    #[must_use]
    pub fn get(&self, neighbor: &str) -> Option<EdgeWeight> {
        self.entries
            .iter()
            .find(|(id, _)| id.as_str() == neighbor)
            .map(|(_, w)| *w)
    }

    #[must_use]
    pub fn contains(&self, neighbor: &str) -> bool {
        self.entries.iter().any(|(id, _)| id.as_str() == neighbor)
    }

    /// Insert or update. Returns the previous weight.
    pub fn insert(&mut self, neighbor: NodeId, weight: EdgeWeight) -> Option<EdgeWeight> {
        match self.entries.iter_mut().find(|(id, _)| *id == neighbor) {
            Some((_, existing)) => Some(std::mem::replace(existing, weight)),
            None => {
                self.entries.push((neighbor, weight));
                None
            }
        }
    }

    /// Remove the edge to `neighbor`. Returns its weight if it existed.
    pub fn remove(&mut self, neighbor: &str) -> Option<EdgeWeight> {
        let pos = self
            .entries
            .iter()
            .position(|(id, _)| id.as_str() == neighbor)?;
        Some(self.entries.remove(pos).1)
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&NodeId, EdgeWeight) -> bool) {
        self.entries.retain(|(id, w)| keep(id, *w));
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, EdgeWeight)> {
        self.entries.iter().map(|(id, w)| (id, *w))
    }

    /// Neighbor ids in insertion order.
    pub fn neighbors(&self) -> impl Iterator<Item = &NodeId> {
        self.entries.iter().map(|(id, _)| id)
    }

    /// Sum of all weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w.value()).sum()
    }
}

impl FromIterator<(NodeId, EdgeWeight)> for EdgeMap {
    fn from_iter<I: IntoIterator<Item = (NodeId, EdgeWeight)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (id, weight) in iter {
            map.insert(id, weight);
        }
        map
    }
}

// =============================================================================
// EDGE VIEW
// =============================================================================

/// A materialized view of one undirected edge, as listed by
/// `Graph::edges` and exported by collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: EdgeWeight,
}

impl Edge {
    #[must_use]
    pub fn new(a: impl Into<NodeId>, b: impl Into<NodeId>, weight: EdgeWeight) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            weight,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
