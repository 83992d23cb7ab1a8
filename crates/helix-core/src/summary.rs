//! # Summary and Metrics
//!
//! Human-readable summaries and aggregate statistics over a graph.

use crate::Graph;
use crate::primitives::DEFAULT_SUMMARY_LIMIT;
use serde::{Deserialize, Serialize};

/// One-line text summary listing up to `limit` node ids in insertion order.
///
/// `"The graph contains 2 nodes. Sample nodes: a, b."`; the sample sentence is
/// omitted when the graph is empty or `limit` is zero.
pub fn graph_summary<P>(graph: &Graph<P>, limit: usize) -> String {
    let sample: Vec<&str> = graph.node_ids().take(limit).map(|id| id.as_str()).collect();
    let mut summary = format!("The graph contains {} nodes.", graph.len());
    if !sample.is_empty() {
        summary.push_str(&format!(" Sample nodes: {}.", sample.join(", ")));
    }
    summary
}

/// `graph_summary` with the default sample size.
pub fn default_summary<P>(graph: &Graph<P>) -> String {
    graph_summary(graph, DEFAULT_SUMMARY_LIMIT)
}

// =============================================================================
// GRAPH METRICS
// =============================================================================

/// Aggregate statistics of a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    /// Total number of nodes.
    pub node_count: usize,
    /// Undirected edges, each pair counted once.
    pub edge_count: usize,
    /// Nodes with no edges.
    pub isolated_count: usize,
    /// Mean number of edge entries per node (0 if empty).
    pub average_degree: f64,
    /// Sum of undirected edge weights.
    pub total_weight: f64,
}

impl GraphMetrics {
    /// Metrics of an empty graph.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            node_count: 0,
            edge_count: 0,
            isolated_count: 0,
            average_degree: 0.0,
            total_weight: 0.0,
        }
    }

    /// Compute metrics from a graph.
    #[must_use]
    pub fn from_graph<P>(graph: &Graph<P>) -> Self {
        let node_count = graph.len();
        if node_count == 0 {
            return Self::empty();
        }

        let edges = graph.edges();
        let degree_sum: usize = graph.nodes().map(|n| n.degree()).sum();
        let isolated_count = graph.nodes().filter(|n| n.edges.is_empty()).count();

        Self {
            node_count,
            edge_count: edges.len(),
            isolated_count,
            average_degree: degree_sum as f64 / node_count as f64,
            total_weight: edges.iter().map(|e| e.weight.value()).sum(),
        }
    }
}
