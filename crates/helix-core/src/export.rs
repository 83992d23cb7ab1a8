//! # Graph Export
//!
//! A flat, serde-friendly view of a whole graph for JSON dumps and API
//! responses. Unlike snapshots this is not meant to be read back.

use crate::edge::Edge;
use crate::{Graph, Node, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One exported node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedNode<P> {
    pub id: NodeId,
    pub payload: P,
    pub tags: Vec<String>,
    pub layer: i64,
    pub strand: String,
    pub importance: f64,
    pub permanence: f64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub degree: usize,
}

impl<P: Clone> From<&Node<P>> for ExportedNode<P> {
    fn from(node: &Node<P>) -> Self {
        Self {
            id: node.id.clone(),
            payload: node.payload.clone(),
            tags: node.tags.clone(),
            layer: node.layer,
            strand: node.strand.clone(),
            importance: node.metadata.importance,
            permanence: node.metadata.permanence,
            created: node.metadata.created,
            updated: node.metadata.updated,
            degree: node.degree(),
        }
    }
}

/// Nodes in insertion order, edges once each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport<P> {
    pub nodes: Vec<ExportedNode<P>>,
    pub edges: Vec<Edge>,
}

/// Export every node and every undirected edge.
pub fn export_graph<P: Clone>(graph: &Graph<P>) -> GraphExport<P> {
    GraphExport {
        nodes: graph.nodes().map(ExportedNode::from).collect(),
        edges: graph.edges(),
    }
}
