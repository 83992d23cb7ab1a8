//! # Storage Backends
//!
//! `PersistencePort` implementations and the bootstrap step that rebuilds a
//! graph from one of them.

pub mod memory;
pub mod redb_port;

pub use memory::MemoryPort;
pub use redb_port::RedbPort;

use crate::port::PersistencePort;
use crate::{Graph, HelixError, Node, NodeId};

/// Rebuild a graph from a port without firing hooks.
///
/// `ids` fixes the node order; `build` turns a stored payload back into a
/// node (payloads that carry tags or layers restore them here). Stored
/// metadata replaces the fresh metadata `build` produced. Edges whose other
/// endpoint was not stored are skipped. The port is not attached.
pub fn hydrate<P, F>(
    port: &dyn PersistencePort<P>,
    ids: &[NodeId],
    build: F,
) -> Result<Graph<P>, HelixError>
where
    F: Fn(NodeId, P) -> Node<P>,
{
    let mut graph = Graph::new();

    for id in ids {
        if let Some(payload) = port.load_node(id)? {
            let mut node = build(id.clone(), payload);
            if let Some(metadata) = port.load_metadata(id)? {
                node.metadata = metadata;
            }
            graph.import_node(node);
        }
    }

    for id in ids {
        if !graph.contains(id) {
            continue;
        }
        for (neighbor, weight) in port.load_edges(id)?.iter() {
            if graph.contains(neighbor) {
                graph.import_edge(id, neighbor, weight)?;
            } else {
                tracing::warn!(node = %id, neighbor = %neighbor, "skipping stored edge to missing node");
            }
        }
    }

    tracing::info!(nodes = graph.len(), "hydrated graph from storage");
    Ok(graph)
}
