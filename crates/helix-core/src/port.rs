//! # Persistence Port
//!
//! The save/load contract a graph mirrors its mutations to.
//!
//! The graph calls `save_node`, `save_metadata`, `save_edge`, `remove_edge`
//! and `remove_node` synchronously, right after the matching in-memory
//! mutation succeeds. It never calls the `load_*` methods; rehydration
//! belongs to whoever bootstraps the graph. Errors are returned to the
//! graph's caller unchanged.

use crate::edge::EdgeMap;
use crate::metadata::NodeMetadata;
use crate::{EdgeWeight, HelixError, NodeId};

/// Storage backend for node payloads and edges.
///
/// Implementations store an edge under both endpoints so that
/// `load_edges` sees it from either side.
pub trait PersistencePort<P>: Send + Sync {
    /// Store (or overwrite) the payload of a node.
    fn save_node(&mut self, id: &NodeId, payload: &P) -> Result<(), HelixError>;

    /// Fetch a stored payload.
    fn load_node(&self, id: &NodeId) -> Result<Option<P>, HelixError>;

    /// Store (or overwrite) an undirected edge.
    fn save_edge(&mut self, a: &NodeId, b: &NodeId, weight: EdgeWeight)
    -> Result<(), HelixError>;

    /// All stored edges of a node.
    fn load_edges(&self, id: &NodeId) -> Result<EdgeMap, HelixError>;

    /// Store a node's metadata. Called after insert hooks and after
    /// execution. Backends that only keep payloads keep the default no-op.
    fn save_metadata(&mut self, _id: &NodeId, _metadata: &NodeMetadata) -> Result<(), HelixError> {
        Ok(())
    }

    /// Fetch stored metadata, if the backend keeps any.
    fn load_metadata(&self, _id: &NodeId) -> Result<Option<NodeMetadata>, HelixError> {
        Ok(None)
    }

    /// Forget an edge. Backends that cannot delete keep the default no-op.
    fn remove_edge(&mut self, _a: &NodeId, _b: &NodeId) -> Result<(), HelixError> {
        Ok(())
    }

    /// Forget a node and its edges. Backends that cannot delete keep the
    /// default no-op.
    fn remove_node(&mut self, _id: &NodeId) -> Result<(), HelixError> {
        Ok(())
    }
}
