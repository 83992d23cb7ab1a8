//! # In-Memory Persistence Port
//!
//! A `PersistencePort` that keeps everything in process memory.
//!
//! The port is a cheap handle: clones share the same state, so a caller can
//! hand one clone to a graph and inspect what was persisted through another.

use crate::edge::EdgeMap;
use crate::metadata::NodeMetadata;
use crate::port::PersistencePort;
use crate::{EdgeWeight, HelixError, NodeId};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
struct MemoryState<P> {
    nodes: BTreeMap<NodeId, P>,
    order: Vec<NodeId>,
    metadata: BTreeMap<NodeId, NodeMetadata>,
    edges: BTreeMap<NodeId, EdgeMap>,
}

impl<P> Default for MemoryState<P> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            order: Vec::new(),
            metadata: BTreeMap::new(),
            edges: BTreeMap::new(),
        }
    }
}

/// Shared in-memory store.
#[derive(Debug)]
pub struct MemoryPort<P> {
    state: Arc<RwLock<MemoryState<P>>>,
}

impl<P> Clone for MemoryPort<P> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<P> Default for MemoryPort<P> {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
        }
    }
}

impl<P> MemoryPort<P> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState<P>>, HelixError> {
        self.state
            .read()
            .map_err(|_| HelixError::Storage("memory port lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState<P>>, HelixError> {
        self.state
            .write()
            .map_err(|_| HelixError::Storage("memory port lock poisoned".to_string()))
    }

    /// Stored node ids in first-insertion order.
    pub fn node_ids(&self) -> Result<Vec<NodeId>, HelixError> {
        Ok(self.read()?.order.clone())
    }

    pub fn node_count(&self) -> Result<usize, HelixError> {
        Ok(self.read()?.nodes.len())
    }
}

impl<P> PersistencePort<P> for MemoryPort<P>
where
    P: Clone + Send + Sync,
{
    fn save_node(&mut self, id: &NodeId, payload: &P) -> Result<(), HelixError> {
        let mut state = self.write()?;
        if state.nodes.insert(id.clone(), payload.clone()).is_none() {
            state.order.push(id.clone());
        }
        Ok(())
    }

    fn load_node(&self, id: &NodeId) -> Result<Option<P>, HelixError> {
        Ok(self.read()?.nodes.get(id).cloned())
    }

    fn save_edge(&mut self, a: &NodeId, b: &NodeId, weight: EdgeWeight) -> Result<(), HelixError> {
        let mut state = self.write()?;
        state
            .edges
            .entry(a.clone())
            .or_default()
            .insert(b.clone(), weight);
        state
            .edges
            .entry(b.clone())
            .or_default()
            .insert(a.clone(), weight);
        Ok(())
    }

    fn load_edges(&self, id: &NodeId) -> Result<EdgeMap, HelixError> {
        Ok(self.read()?.edges.get(id).cloned().unwrap_or_default())
    }

    fn save_metadata(&mut self, id: &NodeId, metadata: &NodeMetadata) -> Result<(), HelixError> {
        self.write()?.metadata.insert(id.clone(), metadata.clone());
        Ok(())
    }

    fn load_metadata(&self, id: &NodeId) -> Result<Option<NodeMetadata>, HelixError> {
        Ok(self.read()?.metadata.get(id).cloned())
    }

    fn remove_edge(&mut self, a: &NodeId, b: &NodeId) -> Result<(), HelixError> {
        let mut state = self.write()?;
        if let Some(map) = state.edges.get_mut(a) {
            map.remove(b);
        }
        if let Some(map) = state.edges.get_mut(b) {
            map.remove(a);
        }
        Ok(())
    }

    fn remove_node(&mut self, id: &NodeId) -> Result<(), HelixError> {
        let mut state = self.write()?;
        state.nodes.remove(id);
        state.order.retain(|existing| existing != id);
        state.metadata.remove(id);
        state.edges.remove(id);
        for map in state.edges.values_mut() {
            map.remove(id);
        }
        Ok(())
    }
}
