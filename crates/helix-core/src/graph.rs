//! # Graph Engine
//!
//! The HyperHelix graph container.
//!
//! `Graph<P>` owns the node mapping, keeps it in insertion order, runs the
//! registered hooks on insert, mirrors mutations to an optional persistence
//! port, and answers traversal and shortest-path queries.
//!
//! Every operation is synchronous and runs hooks and port calls inline.
//! There is no internal locking: callers sharing a graph across threads wrap
//! it themselves.

use crate::edge::{Edge, EdgeMap};
use crate::hooks::{Hook, HookEvent};
use crate::metadata::NodeMetadata;
use crate::node::Node;
use crate::port::PersistencePort;
use crate::{EdgeWeight, HelixError, NodeId};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

// =============================================================================
// GRAPH IMPLEMENTATION
// =============================================================================

/// The main Graph structure.
pub struct Graph<P> {
    /// Node storage: NodeId -> Node
    nodes: BTreeMap<NodeId, Node<P>>,

    /// Insertion order of `nodes`. An overwrite keeps the original slot.
    order: Vec<NodeId>,

    /// Fired by `add_node`, in registration order.
    insert_hooks: Vec<Hook<P>>,

    /// Fired by `fire_update_hooks`, in registration order.
    update_hooks: Vec<Hook<P>>,

    /// Optional mirror for mutations.
    port: Option<Box<dyn PersistencePort<P>>>,
}

impl<P> Default for Graph<P> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            order: Vec::new(),
            insert_hooks: Vec::new(),
            update_hooks: Vec::new(),
            port: None,
        }
    }
}

impl<P> fmt::Debug for Graph<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("node_count", &self.nodes.len())
            .field("insert_hooks", &self.insert_hooks)
            .field("update_hooks", &self.update_hooks)
            .field("has_port", &self.port.is_some())
            .finish_non_exhaustive()
    }
}

impl<P> Graph<P> {
    /// Create a new empty graph with no hooks and no port.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph with the given hook lists.
    #[must_use]
    pub fn with_hooks(insert_hooks: Vec<Hook<P>>, update_hooks: Vec<Hook<P>>) -> Self {
        Self {
            insert_hooks,
            update_hooks,
            ..Self::default()
        }
    }

    /// Create a graph wired with metrics, weave and prune insert hooks.
    #[must_use]
    pub fn with_default_hooks() -> Self
    where
        P: 'static,
    {
        Self::with_hooks(crate::hooks::default_insert_hooks(), Vec::new())
    }

    /// Attach a persistence port, builder style.
    #[must_use]
    pub fn with_port(mut self, port: impl PersistencePort<P> + 'static) -> Self {
        self.port = Some(Box::new(port));
        self
    }

    /// Attach (or replace) the persistence port.
    pub fn attach_port(&mut self, port: Box<dyn PersistencePort<P>>) {
        self.port = Some(port);
    }

    /// Detach the persistence port, returning it.
    pub fn detach_port(&mut self) -> Option<Box<dyn PersistencePort<P>>> {
        self.port.take()
    }

    #[must_use]
    pub fn has_port(&self) -> bool {
        self.port.is_some()
    }

    /// Append an insert hook.
    pub fn register_insert_hook(&mut self, hook: Hook<P>) {
        self.insert_hooks.push(hook);
    }

    /// Append an update hook.
    pub fn register_update_hook(&mut self, hook: Hook<P>) {
        self.update_hooks.push(hook);
    }

    /// Names of the insert hooks, in invocation order.
    pub fn insert_hook_names(&self) -> Vec<&str> {
        self.insert_hooks.iter().map(Hook::name).collect()
    }

    /// Names of the update hooks, in invocation order.
    pub fn update_hook_names(&self) -> Vec<&str> {
        self.update_hooks.iter().map(Hook::name).collect()
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Node<P>> {
        self.nodes.get(id)
    }

    /// Mutable access. Edits to `edges` bypass the symmetric bookkeeping.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node<P>> {
        self.nodes.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node<P>> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// All node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.order.iter()
    }

    /// Every undirected edge once, with `a <= b`, in node insertion order.
    ///
    /// An entry held by only one endpoint (left behind by an overwriting
    /// `add_node`) is still reported, with the weight that endpoint holds.
    pub fn edges(&self) -> Vec<Edge> {
        let mut seen: BTreeSet<(&NodeId, &NodeId)> = BTreeSet::new();
        let mut edges = Vec::new();
        for node in self.nodes() {
            for (neighbor, weight) in node.edges.iter() {
                let pair = if node.id <= *neighbor {
                    (&node.id, neighbor)
                } else {
                    (neighbor, &node.id)
                };
                if seen.insert(pair) {
                    edges.push(Edge::new(pair.0, pair.1, weight));
                }
            }
        }
        edges
    }

    /// Number of undirected edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges().len()
    }

    /// Edges incident to one node, in that node's edge order.
    pub fn node_edges(&self, id: &str) -> Result<Vec<Edge>, HelixError> {
        let node = self.require(id)?;
        Ok(node
            .edges
            .iter()
            .map(|(neighbor, weight)| Edge::new(&node.id, neighbor, weight))
            .collect())
    }

    /// Weight of the edge between `a` and `b` as seen from `a`.
    #[must_use]
    pub fn edge_weight(&self, a: &str, b: &str) -> Option<EdgeWeight> {
        self.nodes.get(a)?.edges.get(b)
    }

    fn require(&self, id: &str) -> Result<&Node<P>, HelixError> {
        self.nodes.get(id).ok_or_else(|| {
            tracing::error!(node = id, "node not found");
            HelixError::node_not_found(id)
        })
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Insert a node, overwriting any node with the same id.
    ///
    /// The node is persisted first when a port is attached; a port error is
    /// returned and no hook runs. Then every insert hook runs in order. A
    /// failing or panicking hook is logged and the remaining hooks still run;
    /// hook errors never reach the caller. Finally the metadata the hooks
    /// left behind is handed to the port.
    pub fn add_node(&mut self, node: Node<P>) -> Result<(), HelixError> {
        let id = node.id.clone();
        tracing::debug!(node = %id, "adding node");

        if self.nodes.insert(id.clone(), node).is_some() {
            tracing::debug!(node = %id, "overwrote existing node");
        } else {
            self.order.push(id.clone());
        }

        if let (Some(port), Some(node)) = (self.port.as_mut(), self.nodes.get(&id)) {
            port.save_node(&id, &node.payload)?;
        }

        let hooks = self.insert_hooks.clone();
        self.fire_hooks(&hooks, HookEvent::Insert, &id);
        self.persist_metadata(&id)
    }

    /// Hand a node's current metadata to the port. No-op without a port or
    /// when the node is gone.
    pub fn persist_metadata(&mut self, id: &str) -> Result<(), HelixError> {
        if let (Some(port), Some(node)) = (self.port.as_mut(), self.nodes.get(id)) {
            port.save_metadata(&node.id, &node.metadata)?;
        }
        Ok(())
    }

    /// Connect `a` and `b` with reciprocal entries.
    ///
    /// Both endpoints are checked (`a` first) and the weight validated before
    /// anything is written.
    pub fn add_edge(&mut self, a: &str, b: &str, weight: EdgeWeight) -> Result<(), HelixError> {
        tracing::debug!(a, b, %weight, "adding edge");
        self.require(a)?;
        self.require(b)?;
        if !weight.is_valid() {
            tracing::error!(a, b, %weight, "rejected edge weight");
            return Err(HelixError::InvalidWeight(weight.value()));
        }

        let (a_id, b_id) = (NodeId::from(a), NodeId::from(b));
        if let Some(node) = self.nodes.get_mut(a) {
            node.edges.insert(b_id.clone(), weight);
        }
        if let Some(node) = self.nodes.get_mut(b) {
            node.edges.insert(a_id.clone(), weight);
        }

        if let Some(port) = self.port.as_mut() {
            port.save_edge(&a_id, &b_id, weight)?;
        }
        Ok(())
    }

    /// Remove both reciprocal entries between `a` and `b`.
    ///
    /// Removing an edge that does not exist is a no-op.
    pub fn remove_edge(&mut self, a: &str, b: &str) -> Result<(), HelixError> {
        tracing::debug!(a, b, "removing edge");
        self.require(a)?;
        self.require(b)?;

        if let Some(node) = self.nodes.get_mut(a) {
            node.edges.remove(b);
        }
        if let Some(node) = self.nodes.get_mut(b) {
            node.edges.remove(a);
        }

        if let Some(port) = self.port.as_mut() {
            port.remove_edge(&NodeId::from(a), &NodeId::from(b))?;
        }
        Ok(())
    }

    /// Delete a node and strip every reference to it held by other nodes.
    ///
    /// The scan is O(N): there is no reverse-adjacency index.
    pub fn remove_node(&mut self, id: &str) -> Result<Node<P>, HelixError> {
        tracing::debug!(node = id, "removing node");
        self.require(id)?;

        let removed = self
            .nodes
            .remove(id)
            .ok_or_else(|| HelixError::node_not_found(id))?;
        self.order.retain(|existing| existing.as_str() != id);
        for other in self.nodes.values_mut() {
            other.edges.remove(id);
        }

        if let Some(port) = self.port.as_mut() {
            port.remove_node(&removed.id)?;
        }
        Ok(removed)
    }

    /// Insert a node without firing hooks or touching the port.
    ///
    /// Used when rebuilding a graph from a snapshot or a storage backend.
    pub fn import_node(&mut self, node: Node<P>) {
        let id = node.id.clone();
        if self.nodes.insert(id.clone(), node).is_none() {
            self.order.push(id);
        }
    }

    /// Connect two imported nodes without touching the port.
    pub fn import_edge(&mut self, a: &str, b: &str, weight: EdgeWeight) -> Result<(), HelixError> {
        self.require(a)?;
        self.require(b)?;
        if !weight.is_valid() {
            return Err(HelixError::InvalidWeight(weight.value()));
        }
        if let Some(node) = self.nodes.get_mut(a) {
            node.edges.insert(NodeId::from(b), weight);
        }
        if let Some(node) = self.nodes.get_mut(b) {
            node.edges.insert(NodeId::from(a), weight);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Hook-backed behaviours
    // -------------------------------------------------------------------------

    /// Connect `id` to every node sharing one of its tags, with the default
    /// weight. Skips itself and nodes it is already connected to. Returns the
    /// number of edges created.
    pub fn weave_by_tag(&mut self, id: &str) -> Result<usize, HelixError> {
        let tags = self.require(id)?.tags.clone();
        let mut woven = 0usize;

        for tag in &tags {
            let candidates: Vec<NodeId> = self
                .find_nodes_by_tag(tag)
                .into_iter()
                .map(|node| node.id.clone())
                .collect();

            for other in candidates {
                if other.as_str() == id {
                    continue;
                }
                let connected = self
                    .nodes
                    .get(id)
                    .is_some_and(|node| node.edges.contains(&other));
                if connected {
                    continue;
                }
                self.add_edge(id, &other, EdgeWeight::DEFAULT)?;
                woven = woven.saturating_add(1);
            }
        }

        Ok(woven)
    }

    /// Drop every edge entry whose key is not a present node. Idempotent.
    /// Returns the number of entries removed.
    pub fn prune_dangling_edges(&mut self) -> usize {
        let present: BTreeSet<NodeId> = self.nodes.keys().cloned().collect();
        let mut pruned = 0usize;
        for node in self.nodes.values_mut() {
            let before = node.edges.len();
            node.edges.retain(|neighbor, _| present.contains(neighbor));
            pruned = pruned.saturating_add(before - node.edges.len());
        }
        pruned
    }

    /// Fire the update hooks for `id`. Called by the execution collaborator;
    /// the graph never fires them on its own. Returns how many hooks failed.
    pub fn fire_update_hooks(&mut self, id: &str) -> usize {
        let hooks = self.update_hooks.clone();
        self.fire_hooks(&hooks, HookEvent::Update, &NodeId::from(id))
    }

    /// Run each hook in isolation. The list is a snapshot taken by the
    /// caller, so hooks registered mid-fire wait for the next event.
    ///
    /// A panicking hook counts as a failure; whatever it changed before
    /// panicking stays.
    fn fire_hooks(&mut self, hooks: &[Hook<P>], event: HookEvent, id: &NodeId) -> usize {
        let mut failures = 0usize;
        for hook in hooks {
            let reason = match panic::catch_unwind(AssertUnwindSafe(|| hook.call(self, id))) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
            };
            failures = failures.saturating_add(1);
            let failure = HelixError::HookFailed {
                hook: hook.name().to_string(),
                node: id.clone(),
                reason,
            };
            tracing::warn!(%event, error = %failure, "hook failed, continuing");
        }
        failures
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// All nodes whose tags contain `tag`, in insertion order.
    pub fn find_nodes_by_tag(&self, tag: &str) -> Vec<&Node<P>> {
        tracing::debug!(tag, "searching nodes by tag");
        self.nodes().filter(|node| node.has_tag(tag)).collect()
    }

    /// Breadth-first, visit-once walk of everything within `depth` hops.
    ///
    /// The walk is lazy: nothing is visited until the iterator is pulled, and
    /// dropping it early has no side effects.
    pub fn spiral_walk(&self, start: &str, depth: usize) -> Result<SpiralWalk<'_, P>, HelixError> {
        tracing::debug!(start, depth, "spiral walk");
        let start = self.require(start)?.id.clone();
        Ok(SpiralWalk::new(self, start, depth))
    }

    /// Lowest total weight path from `start` to `end`, both inclusive.
    ///
    /// Returns an empty path when `end` is unreachable. Dijkstra over
    /// non-negative weights; stops as soon as `end` is popped.
    pub fn shortest_path(&self, start: &str, end: &str) -> Result<Vec<NodeId>, HelixError> {
        tracing::debug!(start, end, "shortest path");
        let start = self.require(start)?.id.clone();
        let end = self.require(end)?.id.clone();

        if start == end {
            return Ok(vec![start]);
        }

        let mut distances: BTreeMap<NodeId, f64> = BTreeMap::new();
        let mut previous: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        let mut frontier = BinaryHeap::new();

        distances.insert(start.clone(), 0.0);
        frontier.push(Frontier {
            cost: 0.0,
            id: start.clone(),
        });

        while let Some(Frontier { cost, id }) = frontier.pop() {
            if id == end {
                break;
            }
            // Stale heap entry
            if distances.get(&id).is_some_and(|&best| cost > best) {
                continue;
            }
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };

            for (neighbor, weight) in node.edges.iter() {
                let candidate = cost + weight.value();
                if distances.get(neighbor).is_none_or(|&best| candidate < best) {
                    distances.insert(neighbor.clone(), candidate);
                    previous.insert(neighbor.clone(), id.clone());
                    frontier.push(Frontier {
                        cost: candidate,
                        id: neighbor.clone(),
                    });
                }
            }
        }

        if !previous.contains_key(&end) {
            return Ok(Vec::new());
        }

        let mut path = vec![end.clone()];
        let mut current = end;
        while current != start {
            current = match previous.get(&current) {
                Some(p) => p.clone(),
                None => return Ok(Vec::new()),
            };
            path.push(current.clone());
        }
        path.reverse();

        Ok(path)
    }

    /// Total weight along consecutive ids, or `None` if a hop has no edge.
    #[must_use]
    pub fn path_weight(&self, path: &[NodeId]) -> Option<f64> {
        path.windows(2).try_fold(0.0, |total, hop| {
            self.edge_weight(&hop[0], &hop[1])
                .map(|w| total + w.value())
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

// =============================================================================
// SPIRAL WALK
// =============================================================================

/// Lazy breadth-first traversal returned by `Graph::spiral_walk`.
///
/// Owns its queue and visited set. Every neighbor is enqueued; duplicates are
/// discarded when popped.
pub struct SpiralWalk<'g, P> {
    graph: &'g Graph<P>,
    queue: VecDeque<(NodeId, usize)>,
    visited: BTreeSet<NodeId>,
    depth: usize,
}

impl<'g, P> SpiralWalk<'g, P> {
    fn new(graph: &'g Graph<P>, start: NodeId, depth: usize) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back((start, 0));
        Self {
            graph,
            queue,
            visited: BTreeSet::new(),
            depth,
        }
    }
}

impl<'g, P> Iterator for SpiralWalk<'g, P> {
    type Item = &'g Node<P>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((id, level)) = self.queue.pop_front() {
            if level > self.depth || self.visited.contains(&id) {
                continue;
            }
            // Dangling entry not yet pruned
            let Some(node) = self.graph.nodes.get(&id) else {
                continue;
            };
            self.visited.insert(id);
            for neighbor in node.edges.neighbors() {
                self.queue
                    .push_back((neighbor.clone(), level.saturating_add(1)));
            }
            return Some(node);
        }
        None
    }
}

impl<P> fmt::Debug for SpiralWalk<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpiralWalk")
            .field("queued", &self.queue.len())
            .field("visited", &self.visited.len())
            .field("depth", &self.depth)
            .finish()
    }
}

// =============================================================================
// DIJKSTRA FRONTIER
// =============================================================================

/// Heap entry ordered so `BinaryHeap` pops the lowest cost first.
/// Equal costs fall back to id order.
#[derive(Debug)]
struct Frontier {
    cost: f64,
    id: NodeId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.id.cmp(&self.id))
    }
}

// =============================================================================
// SERIALIZATION SUPPORT
// =============================================================================

/// Serializable form of one node. Executors are not carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableNode<P> {
    pub id: NodeId,
    pub payload: P,
    pub tags: Vec<String>,
    pub layer: i64,
    pub strand: String,
    pub edges: EdgeMap,
    pub metadata: NodeMetadata,
}

/// Serializable representation of the graph for snapshots.
///
/// Nodes are listed in insertion order. Hooks and ports are not part of a
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableGraph<P> {
    pub nodes: Vec<SerializableNode<P>>,
}

impl<P: Clone> From<&Graph<P>> for SerializableGraph<P> {
    fn from(graph: &Graph<P>) -> Self {
        Self {
            nodes: graph
                .nodes()
                .map(|node| SerializableNode {
                    id: node.id.clone(),
                    payload: node.payload.clone(),
                    tags: node.tags.clone(),
                    layer: node.layer,
                    strand: node.strand.clone(),
                    edges: node.edges.clone(),
                    metadata: node.metadata.clone(),
                })
                .collect(),
        }
    }
}

impl<P> From<SerializableGraph<P>> for Graph<P> {
    fn from(sg: SerializableGraph<P>) -> Self {
        let mut graph = Graph::new();
        for sn in sg.nodes {
            let mut node = Node::new(sn.id, sn.payload)
                .with_tags(sn.tags)
                .with_layer(sn.layer)
                .with_strand(sn.strand);
            node.edges = sn.edges;
            node.metadata = sn.metadata;
            graph.import_node(node);
        }
        graph
    }
}

// =============================================================================
// TESTS
// =============================================================================
