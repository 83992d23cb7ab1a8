//! # Hook System
//!
//! Hooks are named callbacks of `(graph, node_id)`. A graph keeps two ordered
//! lists of them: insert hooks, fired by `Graph::add_node`, and update hooks,
//! fired by the execution collaborator through `Graph::fire_update_hooks`.
//!
//! Nothing is registered implicitly. The default behaviours below are plain
//! constructors that the application wires in:
//!
//! 1. `metric_update` recomputes importance and permanence
//! 2. `weave_by_tag` connects the node to every node sharing a tag
//! 3. `prune_dangling` drops edges pointing at missing nodes
//!
//! `default_insert_hooks` returns them in that order.

use crate::analytics::{ImportanceFn, PermanenceFn, compute_importance, compute_permanence};
use crate::graph::Graph;
use crate::node::Node;
use crate::{HelixError, NodeId};
use std::fmt;
use std::sync::Arc;

/// Callback signature shared by insert and update hooks.
pub type HookFn<P> = dyn Fn(&mut Graph<P>, &NodeId) -> Result<(), HelixError> + Send + Sync;

/// Which hook list an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    Insert,
    Update,
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => f.write_str("insert"),
            Self::Update => f.write_str("update"),
        }
    }
}

// =============================================================================
// HOOK
// =============================================================================

/// A named, cheaply cloneable callback.
pub struct Hook<P> {
    name: String,
    callback: Arc<HookFn<P>>,
}

impl<P> Hook<P> {
    /// Wrap a callback under a name used in logs.
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        P: 'static,
        F: Fn(&mut Graph<P>, &NodeId) -> Result<(), HelixError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callback: Arc::new(callback),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the callback.
    pub fn call(&self, graph: &mut Graph<P>, node_id: &NodeId) -> Result<(), HelixError> {
        (self.callback)(graph, node_id)
    }
}

impl<P> Clone for Hook<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<P> fmt::Debug for Hook<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("name", &self.name).finish()
    }
}

// =============================================================================
// DEFAULT HOOKS
// =============================================================================

/// Metrics, weave, prune.
pub fn default_insert_hooks<P: 'static>() -> Vec<Hook<P>> {
    vec![metric_update(), weave_by_tag(), prune_dangling()]
}

/// Importance = degree, permanence = age in seconds.
pub fn metric_update<P: 'static>() -> Hook<P> {
    metric_update_with(compute_importance, compute_permanence)
}

/// Metric update with caller-supplied analytics functions.
pub fn metric_update_with<P: 'static>(
    importance: ImportanceFn<P>,
    permanence: PermanenceFn<P>,
) -> Hook<P> {
    Hook::new("metric_update", move |graph: &mut Graph<P>, id: &NodeId| {
        let (score, age) = {
            let node = graph
                .get(id)
                .ok_or_else(|| HelixError::NodeNotFound(id.clone()))?;
            let all_nodes: Vec<&Node<P>> = graph.nodes().collect();
            (importance(node, &all_nodes), permanence(node))
        };

        if let Some(node) = graph.get_mut(id) {
            node.metadata.importance = score;
            node.metadata.permanence = age;
        }
        Ok(())
    })
}

/// Connect the node to every other node sharing one of its tags.
pub fn weave_by_tag<P: 'static>() -> Hook<P> {
    Hook::new("weave_by_tag", |graph: &mut Graph<P>, id: &NodeId| {
        let woven = graph.weave_by_tag(id)?;
        if woven > 0 {
            tracing::debug!(node = %id, woven, "woven by tag");
        }
        Ok(())
    })
}

/// Drop every edge entry that points at a missing node.
pub fn prune_dangling<P: 'static>() -> Hook<P> {
    Hook::new("prune_dangling", |graph: &mut Graph<P>, _id: &NodeId| {
        let pruned = graph.prune_dangling_edges();
        if pruned > 0 {
            tracing::debug!(pruned, "pruned dangling edges");
        }
        Ok(())
    })
}

/// Run `task` on every event, ignoring which node triggered it.
pub fn bind_task<P, F>(name: impl Into<String>, task: F) -> Hook<P>
where
    P: 'static,
    F: Fn() + Send + Sync + 'static,
{
    Hook::new(name, move |_graph: &mut Graph<P>, _id: &NodeId| {
        task();
        Ok(())
    })
}

// =============================================================================
// TESTS
// =============================================================================
