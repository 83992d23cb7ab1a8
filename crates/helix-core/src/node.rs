//! # Node
//!
//! The atomic graph entity: identity, opaque payload, tags, adjacency and
//! lifecycle metadata. A node is passive data unless it carries an executor.

use crate::edge::EdgeMap;
use crate::metadata::NodeMetadata;
use crate::primitives::DEFAULT_STRAND;
use crate::{HelixError, NodeId};
use std::fmt;
use std::sync::Arc;

/// Unary action over a node's payload.
///
/// `Ok(None)` is the "no value" result and is not recorded in the
/// perception history.
pub type ExecuteFn<P> = Arc<dyn Fn(&P) -> Result<Option<String>, HelixError> + Send + Sync>;

/// A node in the graph.
///
/// `edges` is mutated by the owning graph; callers that edit it directly
/// take over responsibility for the symmetric invariant.
pub struct Node<P> {
    /// Immutable identity; also the key in the owning graph.
    pub id: NodeId,
    /// Caller data. Never inspected by the engine.
    pub payload: P,
    /// Labels used by weaving. Duplicates allowed.
    pub tags: Vec<String>,
    /// Free-form classification, not interpreted.
    pub layer: i64,
    /// Free-form classification, not interpreted.
    pub strand: String,
    /// Neighbor id -> weight.
    pub edges: EdgeMap,
    pub metadata: NodeMetadata,
    executor: Option<ExecuteFn<P>>,
}

impl<P> Node<P> {
    /// Create an untagged node on the default strand.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, payload: P) -> Self {
        Self {
            id: id.into(),
            payload,
            tags: Vec::new(),
            layer: 0,
            strand: DEFAULT_STRAND.to_string(),
            edges: EdgeMap::new(),
            metadata: NodeMetadata::new(),
            executor: None,
        }
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_layer(mut self, layer: i64) -> Self {
        self.layer = layer;
        self
    }

    #[must_use]
    pub fn with_strand(mut self, strand: impl Into<String>) -> Self {
        self.strand = strand.into();
        self
    }

    /// Attach an executor. Any `Display` result is stringified into the
    /// perception history.
    #[must_use]
    pub fn with_executor<F, R>(mut self, action: F) -> Self
    where
        P: 'static,
        F: Fn(&P) -> Result<Option<R>, HelixError> + Send + Sync + 'static,
        R: fmt::Display,
    {
        self.executor = Some(Arc::new(move |payload: &P| {
            action(payload).map(|result| result.map(|value| value.to_string()))
        }));
        self
    }

    #[must_use]
    pub fn has_executor(&self) -> bool {
        self.executor.is_some()
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Number of edges.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.edges.len()
    }

    /// Run the executor against the payload.
    ///
    /// `updated` is stamped before the executor runs, so it changes even when
    /// execution fails. A node without an executor returns `Ok(None)`.
    pub fn execute(&mut self) -> Result<Option<String>, HelixError> {
        tracing::debug!(node = %self.id, "executing node");
        self.metadata.touch();

        let Some(executor) = &self.executor else {
            return Ok(None);
        };

        match executor(&self.payload) {
            Ok(result) => {
                tracing::info!(node = %self.id, "node executed successfully");
                if let Some(perception) = &result {
                    self.metadata.record_perception(perception.clone());
                }
                Ok(result)
            }
            Err(e) => {
                tracing::error!(node = %self.id, error = %e, "execution failed");
                Err(e)
            }
        }
    }
}

impl<P: Clone> Clone for Node<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            payload: self.payload.clone(),
            tags: self.tags.clone(),
            layer: self.layer,
            strand: self.strand.clone(),
            edges: self.edges.clone(),
            metadata: self.metadata.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for Node<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("payload", &self.payload)
            .field("tags", &self.tags)
            .field("layer", &self.layer)
            .field("strand", &self.strand)
            .field("edges", &self.edges)
            .field("metadata", &self.metadata)
            .field("has_executor", &self.executor.is_some())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
