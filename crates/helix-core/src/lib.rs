//! # helix-core
//!
//! The HyperHelix graph engine.
//!
//! An in-memory, labeled, undirected, weighted graph whose nodes carry an
//! opaque payload, tags, a layer, a strand and lifecycle metadata. Inserting
//! a node runs an ordered chain of hooks (metrics, tag weaving, pruning by
//! default); mutations are mirrored to an optional persistence port.
//!
//! ## Layout
//!
//! - `types`, `primitives`: ids, weights, errors and constants
//! - `node`, `edge`, `metadata`: the data model
//! - `graph`: the container, spiral walk and shortest path
//! - `hooks`, `analytics`: insert/update hook chain and its metric functions
//! - `port`, `storage`: persistence contract, memory and redb backends
//! - `formats`: binary snapshots
//! - `execution`, `summary`, `export`: collaborators used by the app
//!
//! Everything here is synchronous and free of network dependencies.

// =============================================================================
// MODULES
// =============================================================================

pub mod analytics;
pub mod edge;
pub mod execution;
pub mod export;
pub mod formats;
pub mod graph;
pub mod hooks;
pub mod metadata;
pub mod node;
pub mod port;
pub mod primitives;
pub mod storage;
pub mod summary;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{EdgeWeight, HelixError, NodeId};

// =============================================================================
// RE-EXPORTS: Graph Engine
// =============================================================================

pub use edge::{Edge, EdgeMap};
pub use graph::{Graph, SerializableGraph, SerializableNode, SpiralWalk};
pub use hooks::{Hook, HookEvent};
pub use metadata::NodeMetadata;
pub use node::Node;
pub use port::PersistencePort;

// =============================================================================
// RE-EXPORTS: Collaborators
// =============================================================================

pub use analytics::{compute_importance, compute_permanence};
pub use execution::execute_node;
pub use export::{ExportedNode, GraphExport, export_graph};
pub use formats::{PersistenceHeader, graph_from_bytes, graph_to_bytes};
pub use storage::{MemoryPort, RedbPort, hydrate};
pub use summary::{GraphMetrics, graph_summary};
