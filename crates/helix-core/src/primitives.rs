//! # Engine Primitives
//!
//! Compile-time constants shared by the engine and its collaborators.

/// Weight given to an edge when the caller does not choose one.
///
/// Weaving always connects nodes with this weight.
pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

/// Strand assigned to nodes that do not name one.
pub const DEFAULT_STRAND: &str = "default";

/// Default hop count for `spiral_walk`.
pub const DEFAULT_WALK_DEPTH: usize = 1;

/// Upper bound on walk depth accepted at the API boundary.
///
/// The engine itself does not clamp; callers facing untrusted input do.
pub const MAX_WALK_DEPTH: usize = 100;

/// Number of node ids listed by `graph_summary`.
pub const DEFAULT_SUMMARY_LIMIT: usize = 5;

/// Magic bytes for the HyperHelix snapshot header.
pub const MAGIC_BYTES: &[u8; 4] = b"HLIX";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for node ids accepted at the API boundary.
pub const MAX_NODE_ID_LENGTH: usize = 256;

/// Maximum number of tags accepted for a single node at the API boundary.
pub const MAX_TAGS_PER_NODE: usize = 64;
