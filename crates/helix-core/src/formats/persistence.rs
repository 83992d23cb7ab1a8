//! # Snapshot Format
//!
//! Binary serialization for HyperHelix graphs.
//!
//! Format: Header (5 bytes) + postcard-serialized `SerializableGraph`.
//! - 4 bytes: Magic ("HLIX")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded. Hooks,
//! executors and ports are not part of a snapshot; a restored graph has none.

use crate::graph::SerializableGraph;
use crate::{Graph, HelixError, primitives};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Largest snapshot accepted by `graph_from_bytes` (500 MB).
pub const MAX_PERSISTENCE_PAYLOAD_SIZE: usize = 500 * 1024 * 1024;

const HEADER_LEN: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The snapshot header precedes all graph data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), HelixError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(HelixError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(HelixError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HelixError> {
        let Some(header) = bytes.get(..HEADER_LEN) else {
            return Err(HelixError::DeserializationError(format!(
                "Data too short: minimum {HEADER_LEN} bytes required"
            )));
        };
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&header[0..4]);
        Ok(Self {
            magic,
            version: header[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a graph to bytes (header + payload).
pub fn graph_to_bytes<P>(graph: &Graph<P>) -> Result<Vec<u8>, HelixError>
where
    P: Serialize + Clone,
{
    let serializable = SerializableGraph::from(graph);
    let payload = postcard::to_stdvec(&serializable)
        .map_err(|e| HelixError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_LEN + payload.len());
    result.extend_from_slice(&PersistenceHeader::new().to_bytes());
    result.extend_from_slice(&payload);

    tracing::debug!(nodes = graph.len(), bytes = result.len(), "graph serialized");
    Ok(result)
}

/// Deserialize a graph from bytes. The result has no hooks and no port.
pub fn graph_from_bytes<P>(bytes: &[u8]) -> Result<Graph<P>, HelixError>
where
    P: DeserializeOwned,
{
    if bytes.len() > MAX_PERSISTENCE_PAYLOAD_SIZE {
        return Err(HelixError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_PERSISTENCE_PAYLOAD_SIZE
        )));
    }

    let header = PersistenceHeader::from_bytes(bytes)?;
    header.validate()?;

    let serializable: SerializableGraph<P> = postcard::from_bytes(&bytes[HEADER_LEN..])
        .map_err(|e| {
            HelixError::DeserializationError(format!("Failed to deserialize graph data: {e}"))
        })?;

    Ok(Graph::from(serializable))
}

// =============================================================================
// TESTS
// =============================================================================
