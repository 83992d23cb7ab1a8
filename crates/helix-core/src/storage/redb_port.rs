//! # redb Persistence Port
//!
//! A disk-backed `PersistencePort` using the redb embedded database.
//!
//! Every port call is its own write transaction, so a mutation that returned
//! `Ok` is durable. Payloads and metadata are encoded with postcard. Edges
//! are stored once per direction, keyed `(from, to)`, so `load_edges` reads a
//! single key range. Each edge carries a sequence number that restores the
//! neighbor order on load.

use crate::edge::EdgeMap;
use crate::metadata::NodeMetadata;
use crate::port::PersistencePort;
use crate::{EdgeWeight, HelixError, NodeId};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

/// Table for nodes: NodeId -> postcard payload bytes
const NODES: TableDefinition<&str, &[u8]> = TableDefinition::new("nodes");

/// Table for edges: (from, to) -> (weight, sequence). Each edge appears in
/// both directions with the same sequence number.
const EDGES: TableDefinition<(&str, &str), (f64, u64)> = TableDefinition::new("edges");

/// Table for node metadata: NodeId -> postcard metadata bytes
const NODE_METADATA: TableDefinition<&str, &[u8]> = TableDefinition::new("node_metadata");

/// Table for insertion order: NodeId -> sequence number
const SEQUENCE: TableDefinition<&str, u64> = TableDefinition::new("sequence");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_SEQ_KEY: &str = "next_seq";
const NEXT_EDGE_SEQ_KEY: &str = "next_edge_seq";

fn storage_err(e: impl fmt::Display) -> HelixError {
    HelixError::Storage(e.to_string())
}

/// Persistence port backed by a redb file.
pub struct RedbPort<P> {
    db: Database,
    next_seq: u64,
    next_edge_seq: u64,
    _payload: PhantomData<fn() -> P>,
}

impl<P> fmt::Debug for RedbPort<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbPort")
            .field("next_seq", &self.next_seq)
            .field("next_edge_seq", &self.next_edge_seq)
            .finish_non_exhaustive()
    }
}

impl<P> RedbPort<P> {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HelixError> {
        let db = Database::create(path.as_ref()).map_err(storage_err)?;

        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn.open_table(NODES).map_err(storage_err)?;
            let _ = write_txn.open_table(EDGES).map_err(storage_err)?;
            let _ = write_txn.open_table(SEQUENCE).map_err(storage_err)?;
            let _ = write_txn.open_table(METADATA).map_err(storage_err)?;
            let _ = write_txn.open_table(NODE_METADATA).map_err(storage_err)?;
            write_txn.commit().map_err(storage_err)?;
        }

        let (next_seq, next_edge_seq) = {
            let read_txn = db.begin_read().map_err(storage_err)?;
            let table = read_txn.open_table(METADATA).map_err(storage_err)?;
            let counter = |key: &str| -> Result<u64, HelixError> {
                Ok(table
                    .get(key)
                    .map_err(storage_err)?
                    .map(|v| v.value())
                    .unwrap_or(0))
            };
            (counter(NEXT_SEQ_KEY)?, counter(NEXT_EDGE_SEQ_KEY)?)
        };

        tracing::debug!(
            path = %path.as_ref().display(),
            next_seq,
            next_edge_seq,
            "opened redb port"
        );
        Ok(Self {
            db,
            next_seq,
            next_edge_seq,
            _payload: PhantomData,
        })
    }

    /// Stored node ids in first-insertion order.
    pub fn node_ids(&self) -> Result<Vec<NodeId>, HelixError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(SEQUENCE).map_err(storage_err)?;

        let mut ids = Vec::new();
        for entry in table.iter().map_err(storage_err)? {
            let (key, value) = entry.map_err(storage_err)?;
            ids.push((value.value(), NodeId::from(key.value())));
        }
        ids.sort_by_key(|(seq, _)| *seq);
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    /// Number of stored nodes.
    pub fn node_count(&self) -> Result<usize, HelixError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(NODES).map_err(storage_err)?;
        let len = table.len().map_err(storage_err)?;
        usize::try_from(len).map_err(storage_err)
    }

    /// Number of stored undirected edges.
    pub fn edge_count(&self) -> Result<usize, HelixError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(EDGES).map_err(storage_err)?;

        let mut count = 0usize;
        for entry in table.iter().map_err(storage_err)? {
            let (key, _) = entry.map_err(storage_err)?;
            let (from, to) = key.value();
            if from <= to {
                count = count.saturating_add(1);
            }
        }
        Ok(count)
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), HelixError> {
        self.db.compact().map_err(storage_err)?;
        Ok(())
    }
}

impl<P> PersistencePort<P> for RedbPort<P>
where
    P: Serialize + DeserializeOwned,
{
    fn save_node(&mut self, id: &NodeId, payload: &P) -> Result<(), HelixError> {
        let bytes = postcard::to_allocvec(payload)
            .map_err(|e| HelixError::SerializationError(e.to_string()))?;

        let mut next_seq = self.next_seq;
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut nodes = write_txn.open_table(NODES).map_err(storage_err)?;
            nodes
                .insert(id.as_str(), bytes.as_slice())
                .map_err(storage_err)?;

            let mut sequence = write_txn.open_table(SEQUENCE).map_err(storage_err)?;
            let known = sequence.get(id.as_str()).map_err(storage_err)?.is_some();
            if !known {
                sequence
                    .insert(id.as_str(), next_seq)
                    .map_err(storage_err)?;
                next_seq = next_seq.saturating_add(1);

                let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;
                meta.insert(NEXT_SEQ_KEY, next_seq).map_err(storage_err)?;
            }
        }
        write_txn.commit().map_err(storage_err)?;

        self.next_seq = next_seq;
        Ok(())
    }

    fn load_node(&self, id: &NodeId) -> Result<Option<P>, HelixError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let nodes = read_txn.open_table(NODES).map_err(storage_err)?;

        match nodes.get(id.as_str()).map_err(storage_err)? {
            Some(data) => {
                let payload: P = postcard::from_bytes(data.value())
                    .map_err(|e| HelixError::DeserializationError(e.to_string()))?;
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }

    fn save_edge(&mut self, a: &NodeId, b: &NodeId, weight: EdgeWeight) -> Result<(), HelixError> {
        let mut next_edge_seq = self.next_edge_seq;
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut edges = write_txn.open_table(EDGES).map_err(storage_err)?;

            // A re-saved edge keeps its slot, like `EdgeMap::insert`.
            let existing = edges
                .get((a.as_str(), b.as_str()))
                .map_err(storage_err)?
                .map(|v| v.value().1);
            let seq = match existing {
                Some(seq) => seq,
                None => {
                    let seq = next_edge_seq;
                    next_edge_seq = next_edge_seq.saturating_add(1);
                    let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;
                    meta.insert(NEXT_EDGE_SEQ_KEY, next_edge_seq)
                        .map_err(storage_err)?;
                    seq
                }
            };

            edges
                .insert((a.as_str(), b.as_str()), (weight.value(), seq))
                .map_err(storage_err)?;
            edges
                .insert((b.as_str(), a.as_str()), (weight.value(), seq))
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;

        self.next_edge_seq = next_edge_seq;
        Ok(())
    }

    fn load_edges(&self, id: &NodeId) -> Result<EdgeMap, HelixError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let edges = read_txn.open_table(EDGES).map_err(storage_err)?;

        let mut stored: Vec<(u64, NodeId, EdgeWeight)> = Vec::new();
        for entry in edges.range((id.as_str(), "")..).map_err(storage_err)? {
            let (key, value) = entry.map_err(storage_err)?;
            let (from, to) = key.value();
            if from != id.as_str() {
                break;
            }
            let (weight, seq) = value.value();
            stored.push((seq, NodeId::from(to), EdgeWeight::new(weight)));
        }
        stored.sort_by_key(|(seq, _, _)| *seq);

        Ok(stored
            .into_iter()
            .map(|(_, neighbor, weight)| (neighbor, weight))
            .collect())
    }

    fn save_metadata(&mut self, id: &NodeId, metadata: &NodeMetadata) -> Result<(), HelixError> {
        let bytes = postcard::to_allocvec(metadata)
            .map_err(|e| HelixError::SerializationError(e.to_string()))?;

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut table = write_txn.open_table(NODE_METADATA).map_err(storage_err)?;
            table
                .insert(id.as_str(), bytes.as_slice())
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }

    fn load_metadata(&self, id: &NodeId) -> Result<Option<NodeMetadata>, HelixError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;
        let table = read_txn.open_table(NODE_METADATA).map_err(storage_err)?;

        match table.get(id.as_str()).map_err(storage_err)? {
            Some(data) => postcard::from_bytes(data.value())
                .map(Some)
                .map_err(|e| HelixError::DeserializationError(e.to_string())),
            None => Ok(None),
        }
    }

    fn remove_edge(&mut self, a: &NodeId, b: &NodeId) -> Result<(), HelixError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut edges = write_txn.open_table(EDGES).map_err(storage_err)?;
            edges
                .remove((a.as_str(), b.as_str()))
                .map_err(storage_err)?;
            edges
                .remove((b.as_str(), a.as_str()))
                .map_err(storage_err)?;
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }

    fn remove_node(&mut self, id: &NodeId) -> Result<(), HelixError> {
        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut nodes = write_txn.open_table(NODES).map_err(storage_err)?;
            nodes.remove(id.as_str()).map_err(storage_err)?;

            let mut sequence = write_txn.open_table(SEQUENCE).map_err(storage_err)?;
            sequence.remove(id.as_str()).map_err(storage_err)?;

            let mut metadata = write_txn.open_table(NODE_METADATA).map_err(storage_err)?;
            metadata.remove(id.as_str()).map_err(storage_err)?;

            let mut edges = write_txn.open_table(EDGES).map_err(storage_err)?;
            let mut neighbors: Vec<String> = Vec::new();
            for entry in edges.range((id.as_str(), "")..).map_err(storage_err)? {
                let (key, _) = entry.map_err(storage_err)?;
                let (from, to) = key.value();
                if from != id.as_str() {
                    break;
                }
                neighbors.push(to.to_string());
            }
            for neighbor in &neighbors {
                edges
                    .remove((id.as_str(), neighbor.as_str()))
                    .map_err(storage_err)?;
                edges
                    .remove((neighbor.as_str(), id.as_str()))
                    .map_err(storage_err)?;
            }
        }
        write_txn.commit().map_err(storage_err)?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
