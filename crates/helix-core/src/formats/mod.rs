//! # Formats
//!
//! Byte-level snapshot format for whole graphs. File I/O lives in the app.

pub mod persistence;

pub use persistence::{
    MAX_PERSISTENCE_PAYLOAD_SIZE, PersistenceHeader, graph_from_bytes, graph_to_bytes,
};
