//! # Node Payload
//!
//! The payload type the application stores in `Graph<Payload>`.
//!
//! Besides the caller's JSON document it carries the node attributes that a
//! redb rebuild has to restore (tags, layer, strand), since the port only
//! persists payloads.

use helix_core::primitives::DEFAULT_STRAND;
use helix_core::{Node, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON document plus the node attributes derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(with = "json_document", default)]
    pub data: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub layer: i64,
    #[serde(default = "default_strand")]
    pub strand: String,
}

fn default_strand() -> String {
    DEFAULT_STRAND.to_string()
}

impl Default for Payload {
    fn default() -> Self {
        Self {
            data: Value::Null,
            tags: Vec::new(),
            layer: 0,
            strand: default_strand(),
        }
    }
}

impl Payload {
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Build the graph node for this payload.
    pub fn into_node(self, id: impl Into<NodeId>) -> Node<Payload> {
        let (tags, layer, strand) = (self.tags.clone(), self.layer, self.strand.clone());
        Node::new(id, self)
            .with_tags(tags)
            .with_layer(layer)
            .with_strand(strand)
    }
}

/// `serde_json::Value` cannot be decoded by non-self-describing formats, so
/// binary encoders (postcard) get the document as a JSON string instead.
mod json_document {
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            value.serialize(serializer)
        } else {
            serde_json::to_string(value)
                .map_err(S::Error::custom)?
                .serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        if deserializer.is_human_readable() {
            Value::deserialize(deserializer)
        } else {
            let text = String::deserialize(deserializer)?;
            serde_json::from_str(&text).map_err(D::Error::custom)
        }
    }
}
