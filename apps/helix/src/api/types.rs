//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API and the mapping
//! from engine errors to status codes.

use crate::payload::Payload;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use helix_core::primitives::{MAX_NODE_ID_LENGTH, MAX_TAGS_PER_NODE};
use helix_core::{Edge, HelixError, Node};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Graph status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub node_count: usize,
    pub edge_count: usize,
    pub isolated_count: usize,
    pub average_degree: f64,
    pub total_weight: f64,
    pub insert_hooks: Vec<String>,
    pub update_hooks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
}

// =============================================================================
// NODES
// =============================================================================

/// Node creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNodeRequest {
    pub id: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub layer: i64,
    #[serde(default)]
    pub strand: Option<String>,
}

impl CreateNodeRequest {
    /// Validate fields and build the payload.
    pub fn to_payload(&self) -> Result<Payload, ApiError> {
        if self.id.trim().is_empty() {
            return Err(ApiError::bad_request("Node id must not be empty"));
        }
        if self.id.len() > MAX_NODE_ID_LENGTH {
            return Err(ApiError::bad_request(format!(
                "Node id length {} exceeds maximum {} bytes",
                self.id.len(),
                MAX_NODE_ID_LENGTH
            )));
        }
        if self.tags.len() > MAX_TAGS_PER_NODE {
            return Err(ApiError::bad_request(format!(
                "{} tags exceed maximum {}",
                self.tags.len(),
                MAX_TAGS_PER_NODE
            )));
        }

        let mut payload = Payload::new(self.data.clone());
        payload.tags = self.tags.clone();
        payload.layer = self.layer;
        if let Some(strand) = &self.strand {
            payload.strand = strand.clone();
        }
        Ok(payload)
    }
}

/// A node as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResponse {
    pub id: String,
    pub data: Value,
    pub tags: Vec<String>,
    pub layer: i64,
    pub strand: String,
    pub neighbors: Vec<String>,
    pub importance: f64,
    pub permanence: f64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub perception_history: Vec<String>,
}

impl From<&Node<Payload>> for NodeResponse {
    fn from(node: &Node<Payload>) -> Self {
        Self {
            id: node.id.to_string(),
            data: node.payload.data.clone(),
            tags: node.tags.clone(),
            layer: node.layer,
            strand: node.strand.clone(),
            neighbors: node.edges.neighbors().map(|n| n.to_string()).collect(),
            importance: node.metadata.importance,
            permanence: node.metadata.permanence,
            created: node.metadata.created,
            updated: node.metadata.updated,
            perception_history: node.metadata.perception_history.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub id: String,
    pub result: Option<String>,
}

// =============================================================================
// EDGES
// =============================================================================

fn default_weight() -> f64 {
    helix_core::primitives::DEFAULT_EDGE_WEIGHT
}

/// Edge creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRequest {
    pub a: String,
    pub b: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

/// An undirected edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeJson {
    pub a: String,
    pub b: String,
    pub weight: f64,
}

impl From<&Edge> for EdgeJson {
    fn from(edge: &Edge) -> Self {
        Self {
            a: edge.a.to_string(),
            b: edge.b.to_string(),
            weight: edge.weight.value(),
        }
    }
}

// =============================================================================
// TRAVERSAL
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalkParams {
    pub depth: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkResponse {
    pub start: String,
    pub depth: usize,
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResponse {
    pub found: bool,
    pub path: Vec<String>,
    pub weight: Option<f64>,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error with the status code it maps to.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<HelixError> for ApiError {
    fn from(error: HelixError) -> Self {
        let status = match &error {
            HelixError::NodeNotFound(_) => StatusCode::NOT_FOUND,
            HelixError::InvalidWeight(_) => StatusCode::BAD_REQUEST,
            HelixError::Execution { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HelixError::HookFailed { .. }
            | HelixError::Storage(_)
            | HelixError::SerializationError(_)
            | HelixError::DeserializationError(_)
            | HelixError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %error, "request failed");
        }
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
