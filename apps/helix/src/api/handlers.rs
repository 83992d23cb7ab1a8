//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        ApiError, CreateNodeRequest, EdgeJson, EdgeRequest, ExecuteResponse, HealthResponse,
        NodeResponse, PathResponse, StatusResponse, SummaryResponse, WalkParams, WalkResponse,
    },
};
use crate::payload::Payload;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use helix_core::{
    EdgeWeight, GraphExport, GraphMetrics, HelixError, execute_node, export_graph, graph_summary,
    primitives::{DEFAULT_SUMMARY_LIMIT, MAX_WALK_DEPTH},
};

// =============================================================================
// ROOT / HEALTH / STATUS
// =============================================================================

/// Liveness probe at the root path.
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Get graph status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let graph = state.graph.read().await;
    let metrics = GraphMetrics::from_graph(&*graph);

    let response = StatusResponse {
        node_count: metrics.node_count,
        edge_count: metrics.edge_count,
        isolated_count: metrics.isolated_count,
        average_degree: metrics.average_degree,
        total_weight: metrics.total_weight,
        insert_hooks: graph
            .insert_hook_names()
            .into_iter()
            .map(String::from)
            .collect(),
        update_hooks: graph
            .update_hook_names()
            .into_iter()
            .map(String::from)
            .collect(),
    };

    (StatusCode::OK, Json(response))
}

/// One-line text summary.
pub async fn summary_handler(State(state): State<AppState>) -> impl IntoResponse {
    let graph = state.graph.read().await;
    Json(SummaryResponse {
        summary: graph_summary(&*graph, DEFAULT_SUMMARY_LIMIT),
    })
}

/// Full graph dump.
pub async fn export_handler(State(state): State<AppState>) -> Json<GraphExport<Payload>> {
    let graph = state.graph.read().await;
    Json(export_graph(&*graph))
}

// =============================================================================
// NODE HANDLERS
// =============================================================================

pub async fn list_nodes_handler(State(state): State<AppState>) -> Json<Vec<NodeResponse>> {
    let graph = state.graph.read().await;
    Json(graph.nodes().map(NodeResponse::from).collect())
}

/// Create a node. Unlike the engine, the API refuses to overwrite.
pub async fn create_node_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateNodeRequest>,
) -> Result<(StatusCode, Json<NodeResponse>), ApiError> {
    let payload = request.to_payload()?;

    let mut graph = state.graph.write().await;
    if graph.contains(&request.id) {
        return Err(ApiError::bad_request(format!(
            "Node already exists: {}",
            request.id
        )));
    }

    graph.add_node(payload.into_node(request.id.as_str()))?;
    let node = graph
        .get(&request.id)
        .ok_or_else(|| HelixError::node_not_found(request.id.as_str()))?;

    tracing::info!(node = %request.id, "node created");
    Ok((StatusCode::CREATED, Json(NodeResponse::from(node))))
}

pub async fn get_node_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NodeResponse>, ApiError> {
    let graph = state.graph.read().await;
    let node = graph
        .get(&id)
        .ok_or_else(|| HelixError::node_not_found(id.as_str()))?;
    Ok(Json(NodeResponse::from(node)))
}

pub async fn delete_node_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut graph = state.graph.write().await;
    graph.remove_node(&id)?;
    tracing::info!(node = %id, "node removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Run the node's executor and fire the update hooks.
pub async fn execute_node_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let mut graph = state.graph.write().await;
    let result = execute_node(&mut *graph, &id)?;
    Ok(Json(ExecuteResponse { id, result }))
}

// =============================================================================
// EDGE HANDLERS
// =============================================================================

pub async fn list_edges_handler(State(state): State<AppState>) -> Json<Vec<EdgeJson>> {
    let graph = state.graph.read().await;
    Json(graph.edges().iter().map(EdgeJson::from).collect())
}

pub async fn create_edge_handler(
    State(state): State<AppState>,
    Json(request): Json<EdgeRequest>,
) -> Result<(StatusCode, Json<EdgeJson>), ApiError> {
    let mut graph = state.graph.write().await;
    graph.add_edge(&request.a, &request.b, EdgeWeight::new(request.weight))?;

    Ok((
        StatusCode::CREATED,
        Json(EdgeJson {
            a: request.a,
            b: request.b,
            weight: request.weight,
        }),
    ))
}

/// Edges of one node.
pub async fn node_edges_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<EdgeJson>>, ApiError> {
    let graph = state.graph.read().await;
    let edges = graph.node_edges(&id)?;
    Ok(Json(edges.iter().map(EdgeJson::from).collect()))
}

/// Delete an edge. 404 when either node or the edge itself is missing.
pub async fn delete_edge_handler(
    State(state): State<AppState>,
    Path((a, b)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let mut graph = state.graph.write().await;
    for id in [&a, &b] {
        if !graph.contains(id) {
            return Err(HelixError::node_not_found(id.as_str()).into());
        }
    }
    if graph.edge_weight(&a, &b).is_none() {
        return Err(ApiError::not_found(format!("Edge not found: {a} - {b}")));
    }

    graph.remove_edge(&a, &b)?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// TRAVERSAL HANDLERS
// =============================================================================

/// Validate that depth is within bounds to prevent DoS.
fn validate_depth(depth: usize) -> Result<(), ApiError> {
    if depth > MAX_WALK_DEPTH {
        return Err(ApiError::bad_request(format!(
            "Depth {} exceeds maximum {}",
            depth, MAX_WALK_DEPTH
        )));
    }
    Ok(())
}

pub async fn walk_handler(
    State(state): State<AppState>,
    Path(start): Path<String>,
    Query(params): Query<WalkParams>,
) -> Result<Json<WalkResponse>, ApiError> {
    let depth = params.depth.unwrap_or(state.walk_depth);
    validate_depth(depth)?;

    let graph = state.graph.read().await;
    let nodes = graph
        .spiral_walk(&start, depth)?
        .map(|node| node.id.to_string())
        .collect();

    Ok(Json(WalkResponse {
        start,
        depth,
        nodes,
    }))
}

pub async fn path_handler(
    State(state): State<AppState>,
    Path((a, b)): Path<(String, String)>,
) -> Result<Json<PathResponse>, ApiError> {
    let graph = state.graph.read().await;
    let path = graph.shortest_path(&a, &b)?;
    let weight = if path.is_empty() {
        None
    } else {
        graph.path_weight(&path)
    };

    Ok(Json(PathResponse {
        found: !path.is_empty(),
        path: path.iter().map(|id| id.to_string()).collect(),
        weight,
    }))
}

pub async fn tag_handler(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Json<Vec<NodeResponse>> {
    let graph = state.graph.read().await;
    Json(
        graph
            .find_nodes_by_tag(&tag)
            .into_iter()
            .map(NodeResponse::from)
            .collect(),
    )
}
