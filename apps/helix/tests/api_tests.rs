//! Integration tests for the HyperHelix HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum_test::TestServer;
use helix::Payload;
use helix::api::{
    AppState, EdgeJson, ErrorResponse, ExecuteResponse, HealthResponse, NodeResponse,
    PathResponse, StatusResponse, SummaryResponse, WalkResponse, create_router,
};
use helix_core::hooks::{bind_task, default_insert_hooks};
use helix_core::{EdgeWeight, Graph, HelixError, Node};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Server over an empty graph with the default insert hooks.
fn create_test_server() -> TestServer {
    let state = AppState::new(Graph::with_hooks(default_insert_hooks(), Vec::new()));
    TestServer::new(create_router(state)).unwrap()
}

fn server_for(graph: Graph<Payload>) -> TestServer {
    TestServer::new(create_router(AppState::new(graph))).unwrap()
}

async fn create_node(server: &TestServer, id: &str, tags: &[&str]) -> NodeResponse {
    let response = server
        .post("/nodes")
        .json(&json!({ "id": id, "data": { "label": id }, "tags": tags }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

async fn connect(server: &TestServer, a: &str, b: &str, weight: f64) {
    server
        .post("/edges")
        .json(&json!({ "a": a, "b": b, "weight": weight }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);
}

/// a -1- b -1- c, plus a direct a -5- c.
async fn create_triangle_server() -> TestServer {
    let server = create_test_server();
    for id in ["a", "b", "c"] {
        create_node(&server, id, &[]).await;
    }
    connect(&server, "a", "b", 1.0).await;
    connect(&server, "b", "c", 1.0).await;
    connect(&server, "a", "c", 5.0).await;
    server
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

#[tokio::test]
async fn test_root_endpoint() {
    let server = create_test_server();

    let response = server.get("/").await;

    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_health_returns_correct_version() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_empty_graph() {
    let server = create_test_server();

    let status: StatusResponse = server.get("/status").await.json();

    assert_eq!(status.node_count, 0);
    assert_eq!(status.edge_count, 0);
    assert_eq!(
        status.insert_hooks,
        vec!["metric_update", "weave_by_tag", "prune_dangling"]
    );
    assert!(status.update_hooks.is_empty());
}

#[tokio::test]
async fn test_status_populated_graph() {
    let server = create_triangle_server().await;

    let status: StatusResponse = server.get("/status").await.json();

    assert_eq!(status.node_count, 3);
    assert_eq!(status.edge_count, 3);
    assert_eq!(status.isolated_count, 0);
    assert!((status.total_weight - 7.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_summary_lists_sample_nodes() {
    let server = create_triangle_server().await;

    let summary: SummaryResponse = server.get("/summary").await.json();

    assert_eq!(
        summary.summary,
        "The graph contains 3 nodes. Sample nodes: a, b, c."
    );
}

// =============================================================================
// NODE ENDPOINTS
// =============================================================================

#[tokio::test]
async fn test_create_and_get_node() {
    let server = create_test_server();

    let created = create_node(&server, "alpha", &["seed"]).await;
    assert_eq!(created.id, "alpha");
    assert_eq!(created.tags, vec!["seed"]);
    assert_eq!(created.strand, "default");

    let response = server.get("/nodes/alpha").await;
    response.assert_status_ok();
    let node: NodeResponse = response.json();
    assert_eq!(node.data, json!({ "label": "alpha" }));
    assert!(node.neighbors.is_empty());
}

#[tokio::test]
async fn test_create_node_weaves_shared_tags() {
    let server = create_test_server();

    create_node(&server, "a", &["topic"]).await;
    let b = create_node(&server, "b", &["topic"]).await;

    assert_eq!(b.neighbors, vec!["a"]);
    // metrics run before weaving
    assert!(b.importance.abs() < f64::EPSILON);

    let a: NodeResponse = server.get("/nodes/a").await.json();
    assert_eq!(a.neighbors, vec!["b"]);
}

#[tokio::test]
async fn test_create_duplicate_node_rejected() {
    let server = create_test_server();
    create_node(&server, "a", &[]).await;

    let response = server.post("/nodes").json(&json!({ "id": "a" })).await;

    response.assert_status_bad_request();
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("already exists"));
}

#[tokio::test]
async fn test_create_node_empty_id_rejected() {
    let server = create_test_server();

    let response = server.post("/nodes").json(&json!({ "id": "" })).await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_get_missing_node_is_404() {
    let server = create_test_server();

    let response = server.get("/nodes/ghost").await;

    response.assert_status_not_found();
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("ghost"));
}

#[tokio::test]
async fn test_list_nodes_in_insertion_order() {
    let server = create_test_server();
    for id in ["z", "a", "m"] {
        create_node(&server, id, &[]).await;
    }

    let nodes: Vec<NodeResponse> = server.get("/nodes").await.json();
    let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();

    assert_eq!(ids, vec!["z", "a", "m"]);
}

#[tokio::test]
async fn test_delete_node_removes_edges() {
    let server = create_triangle_server().await;

    server
        .delete("/nodes/b")
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    server.get("/nodes/b").await.assert_status_not_found();
    let a: NodeResponse = server.get("/nodes/a").await.json();
    assert_eq!(a.neighbors, vec!["c"]);

    server.delete("/nodes/b").await.assert_status_not_found();
}

#[tokio::test]
async fn test_find_by_tag() {
    let server = create_test_server();
    create_node(&server, "a", &["red"]).await;
    create_node(&server, "b", &["blue"]).await;
    create_node(&server, "c", &["red", "blue"]).await;

    let red: Vec<NodeResponse> = server.get("/tags/red").await.json();
    let ids: Vec<&str> = red.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);

    let none: Vec<NodeResponse> = server.get("/tags/green").await.json();
    assert!(none.is_empty());
}

// =============================================================================
// EXECUTION
// =============================================================================

#[tokio::test]
async fn test_execute_runs_executor_and_update_hooks() {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);

    let mut graph: Graph<Payload> = Graph::new();
    graph.register_update_hook(bind_task("count", move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    graph
        .add_node(
            Node::new("task", Payload::new(json!({ "n": 2 })))
                .with_executor(|p: &Payload| Ok(p.data["n"].as_i64().map(|n| n * 21))),
        )
        .unwrap();
    let server = server_for(graph);

    let response = server.post("/nodes/task/execute").await;

    response.assert_status_ok();
    let executed: ExecuteResponse = response.json();
    assert_eq!(executed.result.as_deref(), Some("42"));
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    let node: NodeResponse = server.get("/nodes/task").await.json();
    assert_eq!(node.perception_history, vec!["42"]);
}

#[tokio::test]
async fn test_execute_without_executor_returns_null() {
    let server = create_test_server();
    create_node(&server, "plain", &[]).await;

    let executed: ExecuteResponse = server.post("/nodes/plain/execute").await.json();

    assert!(executed.result.is_none());
}

#[tokio::test]
async fn test_execute_failure_is_422() {
    let mut graph: Graph<Payload> = Graph::new();
    graph
        .add_node(
            Node::new("broken", Payload::default()).with_executor(|_: &Payload| {
                Err::<Option<String>, _>(HelixError::Execution {
                    node: "broken".into(),
                    reason: "boom".to_string(),
                })
            }),
        )
        .unwrap();
    let server = server_for(graph);

    let response = server.post("/nodes/broken/execute").await;

    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    server.post("/nodes/ghost/execute").await.assert_status_not_found();
}

// =============================================================================
// EDGE ENDPOINTS
// =============================================================================

#[tokio::test]
async fn test_edges_are_listed_once() {
    let server = create_triangle_server().await;

    let edges: Vec<EdgeJson> = server.get("/edges").await.json();

    assert_eq!(edges.len(), 3);
    assert!(edges.iter().all(|e| e.a < e.b));
}

#[tokio::test]
async fn test_node_edges_endpoint() {
    let server = create_triangle_server().await;

    let edges: Vec<EdgeJson> = server.get("/edges/b").await.json();

    assert_eq!(edges.len(), 2);
    server.get("/edges/ghost").await.assert_status_not_found();
}

#[tokio::test]
async fn test_create_edge_default_weight() {
    let server = create_test_server();
    create_node(&server, "a", &[]).await;
    create_node(&server, "b", &[]).await;

    let response = server.post("/edges").json(&json!({ "a": "a", "b": "b" })).await;

    response.assert_status(axum::http::StatusCode::CREATED);
    let edge: EdgeJson = response.json();
    assert!((edge.weight - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_create_edge_to_missing_node_is_404() {
    let server = create_test_server();
    create_node(&server, "a", &[]).await;

    let response = server
        .post("/edges")
        .json(&json!({ "a": "a", "b": "ghost" }))
        .await;

    response.assert_status_not_found();
    let a: NodeResponse = server.get("/nodes/a").await.json();
    assert!(a.neighbors.is_empty());
}

#[tokio::test]
async fn test_create_edge_negative_weight_rejected() {
    let server = create_test_server();
    create_node(&server, "a", &[]).await;
    create_node(&server, "b", &[]).await;

    let response = server
        .post("/edges")
        .json(&json!({ "a": "a", "b": "b", "weight": -1.0 }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_delete_edge() {
    let server = create_triangle_server().await;

    server
        .delete("/edges/c/a")
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);

    let a: NodeResponse = server.get("/nodes/a").await.json();
    let c: NodeResponse = server.get("/nodes/c").await.json();
    assert_eq!(a.neighbors, vec!["b"]);
    assert_eq!(c.neighbors, vec!["b"]);

    // gone now
    server.delete("/edges/a/c").await.assert_status_not_found();
    server.delete("/edges/a/ghost").await.assert_status_not_found();
}

// =============================================================================
// TRAVERSAL ENDPOINTS
// =============================================================================

#[tokio::test]
async fn test_walk_default_depth_is_one() {
    let server = create_test_server();
    for id in ["a", "b", "c"] {
        create_node(&server, id, &[]).await;
    }
    connect(&server, "a", "b", 1.0).await;
    connect(&server, "b", "c", 1.0).await;

    let walk: WalkResponse = server.get("/walk/a").await.json();

    assert_eq!(walk.depth, 1);
    assert_eq!(walk.nodes, vec!["a", "b"]);
}

#[tokio::test]
async fn test_walk_with_depth_query() {
    let server = create_triangle_server().await;

    let walk: WalkResponse = server.get("/walk/a").add_query_param("depth", 0).await.json();
    assert_eq!(walk.nodes, vec!["a"]);

    let walk: WalkResponse = server.get("/walk/a").add_query_param("depth", 5).await.json();
    assert_eq!(walk.nodes.len(), 3);
}

#[tokio::test]
async fn test_walk_depth_uses_state_default() {
    let mut graph: Graph<Payload> = Graph::new();
    for id in ["a", "b", "c"] {
        graph.add_node(Payload::default().into_node(id)).unwrap();
    }
    graph.add_edge("a", "b", EdgeWeight::DEFAULT).unwrap();
    graph.add_edge("b", "c", EdgeWeight::DEFAULT).unwrap();
    let state = AppState::new(graph).with_walk_depth(2);
    let server = TestServer::new(create_router(state)).unwrap();

    let walk: WalkResponse = server.get("/walk/a").await.json();

    assert_eq!(walk.nodes, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_walk_rejects_excessive_depth() {
    let server = create_triangle_server().await;

    let response = server.get("/walk/a").add_query_param("depth", 101).await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_walk_from_missing_node_is_404() {
    let server = create_test_server();

    server.get("/walk/ghost").await.assert_status_not_found();
}

#[tokio::test]
async fn test_shortest_path_prefers_lighter_route() {
    let server = create_triangle_server().await;

    let path: PathResponse = server.get("/path/a/c").await.json();

    assert!(path.found);
    assert_eq!(path.path, vec!["a", "b", "c"]);
    assert_eq!(path.weight, Some(2.0));
}

#[tokio::test]
async fn test_shortest_path_unreachable() {
    let server = create_test_server();
    create_node(&server, "a", &[]).await;
    create_node(&server, "b", &[]).await;

    let path: PathResponse = server.get("/path/a/b").await.json();

    assert!(!path.found);
    assert!(path.path.is_empty());
    assert!(path.weight.is_none());
}

#[tokio::test]
async fn test_shortest_path_to_self() {
    let server = create_test_server();
    create_node(&server, "a", &[]).await;

    let path: PathResponse = server.get("/path/a/a").await.json();

    assert_eq!(path.path, vec!["a"]);
    assert_eq!(path.weight, Some(0.0));
}

#[tokio::test]
async fn test_shortest_path_missing_endpoint_is_404() {
    let server = create_test_server();
    create_node(&server, "a", &[]).await;

    server.get("/path/a/ghost").await.assert_status_not_found();
}

// =============================================================================
// EXPORT
// =============================================================================

#[tokio::test]
async fn test_export_populated_graph() {
    let server = create_triangle_server().await;

    let export: Value = server.get("/export").await.json();

    assert_eq!(export["nodes"].as_array().map(Vec::len), Some(3));
    assert_eq!(export["edges"].as_array().map(Vec::len), Some(3));
    assert_eq!(export["nodes"][0]["payload"]["data"]["label"], "a");
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let server = create_test_server();

    server.get("/unknown").await.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let server = create_test_server();

    // /health is GET only
    let response = server.post("/health").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let server = create_test_server();

    let response = server
        .post("/nodes")
        .text("not valid json")
        .content_type("application/json")
        .await;

    assert!(response.status_code().is_client_error());
}
