//! # CLI Command Implementations
//!
//! Every command opens the redb database, rebuilds the graph from it and
//! attaches the database as the graph's persistence port, so mutations are
//! written through before the command returns.

use crate::api::{self, AppState};
use crate::config::HelixConfig;
use crate::payload::Payload;
use helix_core::primitives::{MAX_NODE_ID_LENGTH, MAX_TAGS_PER_NODE, MAX_WALK_DEPTH};
use helix_core::{
    EdgeWeight, Graph, GraphMetrics, HelixError, NodeId, PersistencePort, RedbPort, export_graph,
    graph_from_bytes, graph_summary, graph_to_bytes, hydrate,
};
use serde_json::Value;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum snapshot size accepted by `restore` (500 MB).
const MAX_SNAPSHOT_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), HelixError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| HelixError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(HelixError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path: canonicalized and pointing at a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, HelixError> {
    let canonical = path.canonicalize().map_err(|e| {
        HelixError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(HelixError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, HelixError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        HelixError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(HelixError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| HelixError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// GRAPH LOADING
// =============================================================================

/// Hydrate the graph from the configured database and attach it as the port.
///
/// Insert hooks are registered after hydration so rebuilding never fires
/// them.
pub fn open_graph(config: &HelixConfig) -> Result<Graph<Payload>, HelixError> {
    let port: RedbPort<Payload> = RedbPort::open(&config.storage.database)?;
    let ids = port.node_ids()?;
    let mut graph = hydrate(&port, &ids, |id, payload: Payload| payload.into_node(id))?;

    for hook in config.graph.hooks.insert_hooks() {
        graph.register_insert_hook(hook);
    }
    graph.attach_port(Box::new(port));

    tracing::debug!(
        database = %config.storage.database.display(),
        nodes = graph.len(),
        "graph opened"
    );
    Ok(graph)
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &HelixConfig) -> Result<(), HelixError> {
    let graph = open_graph(config)?;
    let addr = config.bind_address();

    println!("HyperHelix Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:    {}", addr);
    println!("  Database:   {}", config.storage.database.display());
    println!("  Walk depth: {}", config.graph.walk_depth);
    println!("  Hooks:      {}", graph.insert_hook_names().join(", "));
    println!();
    println!("Endpoints:");
    println!("  GET  /status          - Graph metrics");
    println!("  GET  /nodes           - List nodes");
    println!("  POST /nodes           - Create a node");
    println!("  POST /edges           - Connect two nodes");
    println!("  GET  /walk/{{id}}       - Spiral walk");
    println!("  GET  /path/{{a}}/{{b}}    - Shortest path");
    println!("  GET  /health          - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(graph).with_walk_depth(config.graph.walk_depth);
    api::run_server(&addr, state).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show graph metrics.
pub fn cmd_status(config: &HelixConfig, json_mode: bool) -> Result<(), HelixError> {
    let graph = open_graph(config)?;
    let metrics = GraphMetrics::from_graph(&graph);

    if json_mode {
        print_json(&serde_json::json!({
            "database": config.storage.database.to_string_lossy(),
            "node_count": metrics.node_count,
            "edge_count": metrics.edge_count,
            "isolated_count": metrics.isolated_count,
            "average_degree": metrics.average_degree,
            "total_weight": metrics.total_weight,
            "insert_hooks": graph.insert_hook_names(),
        }));
        return Ok(());
    }

    println!("HyperHelix Graph Status");
    println!("=======================");
    println!("Database: {}", config.storage.database.display());
    println!();
    println!("Nodes:          {}", metrics.node_count);
    println!("Edges:          {}", metrics.edge_count);
    println!("Isolated:       {}", metrics.isolated_count);
    println!("Average degree: {:.2}", metrics.average_degree);
    println!("Total weight:   {}", metrics.total_weight);

    Ok(())
}

// =============================================================================
// NODE COMMANDS
// =============================================================================

/// Arguments of `add-node`.
#[derive(Debug, Clone, Default)]
pub struct NodeArgs {
    pub id: String,
    pub data: Option<String>,
    pub tags: Vec<String>,
    pub layer: i64,
    pub strand: Option<String>,
}

impl NodeArgs {
    fn into_payload(self) -> Result<(NodeId, Payload), HelixError> {
        if self.id.is_empty() {
            return Err(HelixError::DeserializationError(
                "node id must not be empty".to_string(),
            ));
        }
        if self.id.len() > MAX_NODE_ID_LENGTH {
            return Err(HelixError::DeserializationError(format!(
                "node id exceeds {} bytes",
                MAX_NODE_ID_LENGTH
            )));
        }
        if self.tags.len() > MAX_TAGS_PER_NODE {
            return Err(HelixError::DeserializationError(format!(
                "too many tags: {} (max {})",
                self.tags.len(),
                MAX_TAGS_PER_NODE
            )));
        }

        let data = match self.data {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                HelixError::DeserializationError(format!("Invalid JSON payload: {}", e))
            })?,
            None => Value::Null,
        };

        let mut payload = Payload::new(data);
        payload.tags = self.tags;
        payload.layer = self.layer;
        if let Some(strand) = self.strand {
            payload.strand = strand;
        }
        Ok((NodeId::from(self.id), payload))
    }
}

/// Add a node. An existing node with the same id is replaced.
pub fn cmd_add_node(config: &HelixConfig, json_mode: bool, args: NodeArgs) -> Result<(), HelixError> {
    let (id, payload) = args.into_payload()?;
    let mut graph = open_graph(config)?;

    let replaced = graph.contains(&id);
    graph.add_node(payload.into_node(id.clone()))?;

    let degree = graph.get(&id).map_or(0, |n| n.degree());
    if json_mode {
        print_json(&serde_json::json!({
            "id": id,
            "replaced": replaced,
            "degree": degree,
        }));
    } else if replaced {
        println!("Replaced node {} ({} edges)", id, degree);
    } else {
        println!("Added node {} ({} edges)", id, degree);
    }
    Ok(())
}

/// Remove a node and its edges.
pub fn cmd_remove_node(config: &HelixConfig, json_mode: bool, id: &str) -> Result<(), HelixError> {
    let mut graph = open_graph(config)?;
    let removed = graph.remove_node(id)?;

    if json_mode {
        print_json(&serde_json::json!({
            "removed": removed.id,
            "edges": removed.degree(),
        }));
    } else {
        println!("Removed node {} ({} edges)", removed.id, removed.degree());
    }
    Ok(())
}

// =============================================================================
// EDGE COMMANDS
// =============================================================================

/// Connect two nodes.
pub fn cmd_add_edge(
    config: &HelixConfig,
    json_mode: bool,
    a: &str,
    b: &str,
    weight: f64,
) -> Result<(), HelixError> {
    let mut graph = open_graph(config)?;
    graph.add_edge(a, b, EdgeWeight::new(weight))?;

    if json_mode {
        print_json(&serde_json::json!({ "a": a, "b": b, "weight": weight }));
    } else {
        println!("Connected {} <-> {} (weight {})", a, b, weight);
    }
    Ok(())
}

/// Disconnect two nodes.
pub fn cmd_remove_edge(
    config: &HelixConfig,
    json_mode: bool,
    a: &str,
    b: &str,
) -> Result<(), HelixError> {
    let mut graph = open_graph(config)?;
    let existed = graph.edge_weight(a, b).is_some();
    graph.remove_edge(a, b)?;

    if json_mode {
        print_json(&serde_json::json!({ "a": a, "b": b, "removed": existed }));
    } else if existed {
        println!("Disconnected {} <-> {}", a, b);
    } else {
        println!("No edge between {} and {}", a, b);
    }
    Ok(())
}

// =============================================================================
// QUERY COMMANDS
// =============================================================================

/// Spiral walk from a node.
pub fn cmd_walk(
    config: &HelixConfig,
    json_mode: bool,
    id: &str,
    depth: Option<usize>,
) -> Result<(), HelixError> {
    let depth = depth.unwrap_or(config.graph.walk_depth);
    if depth > MAX_WALK_DEPTH {
        return Err(HelixError::DeserializationError(format!(
            "depth {} exceeds maximum {}",
            depth, MAX_WALK_DEPTH
        )));
    }

    let graph = open_graph(config)?;
    let visited: Vec<&NodeId> = graph.spiral_walk(id, depth)?.map(|node| &node.id).collect();

    if json_mode {
        print_json(&serde_json::json!({
            "start": id,
            "depth": depth,
            "nodes": visited,
        }));
        return Ok(());
    }

    println!("Spiral walk from {} (depth {}):", id, depth);
    for node_id in &visited {
        println!("  {}", node_id);
    }
    Ok(())
}

/// Weighted shortest path between two nodes.
pub fn cmd_path(config: &HelixConfig, json_mode: bool, a: &str, b: &str) -> Result<(), HelixError> {
    let graph = open_graph(config)?;
    let path = graph.shortest_path(a, b)?;
    let weight = graph.path_weight(&path);

    if json_mode {
        print_json(&serde_json::json!({
            "found": !path.is_empty(),
            "path": path,
            "weight": weight,
        }));
        return Ok(());
    }

    if path.is_empty() {
        println!("No path found from {} to {}", a, b);
    } else {
        let hops: Vec<&str> = path.iter().map(|id| id.as_str()).collect();
        println!("Shortest path {} -> {}:", a, b);
        println!("  {}", hops.join(" -> "));
        if let Some(weight) = weight {
            println!("  Weight: {}", weight);
        }
    }
    Ok(())
}

/// List the nodes carrying a tag.
pub fn cmd_find(config: &HelixConfig, json_mode: bool, tag: &str) -> Result<(), HelixError> {
    let graph = open_graph(config)?;
    let found: Vec<&NodeId> = graph
        .find_nodes_by_tag(tag)
        .into_iter()
        .map(|node| &node.id)
        .collect();

    if json_mode {
        print_json(&serde_json::json!({ "tag": tag, "nodes": found }));
        return Ok(());
    }

    if found.is_empty() {
        println!("No nodes tagged '{}'", tag);
    } else {
        println!("Nodes tagged '{}':", tag);
        for node_id in found {
            println!("  {}", node_id);
        }
    }
    Ok(())
}

/// One-line summary.
pub fn cmd_summary(config: &HelixConfig, json_mode: bool, limit: usize) -> Result<(), HelixError> {
    let graph = open_graph(config)?;
    let summary = graph_summary(&graph, limit);

    if json_mode {
        print_json(&serde_json::json!({ "summary": summary }));
    } else {
        println!("{}", summary);
    }
    Ok(())
}

// =============================================================================
// EXPORT / SNAPSHOT COMMANDS
// =============================================================================

/// Export the graph as pretty JSON, to a file or stdout.
pub fn cmd_export(config: &HelixConfig, output: Option<&Path>) -> Result<(), HelixError> {
    let graph = open_graph(config)?;
    let data = serde_json::to_vec_pretty(&export_graph(&graph))
        .map_err(|e| HelixError::SerializationError(e.to_string()))?;

    match output {
        Some(path) => {
            let validated_output = validate_output_path(path)?;
            std::fs::write(&validated_output, &data)
                .map_err(|e| HelixError::IoError(format!("Write file: {}", e)))?;
            println!(
                "Exported {} bytes to {}",
                data.len(),
                validated_output.display()
            );
        }
        None => println!("{}", String::from_utf8_lossy(&data)),
    }
    Ok(())
}

/// Write a binary snapshot of the graph.
pub fn cmd_snapshot(config: &HelixConfig, output: &Path) -> Result<(), HelixError> {
    let validated_output = validate_output_path(output)?;

    let graph = open_graph(config)?;
    let data = graph_to_bytes(&graph)?;

    std::fs::write(&validated_output, &data)
        .map_err(|e| HelixError::IoError(format!("Write file: {}", e)))?;

    println!(
        "Snapshot of {} nodes ({} bytes) written to {}",
        graph.len(),
        data.len(),
        validated_output.display()
    );
    Ok(())
}

/// Load a snapshot into the database.
///
/// Snapshot nodes replace stored nodes with the same id; other stored nodes
/// are kept. Hooks do not run.
pub fn cmd_restore(config: &HelixConfig, json_mode: bool, input: &Path) -> Result<(), HelixError> {
    let validated_path = validate_file_path(input)?;
    validate_file_size(&validated_path, MAX_SNAPSHOT_FILE_SIZE)?;

    let data = std::fs::read(&validated_path)
        .map_err(|e| HelixError::IoError(format!("Read file: {}", e)))?;
    let restored: Graph<Payload> = graph_from_bytes(&data)?;

    let mut port: RedbPort<Payload> = RedbPort::open(&config.storage.database)?;
    for node in restored.nodes() {
        // The node attributes win over whatever the payload copy says.
        let mut payload = node.payload.clone();
        payload.tags.clone_from(&node.tags);
        payload.layer = node.layer;
        payload.strand.clone_from(&node.strand);
        port.save_node(&node.id, &payload)?;
        port.save_metadata(&node.id, &node.metadata)?;
    }
    let edges = restored.edges();
    for edge in &edges {
        port.save_edge(&edge.a, &edge.b, edge.weight)?;
    }
    port.compact()?;

    tracing::info!(nodes = restored.len(), edges = edges.len(), "snapshot restored");

    if json_mode {
        print_json(&serde_json::json!({
            "nodes": restored.len(),
            "edges": edges.len(),
        }));
    } else {
        println!(
            "Restored {} nodes and {} edges into {}",
            restored.len(),
            edges.len(),
            config.storage.database.display()
        );
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> HelixConfig {
        let mut config = HelixConfig::default();
        config.storage.database = dir.path().join("graph.redb");
        config
    }

    fn node(id: &str, tags: &[&str]) -> NodeArgs {
        NodeArgs {
            id: id.to_string(),
            data: Some(r#"{"name":"test"}"#.to_string()),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            ..NodeArgs::default()
        }
    }

    #[test]
    fn nodes_survive_reopen_with_tags() {
        let dir = TempDir::new().expect("tempdir");
        let config = config_in(&dir);

        cmd_add_node(&config, true, node("a", &["seed"])).expect("add a");
        cmd_add_node(&config, true, node("b", &["seed"])).expect("add b");

        let graph = open_graph(&config).expect("open");
        assert_eq!(graph.len(), 2);
        assert!(graph.get("a").is_some_and(|n| n.has_tag("seed")));
        // weave hook connected the shared tag, and the edge was persisted
        assert!(graph.edge_weight("a", "b").is_some());
        assert!(graph.has_port());
    }

    #[test]
    fn disabled_weave_hook_leaves_nodes_apart() {
        let dir = TempDir::new().expect("tempdir");
        let mut config = config_in(&dir);
        config.graph.hooks.weave = false;

        cmd_add_node(&config, true, node("a", &["seed"])).expect("add a");
        cmd_add_node(&config, true, node("b", &["seed"])).expect("add b");

        let graph = open_graph(&config).expect("open");
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn edge_commands_write_through() {
        let dir = TempDir::new().expect("tempdir");
        let config = config_in(&dir);

        cmd_add_node(&config, true, node("a", &[])).expect("add a");
        cmd_add_node(&config, true, node("b", &[])).expect("add b");
        cmd_add_edge(&config, true, "a", "b", 2.5).expect("edge");

        {
            let graph = open_graph(&config).expect("open");
            assert_eq!(graph.edge_weight("b", "a"), Some(EdgeWeight::new(2.5)));
        }

        cmd_remove_edge(&config, true, "a", "b").expect("remove");
        let graph = open_graph(&config).expect("open");
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn add_edge_to_missing_node_fails() {
        let dir = TempDir::new().expect("tempdir");
        let config = config_in(&dir);
        cmd_add_node(&config, true, node("a", &[])).expect("add a");

        let result = cmd_add_edge(&config, true, "a", "ghost", 1.0);
        assert!(matches!(result, Err(HelixError::NodeNotFound(_))));
    }

    #[test]
    fn remove_node_deletes_from_database() {
        let dir = TempDir::new().expect("tempdir");
        let config = config_in(&dir);

        cmd_add_node(&config, true, node("a", &["x"])).expect("add a");
        cmd_add_node(&config, true, node("b", &["x"])).expect("add b");
        cmd_remove_node(&config, true, "b").expect("remove");

        let graph = open_graph(&config).expect("open");
        assert_eq!(graph.len(), 1);
        assert!(graph.get("a").is_some_and(|n| n.edges.is_empty()));
    }

    #[test]
    fn invalid_node_arguments_are_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let config = config_in(&dir);

        let empty = NodeArgs::default();
        assert!(cmd_add_node(&config, true, empty).is_err());

        let bad_json = NodeArgs {
            id: "a".to_string(),
            data: Some("{not json".to_string()),
            ..NodeArgs::default()
        };
        assert!(matches!(
            cmd_add_node(&config, true, bad_json),
            Err(HelixError::DeserializationError(_))
        ));
    }

    #[test]
    fn walk_depth_is_capped() {
        let dir = TempDir::new().expect("tempdir");
        let config = config_in(&dir);
        cmd_add_node(&config, true, node("a", &[])).expect("add a");

        assert!(cmd_walk(&config, true, "a", Some(MAX_WALK_DEPTH + 1)).is_err());
        assert!(cmd_walk(&config, true, "a", None).is_ok());
        assert!(matches!(
            cmd_walk(&config, true, "ghost", None),
            Err(HelixError::NodeNotFound(_))
        ));
    }

    #[test]
    fn snapshot_then_restore_into_fresh_database() {
        let dir = TempDir::new().expect("tempdir");
        let source = config_in(&dir);
        let snapshot = dir.path().join("graph.hlx");

        cmd_add_node(&source, true, node("a", &["t"])).expect("add a");
        cmd_add_node(&source, true, node("b", &["t"])).expect("add b");
        cmd_add_node(&source, true, node("c", &[])).expect("add c");
        cmd_add_edge(&source, true, "b", "c", 0.5).expect("edge");
        cmd_snapshot(&source, &snapshot).expect("snapshot");

        let mut target = HelixConfig::default();
        target.storage.database = dir.path().join("restored.redb");
        cmd_restore(&target, true, &snapshot).expect("restore");

        let graph = open_graph(&target).expect("open");
        let ids: Vec<&str> = graph.node_ids().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(graph.get("b").is_some_and(|n| n.has_tag("t")));
        assert_eq!(graph.edge_weight("c", "b"), Some(EdgeWeight::new(0.5)));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn restore_rejects_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let config = config_in(&dir);
        let result = cmd_restore(&config, true, &dir.path().join("missing.hlx"));
        assert!(matches!(result, Err(HelixError::IoError(_))));
    }

    #[test]
    fn export_writes_json_file() {
        let dir = TempDir::new().expect("tempdir");
        let config = config_in(&dir);
        let output = dir.path().join("export.json");

        cmd_add_node(&config, true, node("a", &[])).expect("add a");
        cmd_export(&config, Some(&output)).expect("export");

        let written = std::fs::read_to_string(&output).expect("read");
        let value: Value = serde_json::from_str(&written).expect("json");
        assert_eq!(value["nodes"][0]["id"], "a");
        assert_eq!(value["nodes"][0]["payload"]["data"]["name"], "test");
    }

    #[test]
    fn output_path_requires_existing_parent() {
        let dir = TempDir::new().expect("tempdir");
        assert!(validate_output_path(&dir.path().join("missing/out.json")).is_err());
        assert!(validate_output_path(&dir.path().join("out.json")).is_ok());
    }
}
