//! # Execution
//!
//! Runs a node's executor on behalf of the graph and fires the update hooks
//! once it succeeds.

use crate::{Graph, HelixError};

/// Execute the node `id`.
///
/// On success every update hook runs (failures are logged and isolated, as
/// for insert hooks), the node's metadata goes to the port and the
/// stringified result is returned. On failure no hook runs and the
/// executor's error is returned.
pub fn execute_node<P>(graph: &mut Graph<P>, id: &str) -> Result<Option<String>, HelixError> {
    let node = graph.get_mut(id).ok_or_else(|| {
        tracing::error!(node = id, "cannot execute missing node");
        HelixError::node_not_found(id)
    })?;

    let result = match node.execute() {
        Ok(result) => result,
        Err(e) => {
            // the timestamp moved even though the executor failed
            if let Err(persist) = graph.persist_metadata(id) {
                tracing::warn!(node = id, error = %persist, "could not persist metadata");
            }
            return Err(e);
        }
    };

    let failures = graph.fire_update_hooks(id);
    if failures > 0 {
        tracing::warn!(node = id, failures, "update hooks failed after execution");
    }
    graph.persist_metadata(id)?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{Hook, bind_task};
    use crate::{MemoryPort, Node, NodeId, PersistencePort};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_graph(calls: &Arc<AtomicUsize>) -> Graph<i32> {
        let counter = Arc::clone(calls);
        Graph::with_hooks(
            Vec::new(),
            vec![bind_task("count", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })],
        )
    }

    #[test]
    fn execute_fires_update_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut graph = counting_graph(&calls);
        graph
            .add_node(Node::new("a", 2).with_executor(|n: &i32| Ok(Some(n + 1))))
            .expect("add");

        let result = execute_node(&mut graph, "a").expect("execute");

        assert_eq!(result.as_deref(), Some("3"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            graph.get("a").map(|n| n.metadata.perception_history.clone()),
            Some(vec!["3".to_string()])
        );
    }

    #[test]
    fn failed_execution_skips_update_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut graph = counting_graph(&calls);
        graph
            .add_node(Node::new("a", 0).with_executor(|_: &i32| {
                Err::<Option<i32>, _>(HelixError::Execution {
                    node: NodeId::from("a"),
                    reason: "division by zero".to_string(),
                })
            }))
            .expect("add");

        assert!(matches!(
            execute_node(&mut graph, "a"),
            Err(HelixError::Execution { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn failing_update_hook_is_isolated() {
        let mut graph: Graph<()> = Graph::with_hooks(
            Vec::new(),
            vec![Hook::new("broken", |_g: &mut Graph<()>, id: &NodeId| {
                Err(HelixError::node_not_found(id))
            })],
        );
        graph.add_node(Node::new("a", ())).expect("add");

        assert_eq!(execute_node(&mut graph, "a").expect("execute"), None);
    }

    #[test]
    fn execution_persists_perception_history() {
        let port: MemoryPort<i32> = MemoryPort::new();
        let mut graph = Graph::new().with_port(port.clone());
        graph
            .add_node(Node::new("a", 4).with_executor(|n: &i32| Ok(Some(n * 2))))
            .expect("add");

        execute_node(&mut graph, "a").expect("execute");

        let stored = port
            .load_metadata(&NodeId::from("a"))
            .expect("load")
            .expect("metadata stored");
        assert_eq!(stored.perception_history, vec!["8".to_string()]);
    }

    #[test]
    fn execute_missing_node() {
        let mut graph: Graph<()> = Graph::new();
        assert!(matches!(
            execute_node(&mut graph, "ghost"),
            Err(HelixError::NodeNotFound(_))
        ));
    }
}
