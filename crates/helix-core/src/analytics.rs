//! # Analytics
//!
//! Metric functions used by the metric-update hook. Callers with their own
//! notion of importance or permanence pass replacements to
//! `hooks::metric_update_with`.

use crate::node::Node;
use chrono::Utc;

/// Signature of an importance function: `(node, all_nodes) -> score`.
pub type ImportanceFn<P> = fn(&Node<P>, &[&Node<P>]) -> f64;

/// Signature of a permanence function: `node -> score`.
pub type PermanenceFn<P> = fn(&Node<P>) -> f64;

/// Importance is the node's degree.
pub fn compute_importance<P>(node: &Node<P>, _all_nodes: &[&Node<P>]) -> f64 {
    node.degree() as f64
}

/// Permanence is the node's age in seconds.
pub fn compute_permanence<P>(node: &Node<P>) -> f64 {
    node.metadata.age_seconds(Utc::now())
}
