//! Graph analysis utilities: execution ordering and wiring checks.

use std::collections::{BTreeSet, HashMap};

use crate::graph::connection::Connection;
use crate::graph::node::NodeId;

/// Orders nodes so that every data producer runs before its consumers.
///
/// `is_data_edge` selects the connections that carry values; event edges do
/// not constrain the per-tick pull order. Ties keep placement order, and
/// nodes caught in a data cycle are appended in placement order.
pub fn execution_order<F>(nodes: &[NodeId], connections: &[Connection], is_data_edge: F) -> Vec<NodeId>
where
    F: Fn(&Connection) -> bool,
{
    let position: HashMap<NodeId, usize> = nodes.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let mut in_degree = vec![0usize; nodes.len()];
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];

    for conn in connections.iter().filter(|c| is_data_edge(c)) {
        if let (Some(&from), Some(&to)) = (position.get(&conn.from.node_id), position.get(&conn.to.node_id)) {
            if from != to {
                adj[from].push(to);
                in_degree[to] += 1;
            }
        }
    }

    // Kahn's algorithm, always taking the earliest-placed ready node.
    let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut sorted = Vec::with_capacity(nodes.len());
    let mut visited = vec![false; nodes.len()];

    while let Some(i) = ready.pop_first() {
        visited[i] = true;
        sorted.push(nodes[i]);
        for &next in &adj[i] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if sorted.len() < nodes.len() {
        log::warn!(
            "Data cycle detected among {} node(s); running them in placement order",
            nodes.len() - sorted.len()
        );
        sorted.extend(
            nodes
                .iter()
                .enumerate()
                .filter(|(i, _)| !visited[*i])
                .map(|(_, id)| *id),
        );
    }

    sorted
}
