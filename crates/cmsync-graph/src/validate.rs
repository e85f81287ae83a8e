//! Non-fatal graph diagnostics
//!
//! Dangling edges and cycles are legitimate content (a component whitelisting
//! a component that whitelists it back is common), so validation reports and
//! logs, and never fails.

use crate::graph::DependencyGraph;
use cmsync_model::NodeId;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;

/// An edge whose target is not a node of the graph
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MissingDependency {
    /// Node holding the edge
    pub node: NodeId,
    /// Id the edge points at
    pub dependency: NodeId,
}

/// Findings of [`validate_graph`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphDiagnostics {
    /// Dangling edges, sorted
    pub missing: Vec<MissingDependency>,
    /// Groups of nodes that depend on each other, each sorted
    pub cycles: Vec<Vec<NodeId>>,
}

impl GraphDiagnostics {
    /// Whether nothing was found
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.cycles.is_empty()
    }
}

/// Report dangling dependencies and dependency cycles
///
/// Each finding is also logged as a warning.
#[must_use]
pub fn validate_graph(graph: &DependencyGraph) -> GraphDiagnostics {
    let mut missing: Vec<MissingDependency> = graph
        .nodes()
        .flat_map(|node| {
            node.dependencies
                .iter()
                .filter(|dep| !graph.contains(dep))
                .map(|dep| MissingDependency {
                    node: node.id.clone(),
                    dependency: dep.clone(),
                })
        })
        .collect();
    missing.sort();

    for m in &missing {
        tracing::warn!(
            node = %m.node,
            dependency = %m.dependency,
            "dependency not found in source"
        );
    }

    let cycles = find_cycles(graph);
    for cycle in &cycles {
        let members: Vec<&str> = cycle.iter().map(NodeId::as_str).collect();
        tracing::warn!(size = cycle.len(), members = ?members, "dependency cycle");
    }

    GraphDiagnostics { missing, cycles }
}

fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<NodeId>> {
    let mut g: DiGraph<&NodeId, ()> = DiGraph::with_capacity(graph.len(), graph.edge_count());
    let indices: HashMap<&NodeId, NodeIndex> =
        graph.node_ids().map(|id| (id, g.add_node(id))).collect();

    for node in graph.nodes() {
        let from = indices[&node.id];
        for dep in &node.dependencies {
            if let Some(&to) = indices.get(dep) {
                g.add_edge(from, to, ());
            }
        }
    }

    let mut cycles: Vec<Vec<NodeId>> = petgraph::algo::tarjan_scc(&g)
        .into_iter()
        .filter(|component| component.len() > 1)
        .map(|component| {
            let mut ids: Vec<NodeId> = component.into_iter().map(|ix| g[ix].clone()).collect();
            ids.sort();
            ids
        })
        .collect();
    cycles.sort();
    cycles
}
