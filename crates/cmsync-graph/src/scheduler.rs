//! Processing-order scheduler
//!
//! Kahn's algorithm, emitting whole levels instead of single nodes: every
//! node whose in-graph dependencies are all in earlier levels goes into the
//! next level. Dangling edges are ignored when counting in-degrees.
//!
//! # Cycles
//!
//! When unscheduled nodes remain but none has in-degree zero, all of them are
//! emitted as one final level flagged `cyclic`, and their remaining edges are
//! disregarded. This bounds the run at O(V+E). Order inside that level carries
//! no dependency guarantee.

use crate::graph::DependencyGraph;
use cmsync_model::NodeId;
use serde::Serialize;
use std::collections::HashMap;

/// A batch of nodes that can be processed together
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Level {
    /// Position in the processing order
    pub index: usize,
    /// Node ids, sorted
    pub nodes: Vec<NodeId>,
    /// Produced by the cycle-flush rule
    pub cyclic: bool,
}

impl Level {
    /// Whether this level was produced by flushing a cycle
    #[inline]
    #[must_use]
    pub const fn is_cyclic(&self) -> bool {
        self.cyclic
    }
}

/// Group the nodes of `graph` into dependency-ordered levels
///
/// Every non-cyclic edge `a → b` between existing nodes satisfies
/// `level(b) < level(a)`. A non-empty graph always yields at least one level.
///
/// The cyclic level also takes nodes that only depend on a cycle member, so
/// a preset of a cyclic component shares a level with its component and may
/// be processed before it.
#[must_use]
pub fn determine_processing_order(graph: &DependencyGraph) -> Vec<Level> {
    let mut in_degree: HashMap<&NodeId, usize> = HashMap::with_capacity(graph.len());
    let mut dependents: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();

    for node in graph.nodes() {
        let mut degree = 0;
        for dep in node.dependencies.iter().filter(|dep| graph.contains(dep)) {
            degree += 1;
            dependents.entry(dep).or_default().push(&node.id);
        }
        in_degree.insert(&node.id, degree);
    }

    let mut ready: Vec<&NodeId> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut remaining = in_degree.len();
    let mut levels = Vec::new();

    while remaining > 0 {
        if ready.is_empty() {
            let mut stuck: Vec<NodeId> = in_degree
                .iter()
                .filter(|(_, degree)| **degree > 0)
                .map(|(id, _)| (*id).clone())
                .collect();
            stuck.sort();
            tracing::warn!(
                level = levels.len(),
                nodes = stuck.len(),
                "dependency cycle, scheduling remaining nodes as one final level"
            );
            levels.push(Level {
                index: levels.len(),
                nodes: stuck,
                cyclic: true,
            });
            break;
        }

        let mut current = std::mem::take(&mut ready);
        current.sort();

        for id in &current {
            for dependent in dependents.get(id).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(*dependent);
                    }
                }
            }
        }

        remaining -= current.len();
        tracing::debug!(level = levels.len(), nodes = current.len(), "scheduled level");
        levels.push(Level {
            index: levels.len(),
            nodes: current.into_iter().cloned().collect(),
            cyclic: false,
        });
    }

    levels
}
