//! Graph data types
//!
//! A [`DependencyGraph`] maps node ids to [`GraphNode`]s. Edges live on the
//! nodes as dependency sets and may point at ids that are not in the map;
//! such dangling edges are a valid state handled by the scheduler and the
//! processor, not a construction error.

use cmsync_model::{ContentHash, IdIndex, NodeId, Resource, ResourceKind};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Matching record already present in the target environment
#[derive(Debug, Clone, PartialEq)]
pub struct TargetMatch {
    /// The target record as read
    pub record: Resource,
    /// Hash of the record normalized against the target's own id index
    pub content_hash: ContentHash,
}

/// One resource of the content model
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    /// `"<kind>:<stable key>"`
    pub id: NodeId,
    /// Resource kind
    pub kind: ResourceKind,
    /// Record read from the source environment
    pub source_data: Resource,
    /// Record with the same stable key in the target, if any
    pub target_data: Option<TargetMatch>,
    /// Nodes whose records this node's payload refers to
    pub dependencies: BTreeSet<NodeId>,
    /// Hash of the normalized source record
    pub content_hash: ContentHash,
}

impl GraphNode {
    /// Create a node for `source_data`
    #[must_use]
    pub fn new(
        source_data: Resource,
        dependencies: BTreeSet<NodeId>,
        target_data: Option<TargetMatch>,
        content_hash: ContentHash,
    ) -> Self {
        Self {
            id: source_data.node_id(),
            kind: source_data.kind(),
            source_data,
            target_data,
            dependencies,
            content_hash,
        }
    }

    /// Whether the target already holds identical content
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.target_data
            .as_ref()
            .is_some_and(|target| target.content_hash == self.content_hash)
    }
}

/// Node id → node, plus the source id index needed to resolve references
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: IndexMap<NodeId, GraphNode>,
    source_index: IdIndex,
}

impl DependencyGraph {
    /// Empty graph resolving references through `source_index`
    #[must_use]
    pub fn new(source_index: IdIndex) -> Self {
        Self {
            nodes: IndexMap::new(),
            source_index,
        }
    }

    /// Insert a node, returning the node it replaced
    pub fn insert(&mut self, node: GraphNode) -> Option<GraphNode> {
        self.nodes.insert(node.id.clone(), node)
    }

    /// Node by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Whether `id` names a node of this graph
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of dependency edges, dangling ones included
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.dependencies.len()).sum()
    }

    /// All nodes
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// All node ids
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Source environment id → stable key lookup
    #[inline]
    #[must_use]
    pub fn source_index(&self) -> &IdIndex {
        &self.source_index
    }

    /// Nodes that depend on `id`, sorted
    #[must_use]
    pub fn dependents_of(&self, id: &NodeId) -> Vec<&NodeId> {
        let mut dependents: Vec<&NodeId> = self
            .nodes
            .values()
            .filter(|n| n.dependencies.contains(id))
            .map(|n| &n.id)
            .collect();
        dependents.sort();
        dependents
    }
}
