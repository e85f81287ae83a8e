//! Graph construction
//!
//! [`GraphBuilder`] turns two snapshots into a [`DependencyGraph`]:
//!
//! | node | depends on |
//! |------|------------|
//! | group | its parent group |
//! | component | its group, its tags, everything whitelisted in its schema |
//! | preset | its component |
//!
//! Numeric ids are only ever looked up in the index of the environment they
//! came from, and only to find the stable key; they never become part of a
//! node identity. An id missing from the index produces a dangling edge to a
//! `#<id>` marker node.

use crate::graph::{DependencyGraph, GraphNode, TargetMatch};
use cmsync_model::schema::{self, SchemaRef};
use cmsync_model::{
    normalize, Component, ComponentGroup, IdIndex, NodeId, Preset, Resource, ResourceKind,
    SourceSnapshot, TargetSnapshot,
};
use std::collections::BTreeSet;

/// Builds a [`DependencyGraph`] from a source and a target snapshot
///
/// Usage:
/// ```rust,ignore
/// let graph = GraphBuilder::new(&source, &target).build();
/// ```
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    source: &'a SourceSnapshot,
    target: &'a TargetSnapshot,
    source_index: IdIndex,
    target_index: IdIndex,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder over both snapshots
    #[must_use]
    pub fn new(source: &'a SourceSnapshot, target: &'a TargetSnapshot) -> Self {
        Self {
            source,
            target,
            source_index: IdIndex::from_source(source),
            target_index: IdIndex::from_target(target),
        }
    }

    /// Build the graph
    ///
    /// Never fails: duplicate stable keys keep the last record, missing
    /// dependencies stay as dangling edges, absent target matches are normal.
    #[must_use]
    pub fn build(self) -> DependencyGraph {
        let mut graph = DependencyGraph::new(self.source_index.clone());
        let mut matched = 0usize;

        for resource in self.source.resources() {
            let node = self.node_for(resource);
            if node.target_data.is_some() {
                matched += 1;
            }
            tracing::trace!(
                node = %node.id,
                dependencies = node.dependencies.len(),
                in_target = node.target_data.is_some(),
                "graph node"
            );
            if let Some(replaced) = graph.insert(node) {
                matched -= usize::from(replaced.target_data.is_some());
                tracing::warn!(
                    node = %replaced.id,
                    "duplicate stable key in source, keeping the later record"
                );
            }
        }

        tracing::info!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            matched_in_target = matched,
            "dependency graph built"
        );
        graph
    }

    fn node_for(&self, resource: Resource) -> GraphNode {
        let own_id = resource.node_id();
        let mut dependencies = match &resource {
            Resource::Tag(_) => BTreeSet::new(),
            Resource::Group(group) => self.group_dependencies(group),
            Resource::Component(component) => self.component_dependencies(component),
            Resource::Preset(preset) => self.preset_dependencies(preset),
        };
        dependencies.remove(&own_id);

        let content_hash = normalize(&resource, &self.source_index).content_hash();
        let target_data = self
            .target
            .find(resource.kind(), resource.stable_key())
            .map(|record| TargetMatch {
                content_hash: normalize(&record, &self.target_index).content_hash(),
                record,
            });

        GraphNode::new(resource, dependencies, target_data, content_hash)
    }

    fn group_dependencies(&self, group: &ComponentGroup) -> BTreeSet<NodeId> {
        let parent = match (&group.parent_uuid, group.parent_id) {
            (Some(uuid), _) if !uuid.is_empty() => Some(NodeId::new(ResourceKind::Group, uuid)),
            (_, Some(id)) if id.get() != 0 => {
                Some(self.source_index.node_id(ResourceKind::Group, id))
            }
            _ => None,
        };
        parent.into_iter().collect()
    }

    fn component_dependencies(&self, component: &Component) -> BTreeSet<NodeId> {
        let mut deps = BTreeSet::new();

        if let Some(uuid) = component.component_group_uuid.as_deref().filter(|u| !u.is_empty()) {
            deps.insert(NodeId::new(ResourceKind::Group, uuid));
        }

        deps.extend(
            component
                .internal_tag_ids
                .iter()
                .map(|id| self.source_index.node_id(ResourceKind::Tag, *id)),
        );

        deps.extend(schema::collect_refs(&component.schema).into_iter().map(|r| match r {
            SchemaRef::Component(name) => NodeId::new(ResourceKind::Component, &name),
            SchemaRef::Group(uuid) => NodeId::new(ResourceKind::Group, &uuid),
            SchemaRef::Tag(id) => self.source_index.node_id(ResourceKind::Tag, id),
        }));

        deps
    }

    fn preset_dependencies(&self, preset: &Preset) -> BTreeSet<NodeId> {
        BTreeSet::from([self
            .source_index
            .node_id(ResourceKind::Component, preset.component_id)])
    }
}

/// Build the dependency graph for pushing `source` onto `target`
#[must_use]
pub fn build(source: &SourceSnapshot, target: &TargetSnapshot) -> DependencyGraph {
    GraphBuilder::new(source, target).build()
}
