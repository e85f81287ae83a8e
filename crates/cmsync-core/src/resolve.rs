//! Rewriting source references to target identifiers
//!
//! | reference | treatment |
//! |-----------|-----------|
//! | `internal_tag_ids`, schema `component_tag_whitelist` | target tag id |
//! | preset `component_id` | target component id |
//! | group `parent_id` | target id of the parent group |
//! | group uuids, `component_whitelist` names | unchanged |
//!
//! A reference whose dependency has no assigned target id keeps its source
//! value. Every dependency without a resolution yields a
//! [`ReferenceWarning`] on the node, except dependencies that are merely
//! pending in a dry run.

use crate::context::{PushContext, Resolution};
use crate::outcome::{ReferenceWarning, UnresolvedReason};
use cmsync_graph::{DependencyGraph, GraphNode};
use cmsync_model::schema;
use cmsync_model::{NodeId, Resource, ResourceId, ResourceKind};
use serde_json::Value;

/// Resolves the references of nodes of one graph within one run
pub(crate) struct Resolver<'a> {
    graph: &'a DependencyGraph,
    ctx: &'a PushContext,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(graph: &'a DependencyGraph, ctx: &'a PushContext) -> Self {
        Self { graph, ctx }
    }

    /// Payload for `node` with references rewritten, plus its warnings
    ///
    /// The payload's own id is the target match's id for an update and `0`
    /// for a create.
    pub(crate) fn resolve(&self, node: &GraphNode) -> (Resource, Vec<ReferenceWarning>) {
        let mut payload = node.source_data.clone();
        match &mut payload {
            Resource::Tag(_) => {}
            Resource::Group(group) => {
                let parent = match (&group.parent_uuid, group.parent_id) {
                    (Some(uuid), _) if !uuid.is_empty() => {
                        Some(NodeId::new(ResourceKind::Group, uuid))
                    }
                    (_, Some(id)) if id.get() != 0 => {
                        Some(self.index_node(ResourceKind::Group, id))
                    }
                    _ => None,
                };
                if let Some(target) = parent.and_then(|p| self.target_id(&p)) {
                    group.parent_id = Some(target);
                }
            }
            Resource::Component(component) => {
                for tag_id in &mut component.internal_tag_ids {
                    let tag = self.index_node(ResourceKind::Tag, *tag_id);
                    if let Some(target) = self.target_id(&tag) {
                        *tag_id = target;
                    }
                }
                schema::rewrite_tag_whitelists(&mut component.schema, |original, id| {
                    let target = self.target_id(&self.index_node(ResourceKind::Tag, id))?;
                    Some(match original {
                        Value::String(_) => Value::String(target.to_string()),
                        _ => Value::from(target.get()),
                    })
                });
            }
            Resource::Preset(preset) => {
                let owner = self.index_node(ResourceKind::Component, preset.component_id);
                if let Some(target) = self.target_id(&owner) {
                    preset.component_id = target;
                }
            }
        }

        payload.set_id(
            node.target_data
                .as_ref()
                .map_or(ResourceId::default(), |t| t.record.id()),
        );

        (payload, self.warnings(node))
    }

    fn index_node(&self, kind: ResourceKind, id: ResourceId) -> NodeId {
        self.graph.source_index().node_id(kind, id)
    }

    fn target_id(&self, node: &NodeId) -> Option<ResourceId> {
        self.ctx.resolutions().target_id(node)
    }

    fn warnings(&self, node: &GraphNode) -> Vec<ReferenceWarning> {
        node.dependencies
            .iter()
            .filter_map(|dep| {
                let reason = match self.ctx.resolutions().get(dep) {
                    Some(Resolution::Assigned(_) | Resolution::Pending) => return None,
                    None if !self.graph.contains(dep) => UnresolvedReason::Dangling,
                    None if self.ctx.has_failed(dep) => UnresolvedReason::DependencyFailed,
                    None => UnresolvedReason::NotYetProcessed,
                };
                Some(ReferenceWarning {
                    dependency: dep.clone(),
                    reason,
                })
            })
            .collect()
    }
}
