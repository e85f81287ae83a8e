//! Per-run state shared by the nodes of a push
//!
//! One [`PushContext`] lives exactly as long as one
//! [`crate::Processor::process_all_resources`] call. Sibling nodes of a level
//! write to it concurrently, each under its own node id; reads only ever
//! target entries written by earlier levels.

use crate::upsert::EnvironmentId;
use cmsync_model::{NodeId, ResourceId};
use dashmap::{DashMap, DashSet};

/// What a processed node resolved to in the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Written (or already present) under this target id
    Assigned(ResourceId),
    /// Would be written; dry runs only
    Pending,
}

/// Node id → target identifier, write-once per node
#[derive(Debug, Default)]
pub struct ResolutionMap {
    entries: DashMap<NodeId, Resolution>,
}

impl ResolutionMap {
    /// Record the resolution of `node`
    ///
    /// The first write wins; a second write for the same node is ignored and
    /// logged.
    pub fn record(&self, node: NodeId, resolution: Resolution) {
        match self.entries.entry(node) {
            dashmap::mapref::entry::Entry::Occupied(existing) => {
                tracing::warn!(
                    node = %existing.key(),
                    "resolution already recorded, keeping the first"
                );
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(resolution);
            }
        }
    }

    /// Resolution of `node`, if processed
    #[must_use]
    pub fn get(&self, node: &NodeId) -> Option<Resolution> {
        self.entries.get(node).map(|entry| *entry.value())
    }

    /// Target id of `node`, if one was assigned
    #[must_use]
    pub fn target_id(&self, node: &NodeId) -> Option<ResourceId> {
        match self.get(node) {
            Some(Resolution::Assigned(id)) => Some(id),
            _ => None,
        }
    }

    /// Number of recorded nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// State of one push run
#[derive(Debug)]
pub struct PushContext {
    environment: EnvironmentId,
    dry_run: bool,
    resolutions: ResolutionMap,
    failed: DashSet<NodeId>,
}

impl PushContext {
    /// Fresh context for a run against `environment`
    #[must_use]
    pub fn new(environment: EnvironmentId, dry_run: bool) -> Self {
        Self {
            environment,
            dry_run,
            resolutions: ResolutionMap::default(),
            failed: DashSet::new(),
        }
    }

    /// Target environment
    #[inline]
    #[must_use]
    pub fn environment(&self) -> &EnvironmentId {
        &self.environment
    }

    /// Whether upserts are suppressed
    #[inline]
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Resolutions recorded so far
    #[inline]
    #[must_use]
    pub fn resolutions(&self) -> &ResolutionMap {
        &self.resolutions
    }

    /// Mark `node` as failed
    pub fn mark_failed(&self, node: NodeId) {
        self.failed.insert(node);
    }

    /// Whether `node` failed earlier in this run
    #[must_use]
    pub fn has_failed(&self, node: &NodeId) -> bool {
        self.failed.contains(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmsync_model::ResourceKind;

    #[test]
    fn first_resolution_wins() {
        let map = ResolutionMap::default();
        let id = NodeId::new(ResourceKind::Tag, "layout");
        map.record(id.clone(), Resolution::Assigned(ResourceId(500)));
        map.record(id.clone(), Resolution::Assigned(ResourceId(999)));
        assert_eq!(map.target_id(&id), Some(ResourceId(500)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn pending_has_no_target_id() {
        let map = ResolutionMap::default();
        let id = NodeId::new(ResourceKind::Component, "hero");
        map.record(id.clone(), Resolution::Pending);
        assert_eq!(map.get(&id), Some(Resolution::Pending));
        assert_eq!(map.target_id(&id), None);
    }

    #[test]
    fn failures_are_tracked_per_node() {
        let ctx = PushContext::new(EnvironmentId::from(42u64), false);
        let id = NodeId::new(ResourceKind::Group, "g-1");
        assert!(!ctx.has_failed(&id));
        ctx.mark_failed(id.clone());
        assert!(ctx.has_failed(&id));
        assert_eq!(ctx.environment().to_string(), "42");
    }
}
