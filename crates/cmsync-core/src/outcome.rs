//! Per-node outcomes and the aggregated push results

use crate::error::UpsertError;
use cmsync_graph::GraphDiagnostics;
use cmsync_model::{ContentHash, NodeId, Resource, ResourceId, ResourceKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Why a reference kept its source value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Referenced resource exists in neither snapshot's graph
    Dangling,
    /// Referenced resource failed to upsert earlier in this run
    DependencyFailed,
    /// Referenced resource shares a flushed cycle level and was not yet written
    NotYetProcessed,
}

/// Annotation on a node whose payload carries a stale reference
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ReferenceWarning {
    /// The dependency that could not be resolved
    pub dependency: NodeId,
    /// Why
    pub reason: UnresolvedReason,
}

/// What happened to a node that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PushAction {
    /// New in the target
    Created,
    /// Existing target record overwritten
    Updated,
    /// Target already identical, nothing sent
    Unchanged,
    /// Dry run: would be created
    WouldCreate,
    /// Dry run: would be updated
    WouldUpdate,
}

/// Successful (or skipped) node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeOutcome {
    /// Node id
    pub node_id: NodeId,
    /// Resource kind
    pub kind: ResourceKind,
    /// Hash of the normalized source record
    pub content_hash: ContentHash,
    /// Level the node was processed in
    pub level: usize,
    /// What happened
    pub action: PushAction,
    /// Target id, once known
    pub target_id: Option<ResourceId>,
    /// Payload sent (or that would be sent); `None` when unchanged
    pub payload: Option<Resource>,
    /// Stale references in the payload
    pub warnings: Vec<ReferenceWarning>,
}

impl NodeOutcome {
    /// Whether the payload carried references that could not be resolved
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Node whose upsert failed
#[derive(Debug)]
pub struct NodeFailure {
    /// Node id
    pub node_id: NodeId,
    /// Resource kind
    pub kind: ResourceKind,
    /// Level the node was processed in
    pub level: usize,
    /// The error raised by the upsert
    pub error: UpsertError,
    /// Stale references in the attempted payload
    pub warnings: Vec<ReferenceWarning>,
}

/// Result of processing one node
#[derive(Debug)]
pub enum NodeResult {
    /// Written, or would be written in a dry run
    Success(NodeOutcome),
    /// Already up to date
    NoOp(NodeOutcome),
    /// Upsert failed
    Failed(NodeFailure),
}

impl NodeResult {
    /// Node this result belongs to
    #[must_use]
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::Success(outcome) | Self::NoOp(outcome) => &outcome.node_id,
            Self::Failed(failure) => &failure.node_id,
        }
    }
}

/// Everything a push run produced
#[derive(Debug, Default)]
pub struct PushResults {
    /// Nodes written, skipped or planned
    pub successful: Vec<NodeOutcome>,
    /// Nodes whose upsert failed
    pub failed: Vec<NodeFailure>,
}

impl PushResults {
    /// Fold one node result in
    pub fn push(&mut self, result: NodeResult) {
        match result {
            NodeResult::Success(outcome) | NodeResult::NoOp(outcome) => {
                self.successful.push(outcome);
            }
            NodeResult::Failed(failure) => self.failed.push(failure),
        }
    }

    /// Whether any node failed
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Outcome for `node`, if it succeeded
    #[must_use]
    pub fn outcome(&self, node: &NodeId) -> Option<&NodeOutcome> {
        self.successful.iter().find(|o| &o.node_id == node)
    }

    /// Failure for `node`, if it failed
    #[must_use]
    pub fn failure(&self, node: &NodeId) -> Option<&NodeFailure> {
        self.failed.iter().find(|f| &f.node_id == node)
    }

    /// Counts per action plus failures and warnings
    #[must_use]
    pub fn summary(&self) -> PushSummary {
        let mut actions = BTreeMap::new();
        for outcome in &self.successful {
            *actions.entry(outcome.action).or_insert(0) += 1;
        }
        PushSummary {
            actions,
            failed: self.failed.len(),
            with_warnings: self.successful.iter().filter(|o| o.has_warnings()).count()
                + self.failed.iter().filter(|f| !f.warnings.is_empty()).count(),
        }
    }
}

/// Diagnostics of the graph a push ran over, next to its results
#[derive(Debug)]
pub struct PushReport {
    /// Dangling edges and cycles found before processing
    pub diagnostics: GraphDiagnostics,
    /// Per-node results
    pub results: PushResults,
}

/// Aggregate counts of a push
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushSummary {
    /// Successful nodes by action
    pub actions: BTreeMap<PushAction, usize>,
    /// Failed nodes
    pub failed: usize,
    /// Nodes carrying at least one reference warning
    pub with_warnings: usize,
}

impl PushSummary {
    /// Count for one action
    #[must_use]
    pub fn count(&self, action: PushAction) -> usize {
        self.actions.get(&action).copied().unwrap_or(0)
    }
}
