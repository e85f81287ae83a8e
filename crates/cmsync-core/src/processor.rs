//! Level-by-level push of a dependency graph
//!
//! Levels run strictly one after another. Inside a level, nodes are
//! independent of each other and run with at most
//! [`PushConfig::effective_concurrency`] upserts in flight; the level
//! settles completely before the next one starts, so every reference a
//! node needs is resolved by the time the node is processed.

use crate::config::PushConfig;
use crate::context::{PushContext, Resolution};
use crate::error::UpsertError;
use crate::outcome::{NodeFailure, NodeOutcome, NodeResult, PushAction, PushReport, PushResults};
use crate::resolve::Resolver;
use crate::upsert::{dispatch, EnvironmentId, ResourceUpserter};
use cmsync_graph::{
    determine_processing_order, validate_graph, DependencyGraph, GraphBuilder, GraphNode,
};
use cmsync_model::{SourceSnapshot, TargetSnapshot};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Pushes graphs into a target environment through a [`ResourceUpserter`]
#[derive(Clone)]
pub struct Processor {
    upserter: Arc<dyn ResourceUpserter>,
    config: PushConfig,
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Processor {
    /// Create a processor
    #[must_use]
    pub fn new(upserter: Arc<dyn ResourceUpserter>, config: PushConfig) -> Self {
        Self { upserter, config }
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PushConfig {
        &self.config
    }

    /// Build, validate and process in one call
    pub async fn push(
        &self,
        source: &SourceSnapshot,
        target: &TargetSnapshot,
        environment: &EnvironmentId,
    ) -> PushReport {
        let graph = GraphBuilder::new(source, target).build();
        let diagnostics = validate_graph(&graph);
        let results = self.process_all_resources(&graph, environment).await;
        PushReport { diagnostics, results }
    }

    /// Push every node of `graph` into `environment`
    ///
    /// Never fails as a whole: per-node errors are returned in
    /// [`PushResults::failed`] and the remaining nodes still run. Results are
    /// ordered by level, then by node id.
    pub async fn process_all_resources(
        &self,
        graph: &DependencyGraph,
        environment: &EnvironmentId,
    ) -> PushResults {
        let start = Instant::now();
        let ctx = PushContext::new(environment.clone(), self.config.dry_run);
        let levels = determine_processing_order(graph);
        let limit = self.config.effective_concurrency();

        tracing::info!(
            environment = %environment,
            nodes = graph.len(),
            levels = levels.len(),
            concurrency = limit,
            dry_run = self.config.dry_run,
            "starting push"
        );

        let mut results = PushResults::default();
        for level in &levels {
            if level.is_cyclic() {
                tracing::warn!(
                    level = level.index,
                    nodes = level.nodes.len(),
                    "processing cyclic level, references inside it may stay unresolved"
                );
            } else {
                tracing::debug!(level = level.index, nodes = level.nodes.len(), "processing level");
            }

            let nodes = level.nodes.iter().filter_map(|id| graph.get(id));
            let mut settled: Vec<NodeResult> = stream::iter(nodes)
                .map(|node| self.process_node(graph, &ctx, node, level.index))
                .buffer_unordered(limit)
                .collect()
                .await;
            settled.sort_by(|a, b| a.node_id().cmp(b.node_id()));

            for result in settled {
                results.push(result);
            }
        }

        let summary = results.summary();
        let planned =
            summary.count(PushAction::WouldCreate) + summary.count(PushAction::WouldUpdate);
        tracing::info!(
            environment = %environment,
            created = summary.count(PushAction::Created),
            updated = summary.count(PushAction::Updated),
            unchanged = summary.count(PushAction::Unchanged),
            planned,
            failed = summary.failed,
            with_warnings = summary.with_warnings,
            elapsed_ms = start.elapsed().as_millis(),
            "push finished"
        );

        results
    }

    async fn process_node(
        &self,
        graph: &DependencyGraph,
        ctx: &PushContext,
        node: &GraphNode,
        level: usize,
    ) -> NodeResult {
        let existing_id = node.target_data.as_ref().map(|target| target.record.id());

        if node.is_up_to_date() {
            if let Some(id) = existing_id {
                ctx.resolutions().record(node.id.clone(), Resolution::Assigned(id));
            }
            tracing::debug!(
                node = %node.id,
                hash = %node.content_hash.short(),
                "unchanged, skipping"
            );
            return NodeResult::NoOp(NodeOutcome {
                node_id: node.id.clone(),
                kind: node.kind,
                content_hash: node.content_hash,
                level,
                action: PushAction::Unchanged,
                target_id: existing_id,
                payload: None,
                warnings: Vec::new(),
            });
        }

        let (payload, warnings) = Resolver::new(graph, ctx).resolve(node);
        for warning in &warnings {
            tracing::warn!(
                node = %node.id,
                dependency = %warning.dependency,
                reason = ?warning.reason,
                "reference left unresolved"
            );
        }

        if ctx.is_dry_run() {
            let resolution = existing_id.map_or(Resolution::Pending, Resolution::Assigned);
            ctx.resolutions().record(node.id.clone(), resolution);
            let action = if existing_id.is_some() {
                PushAction::WouldUpdate
            } else {
                PushAction::WouldCreate
            };
            tracing::info!(node = %node.id, ?action, "dry run");
            return NodeResult::Success(NodeOutcome {
                node_id: node.id.clone(),
                kind: node.kind,
                content_hash: node.content_hash,
                level,
                action,
                target_id: existing_id,
                payload: Some(payload),
                warnings,
            });
        }

        let call = dispatch(self.upserter.as_ref(), ctx.environment(), payload.clone());
        let written = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(UpsertError::Panicked(panic_message(panic.as_ref()))),
        }
        .and_then(|record| match record.id() {
            id if id.get() == 0 => Err(UpsertError::MissingId { kind: record.kind() }),
            id => Ok(id),
        });

        match written {
            Ok(target_id) => {
                ctx.resolutions().record(node.id.clone(), Resolution::Assigned(target_id));
                let action = if existing_id.is_some() {
                    PushAction::Updated
                } else {
                    PushAction::Created
                };
                tracing::info!(node = %node.id, target_id = %target_id, ?action, "upserted");
                NodeResult::Success(NodeOutcome {
                    node_id: node.id.clone(),
                    kind: node.kind,
                    content_hash: node.content_hash,
                    level,
                    action,
                    target_id: Some(target_id),
                    payload: Some(payload),
                    warnings,
                })
            }
            Err(error) => {
                tracing::error!(node = %node.id, %error, "upsert failed");
                ctx.mark_failed(node.id.clone());
                NodeResult::Failed(NodeFailure {
                    node_id: node.id.clone(),
                    kind: node.kind,
                    level,
                    error,
                    warnings,
                })
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
