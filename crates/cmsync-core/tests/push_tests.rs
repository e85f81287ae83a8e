use cmsync_core::{EnvironmentId, Processor, PushAction, PushConfig, UnresolvedReason};
use cmsync_graph::{build, determine_processing_order};
use cmsync_model::{NodeId, Resource, ResourceId, ResourceKind, SourceSnapshot, TargetSnapshot};
use cmsync_test_utils::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn env() -> EnvironmentId {
    EnvironmentId::from(TARGET_SPACE)
}

fn node(kind: ResourceKind, key: &str) -> NodeId {
    NodeId::new(kind, key)
}

async fn push_fresh(
    source: &SourceSnapshot,
    upserter: &Arc<RecordingUpserter>,
) -> cmsync_core::PushResults {
    cmsync_core::logging::init_for_tests();
    let graph = build(source, &TargetSnapshot::default());
    Processor::new(upserter.clone(), PushConfig::new())
        .process_all_resources(&graph, &env())
        .await
}

#[tokio::test]
async fn test_preset_points_at_newly_created_component() {
    let upserter = Arc::new(RecordingUpserter::new(9_000));
    let results = push_fresh(&reconciliation_source(), &upserter).await;

    assert!(!results.has_failures());
    assert_eq!(results.summary().count(PushAction::Created), 4);

    let component = results.outcome(&node(ResourceKind::Component, "hero")).unwrap();
    let preset = results.outcome(&node(ResourceKind::Preset, "hero-default")).unwrap();
    let Some(Resource::Preset(sent)) = &preset.payload else {
        panic!("preset payload expected");
    };
    assert_eq!(Some(sent.component_id), component.target_id);
    assert_ne!(sent.component_id, ResourceId(300));
    assert!(preset.warnings.is_empty());
}

#[tokio::test]
async fn test_tag_ids_rewritten_and_group_whitelist_untouched() {
    let upserter = Arc::new(RecordingUpserter::new(9_000));
    let source = reconciliation_source();
    let results = push_fresh(&source, &upserter).await;

    let tag_id = results
        .outcome(&node(ResourceKind::Tag, "layout"))
        .and_then(|o| o.target_id)
        .unwrap();
    let outcome = results.outcome(&node(ResourceKind::Component, "hero")).unwrap();
    let Some(Resource::Component(sent)) = &outcome.payload else {
        panic!("component payload expected");
    };

    assert_eq!(sent.internal_tag_ids, vec![tag_id]);
    assert_eq!(sent.schema["badges"]["component_tag_whitelist"], json!([tag_id.get()]));
    assert_eq!(
        serde_json::to_string(&sent.schema["body"]).unwrap(),
        serde_json::to_string(&source.components[0].schema["body"]).unwrap()
    );
    assert_eq!(sent.component_group_uuid.as_deref(), Some("shared-group-uuid"));
}

#[tokio::test]
async fn test_second_push_is_a_no_op() {
    let first = Arc::new(RecordingUpserter::new(9_000));
    let source = reconciliation_source();
    push_fresh(&source, &first).await;
    assert_eq!(first.call_count(), 4);

    let target = first.written_target();
    let graph = build(&source, &target);
    let second = Arc::new(RecordingUpserter::default());
    let results = Processor::new(second.clone(), PushConfig::new())
        .process_all_resources(&graph, &env())
        .await;

    assert_eq!(second.call_count(), 0);
    assert_eq!(results.summary().count(PushAction::Unchanged), 4);
}

#[tokio::test]
async fn test_targets_reconciled_by_stable_key() {
    cmsync_core::logging::init_for_tests();
    let graph = build(&reconciliation_source(), &reconciliation_target());

    let target_id = |kind, key| {
        graph
            .get(&node(kind, key))
            .and_then(|n| n.target_data.as_ref())
            .map(|t| t.record.id())
    };
    assert_eq!(target_id(ResourceKind::Component, "hero"), Some(ResourceId(700)));
    assert_eq!(target_id(ResourceKind::Tag, "layout"), Some(ResourceId(500)));
    assert_eq!(target_id(ResourceKind::Group, "shared-group-uuid"), Some(ResourceId(600)));
    assert_eq!(target_id(ResourceKind::Preset, "hero-default"), Some(ResourceId(800)));

    let upserter = Arc::new(RecordingUpserter::default());
    let results = Processor::new(upserter.clone(), PushConfig::new())
        .process_all_resources(&graph, &env())
        .await;
    assert_eq!(upserter.call_count(), 0);
    let preset = node(ResourceKind::Preset, "hero-default");
    let outcome = results.outcome(&preset).unwrap();
    assert_eq!(outcome.target_id, Some(ResourceId(800)));
    assert_eq!(outcome.content_hash, graph.get(&preset).unwrap().content_hash);
}

#[tokio::test]
async fn test_changed_preset_updates_existing_target_record() {
    cmsync_core::logging::init_for_tests();
    let mut source = reconciliation_source();
    source.presets[0].preset = json!({"component": "hero", "headline": "Hello again"});
    let graph = build(&source, &reconciliation_target());

    let upserter = Arc::new(RecordingUpserter::default());
    let results = Processor::new(upserter.clone(), PushConfig::new())
        .process_all_resources(&graph, &env())
        .await;

    assert_eq!(upserter.call_count(), 1);
    let (called_env, sent) = upserter.calls().remove(0);
    assert_eq!(called_env, env());
    let Resource::Preset(sent) = sent else {
        panic!("preset expected");
    };
    assert_eq!(sent.id, ResourceId(800));
    assert_eq!(sent.component_id, ResourceId(700));

    let outcome = results.outcome(&node(ResourceKind::Preset, "hero-default")).unwrap();
    assert_eq!(outcome.action, PushAction::Updated);
    assert_eq!(results.summary().count(PushAction::Unchanged), 3);
}

#[tokio::test]
async fn test_group_hierarchy_created_parent_first() {
    let upserter = Arc::new(RecordingUpserter::new(50));
    let results = push_fresh(&group_chain_source(), &upserter).await;

    let order = upserter.call_order();
    let position = |uuid| order.iter().position(|n| n == &node(ResourceKind::Group, uuid)).unwrap();
    assert!(position("root-uuid") < position("child-uuid"));
    assert!(position("child-uuid") < position("grandchild-uuid"));

    let child_id = results.outcome(&node(ResourceKind::Group, "child-uuid")).unwrap().target_id;
    let grandchild = results.outcome(&node(ResourceKind::Group, "grandchild-uuid")).unwrap();
    let Some(Resource::Group(sent)) = &grandchild.payload else {
        panic!("group payload expected");
    };
    assert_eq!(sent.parent_id, child_id);
    assert_eq!(grandchild.level, 2);
}

#[tokio::test]
async fn test_mutual_whitelist_terminates() {
    let upserter = Arc::new(RecordingUpserter::default());
    let source = mutual_whitelist_source();
    let graph = build(&source, &TargetSnapshot::default());
    let levels = determine_processing_order(&graph);
    assert!(levels.last().unwrap().is_cyclic());

    let results = push_fresh(&source, &upserter).await;
    assert_eq!(results.successful.len(), 4);
    assert!(!results.has_failures());

    let alpha = results.outcome(&node(ResourceKind::Component, "alpha")).unwrap();
    let tag = results.outcome(&node(ResourceKind::Tag, "layout")).unwrap();
    assert!(tag.level < alpha.level);
    let Some(Resource::Component(sent)) = &alpha.payload else {
        panic!("component payload expected");
    };
    assert_eq!(sent.schema["slots"]["component_whitelist"], json!(["beta"]));
    assert_eq!(sent.internal_tag_ids, vec![tag.target_id.unwrap()]);
}

#[tokio::test]
async fn test_preset_of_cyclic_component_keeps_source_id() {
    cmsync_core::logging::init_for_tests();
    let upserter =
        Arc::new(RecordingUpserter::new(1_000).with_delay(std::time::Duration::from_millis(10)));
    let graph = build(&mutual_whitelist_source(), &TargetSnapshot::default());
    let results = Processor::new(upserter.clone(), PushConfig::new())
        .process_all_resources(&graph, &env())
        .await;

    let alpha = results.outcome(&node(ResourceKind::Component, "alpha")).unwrap();
    let preset = results.outcome(&node(ResourceKind::Preset, "alpha-default")).unwrap();
    assert_eq!(preset.level, alpha.level);

    assert_eq!(preset.warnings.len(), 1);
    assert_eq!(preset.warnings[0].dependency, node(ResourceKind::Component, "alpha"));
    assert_eq!(preset.warnings[0].reason, UnresolvedReason::NotYetProcessed);

    let Some(Resource::Preset(sent)) = &preset.payload else {
        panic!("preset payload expected");
    };
    assert_eq!(sent.component_id, ResourceId(1));
    assert_ne!(alpha.target_id, Some(ResourceId(1)));
}

#[tokio::test]
async fn test_dangling_references_degrade_gracefully() {
    let mut source = reconciliation_source();
    source.groups.clear();
    source.components[0].internal_tag_ids.push(ResourceId(999));

    let graph = build(&source, &TargetSnapshot::default());
    let diagnostics = cmsync_graph::validate_graph(&graph);
    assert_eq!(diagnostics.missing.len(), 2);

    let upserter = Arc::new(RecordingUpserter::default());
    let results = push_fresh(&source, &upserter).await;
    assert!(!results.has_failures());

    let hero = results.outcome(&node(ResourceKind::Component, "hero")).unwrap();
    assert_eq!(hero.action, PushAction::Created);
    assert!(hero.warnings.iter().all(|w| w.reason == UnresolvedReason::Dangling));
    assert_eq!(hero.warnings.len(), 2);

    let Some(Resource::Component(sent)) = &hero.payload else {
        panic!("component payload expected");
    };
    assert_eq!(sent.internal_tag_ids[1], ResourceId(999));
}

#[tokio::test]
async fn test_push_reports_diagnostics_with_results() {
    cmsync_core::logging::init_for_tests();
    let upserter = Arc::new(RecordingUpserter::default());
    let report = Processor::new(upserter, PushConfig::new())
        .push(&mutual_whitelist_source(), &TargetSnapshot::default(), &env())
        .await;

    assert_eq!(report.diagnostics.cycles.len(), 1);
    assert!(report.diagnostics.missing.is_empty());
    assert_eq!(report.results.successful.len(), 4);
}

#[tokio::test]
async fn test_dry_run_makes_no_calls() {
    cmsync_core::logging::init_for_tests();
    let mut source = reconciliation_source();
    source.presets[0].preset = json!({"component": "hero", "headline": "Draft"});
    source.tags.push(tag(101, "promo"));
    let graph = build(&source, &reconciliation_target());

    let upserter = Arc::new(RecordingUpserter::default());
    let results = Processor::new(upserter.clone(), PushConfig::new().with_dry_run(true))
        .process_all_resources(&graph, &env())
        .await;

    assert_eq!(upserter.call_count(), 0);
    let summary = results.summary();
    assert_eq!(summary.count(PushAction::WouldCreate), 1);
    assert_eq!(summary.count(PushAction::WouldUpdate), 1);
    assert_eq!(summary.count(PushAction::Unchanged), 3);

    let preset = results.outcome(&node(ResourceKind::Preset, "hero-default")).unwrap();
    assert_eq!(preset.target_id, Some(ResourceId(800)));
    let Some(Resource::Preset(planned)) = &preset.payload else {
        panic!("preset payload expected");
    };
    assert_eq!(planned.component_id, ResourceId(700));
}
