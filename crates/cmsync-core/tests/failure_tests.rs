use cmsync_core::{EnvironmentId, Processor, PushAction, PushConfig, UnresolvedReason, UpsertError};
use cmsync_graph::build;
use cmsync_model::{NodeId, Resource, ResourceId, ResourceKind, SourceSnapshot, TargetSnapshot};
use cmsync_test_utils::*;
use std::sync::Arc;
use std::time::Duration;

async fn run(
    source: &SourceSnapshot,
    upserter: &Arc<RecordingUpserter>,
    config: PushConfig,
) -> cmsync_core::PushResults {
    cmsync_core::logging::init_for_tests();
    let graph = build(source, &TargetSnapshot::default());
    Processor::new(upserter.clone(), config)
        .process_all_resources(&graph, &EnvironmentId::from(TARGET_SPACE))
        .await
}

#[tokio::test]
async fn test_failed_component_annotates_dependents() {
    let hero = NodeId::new(ResourceKind::Component, "hero");
    let upserter = Arc::new(RecordingUpserter::default().failing_on(hero.clone()));
    let results = run(&reconciliation_source(), &upserter, PushConfig::new()).await;

    assert!(results.has_failures());
    let failure = results.failure(&hero).unwrap();
    assert!(matches!(failure.error, UpsertError::Rejected(_)));
    assert_eq!(failure.level, 1);

    // siblings and earlier levels are unaffected
    assert!(results.outcome(&NodeId::new(ResourceKind::Tag, "layout")).is_some());
    assert!(results.outcome(&NodeId::new(ResourceKind::Group, "shared-group-uuid")).is_some());

    let preset = results.outcome(&NodeId::new(ResourceKind::Preset, "hero-default")).unwrap();
    assert_eq!(preset.action, PushAction::Created);
    assert_eq!(preset.warnings.len(), 1);
    assert_eq!(preset.warnings[0].dependency, hero);
    assert_eq!(preset.warnings[0].reason, UnresolvedReason::DependencyFailed);
    let Some(Resource::Preset(sent)) = &preset.payload else {
        panic!("preset payload expected");
    };
    assert_eq!(sent.component_id, ResourceId(300));

    let summary = results.summary();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.with_warnings, 1);
}

#[tokio::test]
async fn test_panicking_upsert_is_contained() {
    let layout = NodeId::new(ResourceKind::Tag, "layout");
    let upserter = Arc::new(RecordingUpserter::default().panicking_on(layout.clone()));
    let results = run(&reconciliation_source(), &upserter, PushConfig::new()).await;

    let failure = results.failure(&layout).unwrap();
    match &failure.error {
        UpsertError::Panicked(message) => assert!(message.contains("simulated crash")),
        other => panic!("expected a panic failure, got {other}"),
    }
    assert_eq!(results.successful.len(), 3);

    let hero = results.outcome(&NodeId::new(ResourceKind::Component, "hero")).unwrap();
    assert_eq!(hero.warnings[0].reason, UnresolvedReason::DependencyFailed);
}

fn many_tags(count: u64) -> SourceSnapshot {
    SourceSnapshot {
        tags: (1..=count).map(|i| tag(i, &format!("tag-{i}"))).collect(),
        ..SourceSnapshot::default()
    }
}

#[tokio::test]
async fn test_concurrency_limit_respected() {
    let upserter = Arc::new(RecordingUpserter::default().with_delay(Duration::from_millis(10)));
    let results = run(&many_tags(12), &upserter, PushConfig::new().with_concurrency_limit(3)).await;

    assert_eq!(results.successful.len(), 12);
    assert!(upserter.max_in_flight() <= 3);
    assert!(upserter.max_in_flight() > 1);
}

#[tokio::test]
async fn test_limit_of_one_serializes_calls() {
    let upserter = Arc::new(RecordingUpserter::default().with_delay(Duration::from_millis(2)));
    run(&many_tags(6), &upserter, PushConfig::new().with_concurrency_limit(1)).await;

    assert_eq!(upserter.call_count(), 6);
    assert_eq!(upserter.max_in_flight(), 1);
}

#[tokio::test]
async fn test_default_limit_caps_a_wide_level() {
    let upserter = Arc::new(RecordingUpserter::default().with_delay(Duration::from_millis(5)));
    run(&many_tags(20), &upserter, PushConfig::default()).await;

    assert!(upserter.max_in_flight() <= cmsync_core::DEFAULT_CONCURRENCY_LIMIT);
}

#[tokio::test]
async fn test_results_are_ordered_by_level_then_node() {
    let upserter = Arc::new(RecordingUpserter::default().with_delay(Duration::from_millis(1)));
    let results = run(&reconciliation_source(), &upserter, PushConfig::new()).await;

    let ids: Vec<String> = results.successful.iter().map(|o| o.node_id.to_string()).collect();
    assert_eq!(
        ids,
        vec![
            "group:shared-group-uuid",
            "tag:layout",
            "component:hero",
            "preset:hero-default",
        ]
    );
}
