//! Testing utilities for the cmsync workspace
//!
//! Record builders, snapshot scenarios, and a recording fake target.

#![allow(missing_docs)]

use async_trait::async_trait;
use cmsync_core::{EnvironmentId, ResourceUpserter, UpsertError};
use cmsync_model::{
    Component, ComponentGroup, NodeId, Preset, Resource, ResourceId, SourceSnapshot, Tag,
    TargetSnapshot,
};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

pub const TARGET_SPACE: &str = "target-space";

pub fn tag(id: u64, name: &str) -> Tag {
    Tag {
        id: ResourceId(id),
        name: name.to_string(),
        extra: Map::new(),
    }
}

pub fn group(id: u64, uuid: &str, name: &str, parent_id: Option<u64>) -> ComponentGroup {
    ComponentGroup {
        id: ResourceId(id),
        uuid: uuid.to_string(),
        name: name.to_string(),
        parent_id: parent_id.map(ResourceId),
        parent_uuid: None,
        extra: Map::new(),
    }
}

pub fn component(
    id: u64,
    name: &str,
    group_uuid: Option<&str>,
    tag_ids: &[u64],
    schema: Value,
) -> Component {
    let schema = match schema {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Component {
        id: ResourceId(id),
        name: name.to_string(),
        schema,
        component_group_uuid: group_uuid.map(str::to_string),
        internal_tag_ids: tag_ids.iter().copied().map(ResourceId).collect(),
        extra: Map::new(),
    }
}

pub fn preset(id: u64, name: &str, component_id: u64, content: Value) -> Preset {
    Preset {
        id: ResourceId(id),
        name: name.to_string(),
        component_id: ResourceId(component_id),
        preset: content,
        extra: Map::new(),
    }
}

pub fn hero_schema(tag_whitelist: Value) -> Value {
    json!({
        "headline": {"type": "text"},
        "body": {
            "type": "bloks",
            "restrict_type": "groups",
            "component_group_whitelist": ["shared-group-uuid"]
        },
        "badges": {
            "type": "bloks",
            "restrict_type": "tags",
            "component_tag_whitelist": tag_whitelist
        }
    })
}

/// Tag 100, group `shared-group-uuid`, component 300, preset 400 → 300
pub fn reconciliation_source() -> SourceSnapshot {
    SourceSnapshot {
        tags: vec![tag(100, "layout")],
        groups: vec![group(200, "shared-group-uuid", "Shared", None)],
        components: vec![component(
            300,
            "hero",
            Some("shared-group-uuid"),
            &[100],
            hero_schema(json!([100])),
        )],
        presets: vec![preset(
            400,
            "hero-default",
            300,
            json!({"component": "hero", "headline": "Welcome", "_uid": "src-uid"}),
        )],
    }
}

/// The same content model in the target: tag 500, group 600, component 700,
/// preset 800
pub fn reconciliation_target() -> TargetSnapshot {
    TargetSnapshot::from_records(
        vec![tag(500, "layout")],
        vec![group(600, "shared-group-uuid", "Shared", None)],
        vec![component(
            700,
            "hero",
            Some("shared-group-uuid"),
            &[500],
            hero_schema(json!(["500"])),
        )],
        vec![preset(
            800,
            "hero-default",
            700,
            json!({"component": "hero", "headline": "Welcome", "_uid": "target-uid"}),
        )],
    )
}

/// `root` ← `child` ← `grandchild`, listed leaf first
pub fn group_chain_source() -> SourceSnapshot {
    SourceSnapshot {
        groups: vec![
            group(12, "grandchild-uuid", "Grandchild", Some(11)),
            group(11, "child-uuid", "Child", Some(10)),
            group(10, "root-uuid", "Root", None),
        ],
        ..SourceSnapshot::default()
    }
}

/// Components `alpha` and `beta` whitelisting each other
pub fn mutual_whitelist_source() -> SourceSnapshot {
    SourceSnapshot {
        tags: vec![tag(100, "layout")],
        components: vec![
            component(
                1,
                "alpha",
                None,
                &[100],
                json!({"slots": {"type": "bloks", "component_whitelist": ["beta"]}}),
            ),
            component(
                2,
                "beta",
                None,
                &[],
                json!({"slots": {"type": "bloks", "component_whitelist": ["alpha"]}}),
            ),
        ],
        presets: vec![preset(3, "alpha-default", 1, json!({"component": "alpha"}))],
        ..SourceSnapshot::default()
    }
}

/// Fake target that assigns ids and records every call
///
/// New records (id `0`) get sequential ids from `first_id`. Calls can be made
/// to fail or panic per node, and the highest number of calls in flight at
/// once is tracked.
#[derive(Debug)]
pub struct RecordingUpserter {
    next_id: AtomicU64,
    calls: Mutex<Vec<(EnvironmentId, Resource)>>,
    written: Mutex<Vec<Resource>>,
    failing: HashSet<NodeId>,
    panicking: HashSet<NodeId>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for RecordingUpserter {
    fn default() -> Self {
        Self::new(1_000)
    }
}

impl RecordingUpserter {
    pub fn new(first_id: u64) -> Self {
        Self {
            next_id: AtomicU64::new(first_id),
            calls: Mutex::new(Vec::new()),
            written: Mutex::new(Vec::new()),
            failing: HashSet::new(),
            panicking: HashSet::new(),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn failing_on(mut self, node: NodeId) -> Self {
        self.failing.insert(node);
        self
    }

    #[must_use]
    pub fn panicking_on(mut self, node: NodeId) -> Self {
        self.panicking.insert(node);
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(EnvironmentId, Resource)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Node ids in call order
    pub fn call_order(&self) -> Vec<NodeId> {
        self.calls.lock().iter().map(|(_, r)| r.node_id()).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Target as it looks after every successful call so far
    pub fn written_target(&self) -> TargetSnapshot {
        let mut target = TargetSnapshot::default();
        for record in self.written.lock().iter().cloned() {
            target.insert(record);
        }
        target
    }

    async fn upsert(
        &self,
        environment: &EnvironmentId,
        mut record: Resource,
    ) -> Result<Resource, UpsertError> {
        let node = record.node_id();
        self.calls.lock().push((environment.clone(), record.clone()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        assert!(!self.panicking.contains(&node), "simulated crash upserting {node}");
        if self.failing.contains(&node) {
            return Err(UpsertError::rejected(format!("{node} refused")));
        }

        if record.id().get() == 0 {
            record.set_id(ResourceId(self.next_id.fetch_add(1, Ordering::SeqCst)));
        }
        self.written.lock().push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl ResourceUpserter for RecordingUpserter {
    async fn upsert_tag(&self, environment: &EnvironmentId, tag: Tag) -> Result<Tag, UpsertError> {
        match self.upsert(environment, tag.into()).await? {
            Resource::Tag(tag) => Ok(tag),
            other => unreachable!("kind changed to {}", other.kind()),
        }
    }

    async fn upsert_group(
        &self,
        environment: &EnvironmentId,
        group: ComponentGroup,
    ) -> Result<ComponentGroup, UpsertError> {
        match self.upsert(environment, group.into()).await? {
            Resource::Group(group) => Ok(group),
            other => unreachable!("kind changed to {}", other.kind()),
        }
    }

    async fn upsert_component(
        &self,
        environment: &EnvironmentId,
        component: Component,
    ) -> Result<Component, UpsertError> {
        match self.upsert(environment, component.into()).await? {
            Resource::Component(component) => Ok(component),
            other => unreachable!("kind changed to {}", other.kind()),
        }
    }

    async fn upsert_preset(
        &self,
        environment: &EnvironmentId,
        preset: Preset,
    ) -> Result<Preset, UpsertError> {
        match self.upsert(environment, preset.into()).await? {
            Resource::Preset(preset) => Ok(preset),
            other => unreachable!("kind changed to {}", other.kind()),
        }
    }
}
