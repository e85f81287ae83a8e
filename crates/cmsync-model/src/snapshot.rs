//! In-memory snapshots of both environments
//!
//! The push pipeline does no I/O of its own: callers assemble a
//! [`SourceSnapshot`] (what should exist) and a [`TargetSnapshot`] (what
//! already exists, keyed by stable key) and hand both over.

use crate::id::{NodeId, ResourceId, ResourceKind};
use crate::record::{Component, ComponentGroup, Preset, Resource, Tag};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Records read from the source environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSnapshot {
    /// Tags
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Component groups
    #[serde(default)]
    pub groups: Vec<ComponentGroup>,
    /// Components
    #[serde(default)]
    pub components: Vec<Component>,
    /// Presets
    #[serde(default)]
    pub presets: Vec<Preset>,
}

impl SourceSnapshot {
    /// Total number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len() + self.groups.len() + self.components.len() + self.presets.len()
    }

    /// Whether the snapshot holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records as [`Resource`]s, leaf kinds first
    pub fn resources(&self) -> impl Iterator<Item = Resource> + '_ {
        self.tags
            .iter()
            .cloned()
            .map(Resource::Tag)
            .chain(self.groups.iter().cloned().map(Resource::Group))
            .chain(self.components.iter().cloned().map(Resource::Component))
            .chain(self.presets.iter().cloned().map(Resource::Preset))
    }
}

/// Records already present in the target environment, keyed by stable key
///
/// Empty on a first push.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    /// Tags by name
    #[serde(default)]
    pub tags: HashMap<String, Tag>,
    /// Groups by uuid
    #[serde(default)]
    pub groups: HashMap<String, ComponentGroup>,
    /// Components by name
    #[serde(default)]
    pub components: HashMap<String, Component>,
    /// Presets by name
    #[serde(default)]
    pub presets: HashMap<String, Preset>,
}

impl TargetSnapshot {
    /// Key plain record lists by their stable keys
    #[must_use]
    pub fn from_records(
        tags: Vec<Tag>,
        groups: Vec<ComponentGroup>,
        components: Vec<Component>,
        presets: Vec<Preset>,
    ) -> Self {
        Self {
            tags: tags.into_iter().map(|t| (t.name.clone(), t)).collect(),
            groups: groups.into_iter().map(|g| (g.uuid.clone(), g)).collect(),
            components: components.into_iter().map(|c| (c.name.clone(), c)).collect(),
            presets: presets.into_iter().map(|p| (p.name.clone(), p)).collect(),
        }
    }

    /// Insert or replace a record under its stable key
    pub fn insert(&mut self, resource: Resource) {
        match resource {
            Resource::Tag(t) => {
                self.tags.insert(t.name.clone(), t);
            }
            Resource::Group(g) => {
                self.groups.insert(g.uuid.clone(), g);
            }
            Resource::Component(c) => {
                self.components.insert(c.name.clone(), c);
            }
            Resource::Preset(p) => {
                self.presets.insert(p.name.clone(), p);
            }
        }
    }

    /// Look up the record matching `kind` and `stable_key`
    #[must_use]
    pub fn find(&self, kind: ResourceKind, stable_key: &str) -> Option<Resource> {
        match kind {
            ResourceKind::Tag => self.tags.get(stable_key).cloned().map(Resource::Tag),
            ResourceKind::Group => self.groups.get(stable_key).cloned().map(Resource::Group),
            ResourceKind::Component => self
                .components
                .get(stable_key)
                .cloned()
                .map(Resource::Component),
            ResourceKind::Preset => self.presets.get(stable_key).cloned().map(Resource::Preset),
        }
    }

    /// Total number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len() + self.groups.len() + self.components.len() + self.presets.len()
    }

    /// Whether the snapshot holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Environment-local id → stable key, for the kinds that are referenced by id
///
/// Each environment gets its own index: ids from one are never looked up in
/// the other's. Records carrying id `0` (never persisted) are not indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdIndex {
    tags: HashMap<ResourceId, String>,
    groups: HashMap<ResourceId, String>,
    components: HashMap<ResourceId, String>,
}

impl IdIndex {
    /// Index built from source records
    #[must_use]
    pub fn from_source(snapshot: &SourceSnapshot) -> Self {
        Self::from_iters(
            snapshot.tags.iter(),
            snapshot.groups.iter(),
            snapshot.components.iter(),
        )
    }

    /// Index built from target records
    #[must_use]
    pub fn from_target(snapshot: &TargetSnapshot) -> Self {
        Self::from_iters(
            snapshot.tags.values(),
            snapshot.groups.values(),
            snapshot.components.values(),
        )
    }

    fn from_iters<'a>(
        tags: impl Iterator<Item = &'a Tag>,
        groups: impl Iterator<Item = &'a ComponentGroup>,
        components: impl Iterator<Item = &'a Component>,
    ) -> Self {
        let persisted = |id: ResourceId| id.get() != 0;
        Self {
            tags: tags
                .filter(|t| persisted(t.id))
                .map(|t| (t.id, t.name.clone()))
                .collect(),
            groups: groups
                .filter(|g| persisted(g.id))
                .map(|g| (g.id, g.uuid.clone()))
                .collect(),
            components: components
                .filter(|c| persisted(c.id))
                .map(|c| (c.id, c.name.clone()))
                .collect(),
        }
    }

    /// Stable key for an id of the given kind
    ///
    /// Presets are never referenced by id, so they always return `None`.
    #[must_use]
    pub fn stable_key(&self, kind: ResourceKind, id: ResourceId) -> Option<&str> {
        let table = match kind {
            ResourceKind::Tag => &self.tags,
            ResourceKind::Group => &self.groups,
            ResourceKind::Component => &self.components,
            ResourceKind::Preset => return None,
        };
        table.get(&id).map(String::as_str)
    }

    /// Node id for an id reference; a dangling marker id when unknown
    #[must_use]
    pub fn node_id(&self, kind: ResourceKind, id: ResourceId) -> NodeId {
        self.stable_key(kind, id)
            .map_or_else(|| NodeId::unresolved(kind, id), |key| NodeId::new(kind, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn tag(id: u64, name: &str) -> Tag {
        Tag {
            id: ResourceId(id),
            name: name.into(),
            extra: Map::new(),
        }
    }

    #[test]
    fn index_maps_ids_to_stable_keys() {
        let snapshot = SourceSnapshot {
            tags: vec![tag(100, "layout"), tag(0, "draft")],
            ..SourceSnapshot::default()
        };
        let index = IdIndex::from_source(&snapshot);

        assert_eq!(index.stable_key(ResourceKind::Tag, ResourceId(100)), Some("layout"));
        assert_eq!(index.stable_key(ResourceKind::Tag, ResourceId(0)), None);
        assert_eq!(
            index.node_id(ResourceKind::Tag, ResourceId(7)).as_str(),
            "tag:#7"
        );
    }

    #[test]
    fn target_snapshot_keys_by_stable_key() {
        let mut target =
            TargetSnapshot::from_records(vec![tag(500, "layout")], vec![], vec![], vec![]);
        assert_eq!(target.len(), 1);
        assert!(target.find(ResourceKind::Tag, "layout").is_some());
        assert!(target.find(ResourceKind::Component, "layout").is_none());

        target.insert(Resource::Tag(tag(501, "layout")));
        assert_eq!(target.len(), 1);
        assert_eq!(target.tags["layout"].id, ResourceId(501));
    }

    #[test]
    fn snapshots_deserialize_with_missing_sections() {
        let source: SourceSnapshot =
            serde_json::from_str(r#"{"tags": [{"id": 1, "name": "a"}]}"#).unwrap();
        assert_eq!(source.len(), 1);
        assert!(source.components.is_empty());
    }
}
