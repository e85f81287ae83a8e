//! Environment-independent normal form
//!
//! Two records describe the same content when their normal forms are equal.
//! Normalizing:
//! - drops fields that differ between environments for identical content
//!   ([`VOLATILE_FIELDS`], editor `_uid`s inside preset payloads)
//! - drops component fields the target derives by itself
//! - re-expresses id references by stable key, using the [`IdIndex`] of the
//!   environment the record came from
//!
//! An id the index does not know is kept as the marker `"#<id>"`.

use crate::hash::ContentHash;
use crate::id::{ResourceId, ResourceKind};
use crate::record::{Component, ComponentGroup, Preset, Resource, Tag};
use crate::schema;
use crate::snapshot::IdIndex;
use serde_json::{Map, Value};

/// Fields stripped from every record before comparison
pub const VOLATILE_FIELDS: &[&str] = &["id", "created_at", "updated_at", "space_id"];

/// Component fields maintained by the target itself
const COMPONENT_DERIVED_FIELDS: &[&str] = &["internal_tags_list", "all_presets", "preset_id"];

/// Editor-generated block identity inside preset content
const EDITOR_UID: &str = "_uid";

/// Comparable form of one record
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    value: Value,
}

impl NormalizedRecord {
    /// Normalized JSON
    #[inline]
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.value
    }

    /// Content hash of this normal form
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of_normalized(self)
    }
}

/// Normalize `resource`, resolving its id references through `index`
#[must_use]
pub fn normalize(resource: &Resource, index: &IdIndex) -> NormalizedRecord {
    let value = match resource {
        Resource::Tag(tag) => normalize_tag(tag),
        Resource::Group(group) => normalize_group(group, index),
        Resource::Component(component) => normalize_component(component, index),
        Resource::Preset(preset) => normalize_preset(preset, index),
    };
    NormalizedRecord {
        value: Value::Object(value),
    }
}

fn stable_fields(extra: &Map<String, Value>, dropped: &[&str]) -> Map<String, Value> {
    extra
        .iter()
        .filter(|(key, _)| {
            !VOLATILE_FIELDS.contains(&key.as_str()) && !dropped.contains(&key.as_str())
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn key_or_marker(index: &IdIndex, kind: ResourceKind, id: ResourceId) -> String {
    index
        .stable_key(kind, id)
        .map_or_else(|| format!("#{id}"), str::to_string)
}

fn normalize_tag(tag: &Tag) -> Map<String, Value> {
    let mut out = stable_fields(&tag.extra, &[]);
    out.insert("name".into(), Value::String(tag.name.clone()));
    out
}

fn normalize_group(group: &ComponentGroup, index: &IdIndex) -> Map<String, Value> {
    let mut out = stable_fields(&group.extra, &[]);
    out.insert("uuid".into(), Value::String(group.uuid.clone()));
    out.insert("name".into(), Value::String(group.name.clone()));

    let parent = group.parent_uuid.clone().or_else(|| {
        group
            .parent_id
            .filter(|id| id.get() != 0)
            .map(|id| key_or_marker(index, ResourceKind::Group, id))
    });
    if let Some(parent) = parent {
        out.insert("parent_uuid".into(), Value::String(parent));
    }
    out
}

fn normalize_component(component: &Component, index: &IdIndex) -> Map<String, Value> {
    let mut out = stable_fields(&component.extra, COMPONENT_DERIVED_FIELDS);
    out.insert("name".into(), Value::String(component.name.clone()));

    let mut schema = component.schema.clone();
    schema::rewrite_tag_whitelists(&mut schema, |_, id| {
        Some(Value::String(key_or_marker(index, ResourceKind::Tag, id)))
    });
    out.insert("schema".into(), Value::Object(schema));

    if let Some(uuid) = &component.component_group_uuid {
        out.insert("component_group_uuid".into(), Value::String(uuid.clone()));
    }

    let mut tags: Vec<String> = component
        .internal_tag_ids
        .iter()
        .map(|id| key_or_marker(index, ResourceKind::Tag, *id))
        .collect();
    tags.sort_unstable();
    tags.dedup();
    out.insert(
        "internal_tags".into(),
        Value::Array(tags.into_iter().map(Value::String).collect()),
    );
    out
}

fn normalize_preset(preset: &Preset, index: &IdIndex) -> Map<String, Value> {
    let mut out = stable_fields(&preset.extra, &[]);
    out.insert("name".into(), Value::String(preset.name.clone()));
    out.insert(
        "component".into(),
        Value::String(key_or_marker(index, ResourceKind::Component, preset.component_id)),
    );
    let mut content = preset.preset.clone();
    strip_editor_uids(&mut content);
    out.insert("preset".into(), content);
    out
}

fn strip_editor_uids(value: &mut Value) {
    match value {
        Value::Object(object) => {
            object.remove(EDITOR_UID);
            object.values_mut().for_each(strip_editor_uids);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_editor_uids),
        _ => {}
    }
}
