//! Content-model records
//!
//! Each record names the fields the push pipeline reasons about and keeps
//! everything else in `extra`, so a record read from one environment is
//! written to the other without losing attributes this crate does not know.

use crate::id::{NodeId, ResourceId, ResourceKind};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Deserialize `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Internal tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Environment-local id
    #[serde(default)]
    pub id: ResourceId,
    /// Stable key
    pub name: String,
    /// Unrecognised fields, passed through
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Component group (folder), possibly nested under a parent group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentGroup {
    /// Environment-local id
    #[serde(default)]
    pub id: ResourceId,
    /// Stable key, kept identical across environments
    pub uuid: String,
    /// Display name
    pub name: String,
    /// Environment-local id of the parent group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ResourceId>,
    /// Stable key of the parent group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_uuid: Option<String>,
    /// Unrecognised fields, passed through
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Component definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Environment-local id
    #[serde(default)]
    pub id: ResourceId,
    /// Stable key
    pub name: String,
    /// Field schema; may nest whitelist references at any depth
    #[serde(default, deserialize_with = "null_as_default")]
    pub schema: Map<String, Value>,
    /// Owning group, by uuid
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_group_uuid: Option<String>,
    /// Environment-local tag ids
    #[serde(default, deserialize_with = "null_as_default")]
    pub internal_tag_ids: Vec<ResourceId>,
    /// Unrecognised fields, passed through
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Component preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Environment-local id
    #[serde(default)]
    pub id: ResourceId,
    /// Stable key
    pub name: String,
    /// Environment-local id of the owning component
    pub component_id: ResourceId,
    /// Preset content
    #[serde(default)]
    pub preset: Value,
    /// Unrecognised fields, passed through
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Any record of the content model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "lowercase")]
pub enum Resource {
    /// Tag record
    Tag(Tag),
    /// Group record
    Group(ComponentGroup),
    /// Component record
    Component(Component),
    /// Preset record
    Preset(Preset),
}

impl Resource {
    /// Kind of this record
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Tag(_) => ResourceKind::Tag,
            Self::Group(_) => ResourceKind::Group,
            Self::Component(_) => ResourceKind::Component,
            Self::Preset(_) => ResourceKind::Preset,
        }
    }

    /// Key identifying this record in every environment
    #[must_use]
    pub fn stable_key(&self) -> &str {
        match self {
            Self::Tag(t) => &t.name,
            Self::Group(g) => &g.uuid,
            Self::Component(c) => &c.name,
            Self::Preset(p) => &p.name,
        }
    }

    /// Graph identity of this record
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        NodeId::new(self.kind(), self.stable_key())
    }

    /// Environment-local id
    #[must_use]
    pub const fn id(&self) -> ResourceId {
        match self {
            Self::Tag(t) => t.id,
            Self::Group(g) => g.id,
            Self::Component(c) => c.id,
            Self::Preset(p) => p.id,
        }
    }

    /// Overwrite the environment-local id
    pub fn set_id(&mut self, id: ResourceId) {
        match self {
            Self::Tag(t) => t.id = id,
            Self::Group(g) => g.id = id,
            Self::Component(c) => c.id = id,
            Self::Preset(p) => p.id = id,
        }
    }
}

impl From<Tag> for Resource {
    fn from(value: Tag) -> Self {
        Self::Tag(value)
    }
}

impl From<ComponentGroup> for Resource {
    fn from(value: ComponentGroup) -> Self {
        Self::Group(value)
    }
}

impl From<Component> for Resource {
    fn from(value: Component) -> Self {
        Self::Component(value)
    }
}

impl From<Preset> for Resource {
    fn from(value: Preset) -> Self {
        Self::Preset(value)
    }
}
