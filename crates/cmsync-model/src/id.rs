//! Identity types
//!
//! Two kinds of identity live side by side in a content model:
//! - [`ResourceId`]: the numeric id an environment assigns on creation.
//!   Meaningless outside the environment that issued it.
//! - [`NodeId`]: `"<kind>:<stable key>"`, identical in every environment.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};

/// The four resource kinds of a content model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Internal tag, keyed by name
    Tag,
    /// Component group, keyed by uuid
    Group,
    /// Component, keyed by name
    Component,
    /// Component preset, keyed by name
    Preset,
}

impl ResourceKind {
    /// Prefix used in node ids
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Group => "group",
            Self::Component => "component",
            Self::Preset => "preset",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Environment-local numeric identifier
///
/// The management API is inconsistent about numbers versus numeric strings
/// (`internal_tag_ids` arrives as `["12", "14"]`), so deserialization accepts
/// both. Serialization always emits a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ResourceId(pub u64);

impl ResourceId {
    /// Wrap a raw id
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Interpret a JSON value (number or numeric string) as an id
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_u64().map(Self),
            serde_json::Value::String(s) => s.trim().parse().ok().map(Self),
            _ => None,
        }
    }
}

impl From<u64> for ResourceId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ResourceIdVisitor;

        impl<'de> serde::de::Visitor<'de> for ResourceIdVisitor {
            type Value = ResourceId;

            fn expecting(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
                formatter.write_str("a non-negative integer id or a numeric string")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ResourceId(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(value)
                    .map(ResourceId)
                    .map_err(|_| E::custom(format!("negative id: {value}")))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value
                    .trim()
                    .parse()
                    .map(ResourceId)
                    .map_err(|_| E::custom(format!("non-numeric id: {value:?}")))
            }
        }

        deserializer.deserialize_any(ResourceIdVisitor)
    }
}

/// Stable, environment-independent node identity: `"<kind>:<stable key>"`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Compose a node id from kind and stable key
    #[must_use]
    pub fn new(kind: ResourceKind, stable_key: &str) -> Self {
        Self(format!("{}:{stable_key}", kind.as_str()))
    }

    /// Node id for a numeric reference that has no stable key in the index
    ///
    /// The `#` marker keeps it apart from any real key, so the edge dangles.
    #[must_use]
    pub fn unresolved(kind: ResourceKind, id: ResourceId) -> Self {
        Self(format!("{}:#{id}", kind.as_str()))
    }

    /// Borrow as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
