//! The seam to the target environment
//!
//! Implement [`ResourceUpserter`] to define how records are written. The
//! processor does not care whether an upsert is a native endpoint or
//! create-then-update; it only needs the written record back, carrying the
//! id the target assigned.

use crate::error::UpsertError;
use cmsync_model::{Component, ComponentGroup, Preset, Resource, Tag};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Identifier of the environment (space) being written to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentId(pub String);

impl EnvironmentId {
    /// Wrap an environment identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for EnvironmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EnvironmentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for EnvironmentId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Writes one record of each kind to a target environment
///
/// A payload whose `id` is `0` is new to the target; any other id is the id
/// of the existing target record being updated.
#[async_trait::async_trait]
pub trait ResourceUpserter: Send + Sync {
    /// Create or update a tag
    async fn upsert_tag(&self, environment: &EnvironmentId, tag: Tag) -> Result<Tag, UpsertError>;

    /// Create or update a component group
    async fn upsert_group(
        &self,
        environment: &EnvironmentId,
        group: ComponentGroup,
    ) -> Result<ComponentGroup, UpsertError>;

    /// Create or update a component
    async fn upsert_component(
        &self,
        environment: &EnvironmentId,
        component: Component,
    ) -> Result<Component, UpsertError>;

    /// Create or update a preset
    async fn upsert_preset(
        &self,
        environment: &EnvironmentId,
        preset: Preset,
    ) -> Result<Preset, UpsertError>;
}

/// Route `payload` to the upsert for its kind
pub(crate) async fn dispatch(
    upserter: &dyn ResourceUpserter,
    environment: &EnvironmentId,
    payload: Resource,
) -> Result<Resource, UpsertError> {
    Ok(match payload {
        Resource::Tag(tag) => Resource::Tag(upserter.upsert_tag(environment, tag).await?),
        Resource::Group(group) => Resource::Group(upserter.upsert_group(environment, group).await?),
        Resource::Component(component) => {
            Resource::Component(upserter.upsert_component(environment, component).await?)
        }
        Resource::Preset(preset) => {
            Resource::Preset(upserter.upsert_preset(environment, preset).await?)
        }
    })
}
