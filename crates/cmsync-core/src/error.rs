//! Error types for cmsync core
//!
//! Per-node failures never cross the processor boundary as `Err`: they are
//! collected as [`crate::NodeFailure`]s. The enums here describe what went
//! wrong for one node, or for loading configuration.

use cmsync_model::ResourceKind;

/// Failure of one injected upsert call
#[derive(Debug, thiserror::Error)]
pub enum UpsertError {
    /// The target refused the payload
    #[error("rejected by target: {0}")]
    Rejected(String),

    /// The call succeeded but the returned record carries no id
    #[error("target returned {kind} without an assigned id")]
    MissingId {
        /// Kind of the returned record
        kind: ResourceKind,
    },

    /// The upsert future panicked
    #[error("upsert panicked: {0}")]
    Panicked(String),

    /// Anything else raised by the collaborator
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UpsertError {
    /// Shorthand for [`UpsertError::Rejected`]
    #[inline]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed TOML
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A concurrency limit of zero would never make progress
    #[error("concurrency_limit must be at least 1")]
    ZeroConcurrency,
}
