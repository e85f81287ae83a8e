//! cmsync content model
//!
//! The records that make up a content model and everything needed to compare
//! them across two environments.
//!
//! # Core Concepts
//!
//! - [`Resource`]: one tag, component group, component or preset record
//! - [`NodeId`]: the `"<kind>:<stable key>"` identity shared by both environments
//! - [`IdIndex`]: environment-local numeric id → stable key lookup
//! - [`normalize`]: strips volatile fields and rewrites ids as stable keys
//! - [`ContentHash`]: 32-byte Blake3 hash over the canonical normalized form
//!
//! # Example
//!
//! ```rust,ignore
//! use cmsync_model::{normalize, ContentHash, IdIndex};
//!
//! let index = IdIndex::from_source(&snapshot);
//! let normalized = normalize(&resource, &index);
//! println!("hash: {}", ContentHash::of_normalized(&normalized).short());
//! ```

#![warn(unreachable_pub)]

mod hash;
mod id;
mod normalize;
mod record;
pub mod schema;
mod snapshot;

pub use hash::ContentHash;
pub use id::{NodeId, ResourceId, ResourceKind};
pub use normalize::{normalize, NormalizedRecord, VOLATILE_FIELDS};
pub use record::{Component, ComponentGroup, Preset, Resource, Tag};
pub use snapshot::{IdIndex, SourceSnapshot, TargetSnapshot};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
