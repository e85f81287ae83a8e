//! cmsync core: pushing a content model into a target environment
//!
//! The [`Processor`] walks the levels of a [`cmsync_graph::DependencyGraph`]
//! in order. For every node it either skips (target already identical),
//! or rewrites the record's references to identifiers already assigned in
//! the target and hands the payload to the injected [`ResourceUpserter`].
//!
//! # Architecture
//!
//! ```text
//! SourceSnapshot ─┐
//!                 ├─► GraphBuilder ─► validate_graph ─► determine_processing_order
//! TargetSnapshot ─┘                                          │
//!                                                            ▼
//!                        ResourceUpserter ◄── Processor (level barrier,
//!                                                bounded concurrency)
//!                                                            │
//!                                                            ▼
//!                                                       PushResults
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cmsync_core::prelude::*;
//! use std::sync::Arc;
//!
//! let processor = Processor::new(Arc::new(MyApiClient::new()), PushConfig::new());
//! let report = processor.push(&source, &target, &EnvironmentId::from(12345u64)).await;
//! if report.results.has_failures() {
//!     std::process::exit(1);
//! }
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod outcome;
pub mod processor;
mod resolve;
pub mod upsert;

pub use config::{PushConfig, DEFAULT_CONCURRENCY_LIMIT};
pub use context::{PushContext, Resolution, ResolutionMap};
pub use error::{ConfigError, UpsertError};
pub use outcome::{
    NodeFailure, NodeOutcome, NodeResult, PushAction, PushReport, PushResults, PushSummary,
    ReferenceWarning, UnresolvedReason,
};
pub use processor::Processor;
pub use upsert::{EnvironmentId, ResourceUpserter};

/// Version of cmsync core
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports for running a push
pub mod prelude {
    pub use crate::{
        EnvironmentId, NodeOutcome, Processor, PushAction, PushConfig, PushReport, PushResults,
        ResourceUpserter, UpsertError,
    };
    pub use cmsync_graph::prelude::*;
    pub use cmsync_model::{
        Component, ComponentGroup, Preset, Resource, SourceSnapshot, Tag, TargetSnapshot,
    };
}
