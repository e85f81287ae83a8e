//! cmsync dependency graph
//!
//! Turns a pair of snapshots into an ordered plan:
//! 1. **Construction**: [`GraphBuilder`] creates one node per source record,
//!    wires dependency edges and attaches the matching target record
//! 2. **Diagnostics**: [`validate_graph`] reports dangling edges and cycles
//! 3. **Scheduling**: [`determine_processing_order`] groups nodes into levels
//!    whose dependencies all sit in earlier levels
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cmsync_graph::prelude::*;
//!
//! let graph = GraphBuilder::new(&source, &target).build();
//! let diagnostics = validate_graph(&graph);
//! for level in determine_processing_order(&graph) {
//!     println!("level {}: {} nodes", level.index, level.nodes.len());
//! }
//! ```

#![warn(unreachable_pub)]

pub mod builder;
pub mod graph;
pub mod scheduler;
pub mod validate;

pub use builder::{build, GraphBuilder};
pub use graph::{DependencyGraph, GraphNode, TargetMatch};
pub use scheduler::{determine_processing_order, Level};
pub use validate::{validate_graph, GraphDiagnostics, MissingDependency};

/// Common imports for building and scheduling graphs
pub mod prelude {
    pub use crate::{
        build, determine_processing_order, validate_graph, DependencyGraph, GraphBuilder,
        GraphDiagnostics, GraphNode, Level, TargetMatch,
    };
}
