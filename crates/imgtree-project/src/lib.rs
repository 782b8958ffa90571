//! Project model: descriptors, dependency graph, build plan
//!
//! - [`descriptor`] - load image descriptors from a project root
//! - [`graph`] - dependency graph with cycle/unknown-reference detection
//! - [`plan`] - deterministic topological build plan

pub mod descriptor;
pub mod graph;
pub mod plan;

pub use descriptor::{load_project, LoadError, CONTEXT_DIR, TEMPLATE_FILE};
pub use graph::{DependencyGraph, GraphError};
pub use plan::BuildPlan;
