//! Dockerfile template handling
//!
//! This crate handles:
//! - Enumerating the substitution keys a template references (pure scan)
//! - Rendering templates against a key-to-tag mapping
//! - Error handling for unresolved keys
//!
//! Extraction and rendering are deliberately separate operations: the
//! dependency graph is built from extracted keys before anything renders.

pub mod extract;
pub mod render;

pub use extract::extract_keys;
pub use render::{RenderError, TemplateRenderer};
