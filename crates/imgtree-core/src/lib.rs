//! imgtree Core
//!
//! Core domain model shared by every imgtree crate:
//! - [`image`] - repository names, descriptors, image references
//! - [`version`] - integer versions and their registry tag form
//! - [`bindings`] - run-time repo-to-version bindings
//! - [`config`] - configuration schema (imgtree.toml)
//! - [`report`] - stable, versioned run report

pub mod bindings;
pub mod config;
pub mod image;
pub mod report;
pub mod version;

pub use bindings::VersionBindings;
pub use config::{Config, ConfigError};
pub use image::{ImageDescriptor, ImageRef, RepoName};
pub use report::{ImageOutcome, ImageResult, ReportVersion, RunReport, RunSummary};
pub use version::Version;
