//! Registry adapters for published image versions
//!
//! The orchestrator never trusts local state for version numbers; the
//! registry is the source of truth. This crate provides:
//! - the [`Registry`] adapter trait and [`RegistryError`]
//! - a Docker Hub implementation ([`DockerHubRegistry`])
//! - an in-memory mock for tests ([`MockRegistry`])
//! - the next-version resolver ([`VersionResolver`])

pub mod adapter;
pub mod dockerhub;
pub mod mock;
pub mod resolver;

pub use adapter::{Registry, RegistryError};
pub use dockerhub::DockerHubRegistry;
pub use mock::MockRegistry;
pub use resolver::VersionResolver;
