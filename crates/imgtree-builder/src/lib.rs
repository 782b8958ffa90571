//! Image builder adapters
//!
//! The actual build/push mechanism is an external collaborator behind the
//! [`ImageBuilder`] trait: the orchestrator hands it an assembled context
//! directory and a fully qualified image reference, and treats the call as
//! opaque. Ships a Docker CLI implementation and an in-memory mock.

pub mod adapter;
pub mod docker;
pub mod mock;

pub use adapter::{BuildError, ImageBuilder};
pub use docker::DockerCliBuilder;
pub use mock::MockBuilder;
