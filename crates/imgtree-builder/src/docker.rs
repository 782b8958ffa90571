//! Docker CLI builder
//!
//! Shells out to `docker build` / `docker push`, streaming output to the
//! parent's stdio so build logs stay visible.

use std::path::Path;
use std::process::ExitStatus;
use tokio::process::Command;

use imgtree_core::ImageRef;

use crate::adapter::{BuildError, ImageBuilder};

/// Builder that invokes the `docker` binary.
pub struct DockerCliBuilder {
    program: String,
}

impl DockerCliBuilder {
    pub fn new() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }

    /// Use a different binary (e.g. `podman`).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> std::io::Result<ExitStatus> {
        Command::new(&self.program).args(args).status().await
    }
}

impl Default for DockerCliBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ImageBuilder for DockerCliBuilder {
    fn name(&self) -> &'static str {
        "DockerCli"
    }

    async fn build(&self, context_dir: &Path, image: &ImageRef) -> Result<(), BuildError> {
        let tag = image.to_string();
        let context = context_dir.display().to_string();
        tracing::info!(image = %tag, context = %context, "docker build");

        let status = self
            .run(&["build", "-t", tag.as_str(), context.as_str()])
            .await
            .map_err(|e| BuildError::Io {
                image: tag.clone(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(BuildError::Build {
                image: tag,
                message: format!("docker build exited with {status}"),
            })
        }
    }

    async fn push(&self, image: &ImageRef) -> Result<(), BuildError> {
        let tag = image.to_string();
        tracing::info!(image = %tag, "docker push");

        let status = self
            .run(&["push", tag.as_str()])
            .await
            .map_err(|e| BuildError::Io {
                image: tag.clone(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(BuildError::Push {
                image: tag,
                message: format!("docker push exited with {status}"),
            })
        }
    }
}
