//! Mock builder for testing
//!
//! Records every build and push invocation instead of running docker, and
//! can be told to fail specific repositories.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use imgtree_core::ImageRef;

use crate::adapter::{BuildError, ImageBuilder};

/// In-memory builder that records invocations.
#[derive(Default)]
pub struct MockBuilder {
    /// Image references built, in call order, with their context directories
    builds: Arc<RwLock<Vec<(String, PathBuf)>>>,

    /// Image references pushed, in call order
    pushes: Arc<RwLock<Vec<String>>>,

    /// Repository names whose build step fails
    fail_builds: Arc<RwLock<HashSet<String>>>,

    /// Repository names whose push step fails
    fail_pushes: Arc<RwLock<HashSet<String>>>,
}

impl MockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the build step fail for a repository.
    pub async fn fail_build(&self, repo: &str) {
        self.fail_builds.write().await.insert(repo.to_string());
    }

    /// Make the push step fail for a repository.
    pub async fn fail_push(&self, repo: &str) {
        self.fail_pushes.write().await.insert(repo.to_string());
    }

    /// Image references built so far (`namespace/repo:tag`).
    pub async fn built(&self) -> Vec<String> {
        self.builds.read().await.iter().map(|(image, _)| image.clone()).collect()
    }

    /// Context directory a repository was built from, if it was built.
    pub async fn context_for(&self, image: &str) -> Option<PathBuf> {
        self.builds
            .read()
            .await
            .iter()
            .find(|(built, _)| built == image)
            .map(|(_, context)| context.clone())
    }

    /// Image references pushed so far.
    pub async fn pushed(&self) -> Vec<String> {
        self.pushes.read().await.clone()
    }
}

#[async_trait::async_trait]
impl ImageBuilder for MockBuilder {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn build(&self, context_dir: &Path, image: &ImageRef) -> Result<(), BuildError> {
        if self.fail_builds.read().await.contains(image.repo.as_str()) {
            return Err(BuildError::Build {
                image: image.to_string(),
                message: "injected build failure".to_string(),
            });
        }
        self.builds
            .write()
            .await
            .push((image.to_string(), context_dir.to_path_buf()));
        Ok(())
    }

    async fn push(&self, image: &ImageRef) -> Result<(), BuildError> {
        if self.fail_pushes.read().await.contains(image.repo.as_str()) {
            return Err(BuildError::Push {
                image: image.to_string(),
                message: "injected push failure".to_string(),
            });
        }
        self.pushes.write().await.push(image.to_string());
        Ok(())
    }
}
