//! Mock registry for testing
//!
//! Stores tag lists in memory and never touches the network. Useful for:
//! - Unit testing version resolution
//! - Orchestrator tests with a fake registry and fake builder
//! - Simulating an unreachable registry

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use imgtree_core::RepoName;

use crate::adapter::{Registry, RegistryError};

/// In-memory registry adapter.
#[derive(Default)]
pub struct MockRegistry {
    /// Published tags by repository name
    tags: Arc<RwLock<HashMap<String, Vec<String>>>>,

    /// Repositories whose lookups fail with a request error
    unreachable: Arc<RwLock<HashSet<String>>>,

    /// Fail every lookup
    fail_all: bool,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every lookup fail, as if the registry were down.
    pub fn with_all_unreachable(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Set the published tags for a repository.
    pub async fn set_tags(&self, repo: &str, tags: &[&str]) {
        self.tags
            .write()
            .await
            .insert(repo.to_string(), tags.iter().map(|t| t.to_string()).collect());
    }

    /// Make lookups for one repository fail.
    pub async fn fail_repo(&self, repo: &str) {
        self.unreachable.write().await.insert(repo.to_string());
    }
}

#[async_trait::async_trait]
impl Registry for MockRegistry {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn list_tags(&self, repo: &RepoName) -> Result<Vec<String>, RegistryError> {
        if self.fail_all || self.unreachable.read().await.contains(repo.as_str()) {
            return Err(RegistryError::Request {
                repo: repo.clone(),
                message: "registry unreachable".to_string(),
            });
        }

        Ok(self
            .tags
            .read()
            .await
            .get(repo.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_stored_tags() {
        let registry = MockRegistry::new();
        registry.set_tags("base", &["v001", "latest"]).await;

        let tags = registry.list_tags(&RepoName::from("base")).await.unwrap();
        assert_eq!(tags, vec!["v001".to_string(), "latest".to_string()]);
    }

    #[tokio::test]
    async fn unknown_repo_has_no_tags() {
        let registry = MockRegistry::new();
        let tags = registry.list_tags(&RepoName::from("base")).await.unwrap();
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn unreachable_repo_errors() {
        let registry = MockRegistry::new();
        registry.fail_repo("base").await;

        let err = registry.list_tags(&RepoName::from("base")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Request { .. }));
    }
}
