//! Registry adapter trait

use imgtree_core::RepoName;

/// Errors that can occur when querying the registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry request for '{repo}' failed: {message}")]
    Request { repo: RepoName, message: String },

    #[error("registry returned an invalid response for '{repo}': {message}")]
    InvalidResponse { repo: RepoName, message: String },

    #[error("repository '{repo}' has no published version")]
    NoPublishedVersion { repo: RepoName },
}

/// Trait for registries that can list published version tags.
///
/// A failure here must surface as an error, never as an empty tag list:
/// silently defaulting would let a rebuild publish version 1 over an
/// existing higher version.
#[async_trait::async_trait]
pub trait Registry: Send + Sync {
    /// The adapter name (e.g. "DockerHub")
    fn name(&self) -> &'static str;

    /// All published tags for a repository, in registry order. May be empty
    /// for a repository that has never been published.
    async fn list_tags(&self, repo: &RepoName) -> Result<Vec<String>, RegistryError>;
}
