//! Next-version resolution against the registry
//!
//! Each resolution is independent and reflects the registry at call time;
//! nothing is cached across repositories. The resolver is only consulted for
//! images about to be rebuilt (or, via [`VersionResolver::current_version`],
//! for parents excluded from the rebuild), never to re-derive a binding the
//! run already produced.

use imgtree_core::{RepoName, Version};

use crate::adapter::{Registry, RegistryError};

/// Resolves version numbers by consulting a [`Registry`].
pub struct VersionResolver<'a> {
    registry: &'a dyn Registry,
}

impl<'a> VersionResolver<'a> {
    pub fn new(registry: &'a dyn Registry) -> Self {
        Self { registry }
    }

    /// Version the next build of `repo` should publish: one past the highest
    /// numeric tag, or [`Version::FIRST`] when nothing numeric is published.
    /// Non-numeric tags (`latest`, digests) are ignored.
    pub async fn next_version(&self, repo: &RepoName) -> Result<Version, RegistryError> {
        let next = match self.max_published(repo).await? {
            Some(current) => current.next(),
            None => Version::FIRST,
        };
        tracing::debug!(repo = %repo, version = %next, "resolved next version");
        Ok(next)
    }

    /// Latest published version, for an image bound without a rebuild.
    pub async fn current_version(&self, repo: &RepoName) -> Result<Version, RegistryError> {
        self.max_published(repo)
            .await?
            .ok_or_else(|| RegistryError::NoPublishedVersion { repo: repo.clone() })
    }

    async fn max_published(&self, repo: &RepoName) -> Result<Option<Version>, RegistryError> {
        let tags = self.registry.list_tags(repo).await?;
        Ok(tags.iter().filter_map(|tag| Version::parse_tag(tag)).max())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRegistry;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn next_is_one_past_the_max_ignoring_malformed_tags() {
        let registry = MockRegistry::new();
        registry
            .set_tags("base", &["v001", "v002", "v004", "latest"])
            .await;

        let resolver = VersionResolver::new(&registry);
        let version = resolver.next_version(&RepoName::from("base")).await.unwrap();
        assert_eq!(version, Version::new(5));
    }

    #[tokio::test]
    async fn unpublished_repo_starts_at_one() {
        let registry = MockRegistry::new();
        let resolver = VersionResolver::new(&registry);

        let version = resolver.next_version(&RepoName::from("base")).await.unwrap();
        assert_eq!(version, Version::FIRST);
    }

    #[tokio::test]
    async fn only_malformed_tags_also_starts_at_one() {
        let registry = MockRegistry::new();
        registry.set_tags("base", &["latest", "v1.2", "dev"]).await;

        let resolver = VersionResolver::new(&registry);
        let version = resolver.next_version(&RepoName::from("base")).await.unwrap();
        assert_eq!(version, Version::FIRST);
    }

    #[tokio::test]
    async fn registry_failure_is_an_error_not_a_default() {
        let registry = MockRegistry::new().with_all_unreachable();
        let resolver = VersionResolver::new(&registry);

        let err = resolver.next_version(&RepoName::from("base")).await.unwrap_err();
        assert!(matches!(err, RegistryError::Request { .. }));
    }

    #[tokio::test]
    async fn current_version_requires_a_published_tag() {
        let registry = MockRegistry::new();
        registry.set_tags("base", &["v007"]).await;

        let resolver = VersionResolver::new(&registry);
        assert_eq!(
            resolver.current_version(&RepoName::from("base")).await.unwrap(),
            Version::new(7)
        );

        let err = resolver
            .current_version(&RepoName::from("python"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NoPublishedVersion { .. }));
    }
}
