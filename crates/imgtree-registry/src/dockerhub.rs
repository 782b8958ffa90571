//! Docker Hub tag listing
//!
//! Uses the `/v2/repositories/{ns}/{repo}/tags` listing endpoint. This is
//! not the documented OCI distribution API (that one requires a token even
//! for public tag data); it is the endpoint the Hub web UI itself pages
//! through, and it serves public repositories unauthenticated.

use reqwest::Client;
use serde::Deserialize;

use imgtree_core::{Config, RepoName};

use crate::adapter::{Registry, RegistryError};

/// One page of the Docker Hub tag listing.
#[derive(Debug, Deserialize)]
struct TagPage {
    results: Vec<TagEntry>,

    /// Absolute URL of the next page, if any.
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Registry adapter backed by the public Docker Hub API.
pub struct DockerHubRegistry {
    client: Client,
    base_url: String,
    namespace: String,
    page_size: u32,
}

impl DockerHubRegistry {
    pub fn new(base_url: impl Into<String>, namespace: impl Into<String>, page_size: u32) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            namespace: namespace.into(),
            page_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.registry.url.clone(),
            config.namespace.clone(),
            config.registry.page_size,
        )
    }

    fn first_page_url(&self, repo: &RepoName) -> String {
        format!(
            "{}/v2/repositories/{}/{}/tags?page_size={}",
            self.base_url.trim_end_matches('/'),
            self.namespace,
            repo,
            self.page_size
        )
    }
}

#[async_trait::async_trait]
impl Registry for DockerHubRegistry {
    fn name(&self) -> &'static str {
        "DockerHub"
    }

    async fn list_tags(&self, repo: &RepoName) -> Result<Vec<String>, RegistryError> {
        let mut tags = Vec::new();
        let mut next = Some(self.first_page_url(repo));

        while let Some(url) = next {
            tracing::debug!(repo = %repo, url = %url, "fetching tag page");

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| RegistryError::Request {
                    repo: repo.clone(),
                    message: e.to_string(),
                })?;

            let page: TagPage =
                response
                    .json()
                    .await
                    .map_err(|e| RegistryError::InvalidResponse {
                        repo: repo.clone(),
                        message: e.to_string(),
                    })?;

            tags.extend(page.results.into_iter().map(|entry| entry.name));
            next = page.next;
        }

        tracing::debug!(repo = %repo, count = tags.len(), "listed tags");
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_page_url_matches_hub_layout() {
        let registry = DockerHubRegistry::new("https://registry.hub.docker.com", "mvpstudio", 100);
        assert_eq!(
            registry.first_page_url(&RepoName::from("base")),
            "https://registry.hub.docker.com/v2/repositories/mvpstudio/base/tags?page_size=100"
        );
    }

    #[test]
    fn tag_page_deserializes() {
        let json = r#"{
            "count": 3,
            "results": [{"name": "v001"}, {"name": "latest"}],
            "next": "https://registry.hub.docker.com/v2/repositories/mvpstudio/base/tags?page=2"
        }"#;
        let page: TagPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].name, "v001");
        assert!(page.next.is_some());
    }

    #[test]
    fn last_tag_page_has_no_next() {
        let json = r#"{"results": [], "next": null}"#;
        let page: TagPage = serde_json::from_str(json).unwrap();
        assert!(page.results.is_empty());
        assert!(page.next.is_none());
    }
}
