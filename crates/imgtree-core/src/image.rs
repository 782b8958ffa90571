//! Image identity and descriptor types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use crate::version::Version;

/// Short repository name of an image, without the registry namespace
/// (e.g. `base`, not `mvpstudio/base`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoName(String);

impl RepoName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RepoName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for RepoName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Static definition of one buildable image, produced by the project loader.
///
/// Descriptors are immutable after load. The version an image will be
/// published under is a run-time concern and lives in
/// [`VersionBindings`](crate::bindings::VersionBindings), never here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Unique repository name, derived from the image directory name unless
    /// overridden in the image manifest.
    pub repo: RepoName,

    /// Dependencies declared explicitly, independent of what the template
    /// references. May be empty.
    pub declared_deps: BTreeSet<RepoName>,

    /// Raw template text (`Dockerfile.template`), read once at load time.
    pub template: String,

    /// Directory this descriptor was loaded from.
    pub dir: PathBuf,

    /// Static context directory whose contents are copied verbatim into the
    /// build context.
    pub context_dir: PathBuf,
}

/// Fully qualified reference to the image a build step produces:
/// `namespace/repo:tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub namespace: String,
    pub repo: RepoName,
    pub version: Version,
}

impl ImageRef {
    pub fn new(namespace: impl Into<String>, repo: RepoName, version: Version) -> Self {
        Self {
            namespace: namespace.into(),
            repo,
            version,
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.repo, self.version.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_name_display() {
        let repo = RepoName::from("base");
        assert_eq!(repo.as_str(), "base");
        assert_eq!(repo.to_string(), "base");
    }

    #[test]
    fn image_ref_display_uses_padded_tag() {
        let image = ImageRef::new("mvpstudio", RepoName::from("base"), Version::new(7));
        assert_eq!(image.to_string(), "mvpstudio/base:v007");
    }
}
