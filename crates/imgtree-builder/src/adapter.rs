//! Builder adapter trait

use std::path::Path;

use imgtree_core::ImageRef;

/// Errors reported by the external builder
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build of {image} failed: {message}")]
    Build { image: String, message: String },

    #[error("push of {image} failed: {message}")]
    Push { image: String, message: String },

    #[error("could not invoke builder for {image}: {source}")]
    Io {
        image: String,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for builders that turn an assembled context into a published image.
#[async_trait::async_trait]
pub trait ImageBuilder: Send + Sync {
    /// The builder name (e.g. "DockerCli")
    fn name(&self) -> &'static str;

    /// Build `image` from a fully assembled context directory.
    async fn build(&self, context_dir: &Path, image: &ImageRef) -> Result<(), BuildError>;

    /// Push a previously built image to the registry.
    async fn push(&self, image: &ImageRef) -> Result<(), BuildError>;
}
