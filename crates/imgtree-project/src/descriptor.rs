//! Descriptor loading from the filesystem
//!
//! A project root holds one subdirectory per image; each image directory
//! holds a `Dockerfile.template` and a `context/` directory, and optionally
//! an `image.toml` manifest.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use imgtree_core::{ImageDescriptor, RepoName};

/// Template file every image directory must contain.
pub const TEMPLATE_FILE: &str = "Dockerfile.template";

/// Static context directory every image directory must contain.
pub const CONTEXT_DIR: &str = "context";

/// Optional per-image manifest.
pub const MANIFEST_FILE: &str = "image.toml";

/// Error while loading descriptors from a project root
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("image directory {dir} has a {present} but is missing its {missing}")]
    MalformedDescriptor {
        dir: String,
        present: &'static str,
        missing: &'static str,
    },

    #[error("repository '{repo}' is declared by both {first} and {second}")]
    DuplicateRepository {
        repo: RepoName,
        first: String,
        second: String,
    },

    #[error("invalid image manifest {path}: {message}")]
    InvalidManifest { path: String, message: String },

    #[error("io error while loading project: {0}")]
    Io(#[from] std::io::Error),
}

/// Optional `image.toml` contents: an explicit repository name overriding the
/// directory name, and dependencies the template never references (they still
/// force build-before ordering).
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ImageManifest {
    repo: Option<String>,
    depends_on: Vec<String>,
}

/// Load every image descriptor under `root`.
///
/// Subdirectories with neither a template nor a context are not image
/// directories and are skipped (this covers the build output directory);
/// a subdirectory with exactly one of the two is malformed. Hidden
/// directories are ignored. Results are sorted by repository name.
pub fn load_project(root: &Path) -> Result<Vec<ImageDescriptor>, LoadError> {
    let mut by_repo: BTreeMap<RepoName, ImageDescriptor> = BTreeMap::new();

    let mut dirs: Vec<_> = fs::read_dir(root)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.path())
        .collect();
    dirs.sort();

    for dir in dirs {
        let name = match dir.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if name.starts_with('.') {
            continue;
        }

        let template_path = dir.join(TEMPLATE_FILE);
        let context_dir = dir.join(CONTEXT_DIR);

        match (template_path.is_file(), context_dir.is_dir()) {
            (false, false) => continue,
            (true, false) => {
                return Err(LoadError::MalformedDescriptor {
                    dir: dir.display().to_string(),
                    present: TEMPLATE_FILE,
                    missing: CONTEXT_DIR,
                })
            }
            (false, true) => {
                return Err(LoadError::MalformedDescriptor {
                    dir: dir.display().to_string(),
                    present: CONTEXT_DIR,
                    missing: TEMPLATE_FILE,
                })
            }
            (true, true) => {}
        }

        let manifest = load_manifest(&dir)?;
        let repo = RepoName::from(manifest.repo.unwrap_or(name));
        let template = fs::read_to_string(&template_path)?;

        tracing::info!(repo = %repo, dir = %dir.display(), "found image directory");

        let descriptor = ImageDescriptor {
            repo: repo.clone(),
            declared_deps: manifest
                .depends_on
                .iter()
                .map(|dep| RepoName::from(dep.as_str()))
                .collect(),
            template,
            dir: dir.clone(),
            context_dir,
        };

        if let Some(existing) = by_repo.get(&repo) {
            return Err(LoadError::DuplicateRepository {
                repo,
                first: existing.dir.display().to_string(),
                second: dir.display().to_string(),
            });
        }
        by_repo.insert(repo, descriptor);
    }

    Ok(by_repo.into_values().collect())
}

fn load_manifest(dir: &Path) -> Result<ImageManifest, LoadError> {
    let path = dir.join(MANIFEST_FILE);
    if !path.is_file() {
        return Ok(ImageManifest::default());
    }
    let contents = fs::read_to_string(&path)?;
    toml::from_str(&contents).map_err(|e| LoadError::InvalidManifest {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn write_image(root: &Path, name: &str, template: &str) {
        let dir = root.join(name);
        fs::create_dir_all(dir.join(CONTEXT_DIR)).unwrap();
        fs::write(dir.join(TEMPLATE_FILE), template).unwrap();
    }

    #[test]
    fn loads_descriptors_sorted_by_repo() {
        let root = TempDir::new().unwrap();
        write_image(root.path(), "python", "FROM mvpstudio/base:{{ base }}");
        write_image(root.path(), "base", "FROM ubuntu:24.04");

        let descriptors = load_project(root.path()).unwrap();
        let repos: Vec<_> = descriptors.iter().map(|d| d.repo.as_str()).collect();
        assert_eq!(repos, vec!["base", "python"]);
        assert_eq!(descriptors[1].template, "FROM mvpstudio/base:{{ base }}");
    }

    #[test]
    fn directory_with_neither_part_is_skipped() {
        let root = TempDir::new().unwrap();
        write_image(root.path(), "base", "FROM ubuntu:24.04");
        fs::create_dir_all(root.path().join("build").join("base")).unwrap();
        fs::create_dir_all(root.path().join(".git")).unwrap();

        let descriptors = load_project(root.path()).unwrap();
        assert_eq!(descriptors.len(), 1);
    }

    #[test]
    fn missing_context_is_malformed() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("base");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(TEMPLATE_FILE), "FROM ubuntu:24.04").unwrap();

        let err = load_project(root.path()).unwrap_err();
        assert!(matches!(err, LoadError::MalformedDescriptor { missing, .. } if missing == CONTEXT_DIR));
    }

    #[test]
    fn missing_template_is_malformed() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("base").join(CONTEXT_DIR)).unwrap();

        let err = load_project(root.path()).unwrap_err();
        assert!(matches!(err, LoadError::MalformedDescriptor { missing, .. } if missing == TEMPLATE_FILE));
    }

    #[test]
    fn manifest_overrides_repo_and_declares_deps() {
        let root = TempDir::new().unwrap();
        write_image(root.path(), "base-image", "FROM ubuntu:24.04");
        fs::write(
            root.path().join("base-image").join(MANIFEST_FILE),
            "repo = \"base\"\ndepends_on = [\"toolchain\"]\n",
        )
        .unwrap();

        let descriptors = load_project(root.path()).unwrap();
        assert_eq!(descriptors[0].repo, RepoName::from("base"));
        assert_eq!(
            descriptors[0].declared_deps,
            BTreeSet::from([RepoName::from("toolchain")])
        );
    }

    #[test]
    fn duplicate_repo_names_are_rejected() {
        let root = TempDir::new().unwrap();
        write_image(root.path(), "base", "FROM ubuntu:24.04");
        write_image(root.path(), "base-too", "FROM ubuntu:24.04");
        fs::write(
            root.path().join("base-too").join(MANIFEST_FILE),
            "repo = \"base\"\n",
        )
        .unwrap();

        let err = load_project(root.path()).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateRepository { repo, .. } if repo == RepoName::from("base")));
    }

    #[test]
    fn invalid_manifest_is_reported() {
        let root = TempDir::new().unwrap();
        write_image(root.path(), "base", "FROM ubuntu:24.04");
        fs::write(root.path().join("base").join(MANIFEST_FILE), "repo = [").unwrap();

        let err = load_project(root.path()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidManifest { .. }));
    }
}
