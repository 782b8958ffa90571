//! Build context assembly
//!
//! Stages a self-contained build directory per image: the static context
//! copied verbatim, plus the rendered template written as `Dockerfile` at the
//! directory root. Output directories are keyed by repository name, so
//! concurrent assembly for different images never collides.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use imgtree_core::ImageDescriptor;

/// Rendered template file name at the context root.
pub const DOCKERFILE: &str = "Dockerfile";

/// Assemble the build context for one image under `build_root`.
///
/// A pre-existing output directory is removed first so no stale file from a
/// previous run leaks into the context. The source context is only read,
/// never mutated.
pub fn assemble(
    build_root: &Path,
    descriptor: &ImageDescriptor,
    rendered: &str,
) -> io::Result<PathBuf> {
    let out_dir = build_root.join(descriptor.repo.as_str());
    if out_dir.exists() {
        fs::remove_dir_all(&out_dir)?;
    }
    fs::create_dir_all(&out_dir)?;

    copy_tree(&descriptor.context_dir, &out_dir)?;
    fs::write(out_dir.join(DOCKERFILE), rendered)?;

    tracing::debug!(repo = %descriptor.repo, dir = %out_dir.display(), "assembled context");
    Ok(out_dir)
}

fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgtree_core::RepoName;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn descriptor_in(root: &Path, repo: &str) -> ImageDescriptor {
        let dir = root.join(repo);
        let context_dir = dir.join("context");
        fs::create_dir_all(&context_dir).unwrap();
        ImageDescriptor {
            repo: RepoName::from(repo),
            declared_deps: Default::default(),
            template: String::new(),
            dir,
            context_dir,
        }
    }

    #[test]
    fn writes_dockerfile_and_copies_context_verbatim() {
        let root = TempDir::new().unwrap();
        let descriptor = descriptor_in(root.path(), "base");
        fs::create_dir_all(descriptor.context_dir.join("scripts")).unwrap();
        fs::write(descriptor.context_dir.join("scripts/run.sh"), "#!/bin/sh\n").unwrap();
        fs::write(descriptor.context_dir.join("notes.txt"), "hello").unwrap();

        let build_root = root.path().join("build");
        let out = assemble(&build_root, &descriptor, "FROM mvpstudio/base:v005").unwrap();

        assert_eq!(out, build_root.join("base"));
        assert_eq!(
            fs::read_to_string(out.join(DOCKERFILE)).unwrap(),
            "FROM mvpstudio/base:v005"
        );
        assert_eq!(
            fs::read(out.join("scripts/run.sh")).unwrap(),
            fs::read(descriptor.context_dir.join("scripts/run.sh")).unwrap()
        );
        assert_eq!(fs::read_to_string(out.join("notes.txt")).unwrap(), "hello");
    }

    #[test]
    fn stale_output_is_cleared() {
        let root = TempDir::new().unwrap();
        let descriptor = descriptor_in(root.path(), "base");
        let build_root = root.path().join("build");

        let stale = build_root.join("base");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("leftover.txt"), "old").unwrap();

        let out = assemble(&build_root, &descriptor, "FROM ubuntu").unwrap();
        assert!(!out.join("leftover.txt").exists());
        assert!(out.join(DOCKERFILE).exists());
    }

    #[test]
    fn source_context_is_untouched() {
        let root = TempDir::new().unwrap();
        let descriptor = descriptor_in(root.path(), "base");
        fs::write(descriptor.context_dir.join("notes.txt"), "hello").unwrap();

        assemble(&root.path().join("build"), &descriptor, "FROM ubuntu").unwrap();

        let entries: Vec<_> = fs::read_dir(&descriptor.context_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("notes.txt")]);
        assert_eq!(
            fs::read_to_string(descriptor.context_dir.join("notes.txt")).unwrap(),
            "hello"
        );
    }

    #[test]
    fn distinct_repos_use_distinct_directories() {
        let root = TempDir::new().unwrap();
        let base = descriptor_in(root.path(), "base");
        let python = descriptor_in(root.path(), "python");
        let build_root = root.path().join("build");

        let a = assemble(&build_root, &base, "A").unwrap();
        let b = assemble(&build_root, &python, "B").unwrap();

        assert_ne!(a, b);
        assert_eq!(fs::read_to_string(a.join(DOCKERFILE)).unwrap(), "A");
        assert_eq!(fs::read_to_string(b.join(DOCKERFILE)).unwrap(), "B");
    }
}
