//! Run-time version bindings
//!
//! A binding exists for a repository only after its build completed (or, for
//! an image that is not being rebuilt this run, after its current published
//! version was fetched). The topological build order guarantees that every
//! key a template references is bound before the template renders; callers
//! must still check and report a miss rather than render a blank.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::image::RepoName;
use crate::version::Version;

/// Mapping from repository name to the version resolved for it this run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VersionBindings {
    map: BTreeMap<RepoName, Version>,
}

impl VersionBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, repo: RepoName, version: Version) {
        self.map.insert(repo, version);
    }

    pub fn get(&self, repo: &RepoName) -> Option<Version> {
        self.map.get(repo).copied()
    }

    pub fn contains(&self, repo: &RepoName) -> bool {
        self.map.contains_key(repo)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RepoName, Version)> {
        self.map.iter().map(|(repo, version)| (repo, *version))
    }

    /// Render mapping restricted to exactly the given template keys, with
    /// versions in their published tag form. Returns the first unbound key
    /// as the error.
    pub fn render_mapping(
        &self,
        keys: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, String>, String> {
        let mut mapping = BTreeMap::new();
        for key in keys {
            let repo = RepoName::from(key.as_str());
            match self.get(&repo) {
                Some(version) => {
                    mapping.insert(key.clone(), version.tag());
                }
                None => return Err(key.clone()),
            }
        }
        Ok(mapping)
    }
}
