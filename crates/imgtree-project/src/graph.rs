//! Dependency graph construction and traversal
//!
//! The set of parents for an image is the union of its declared dependency
//! list and the keys its template references. A declared dependency the
//! template never uses is still an edge (it forces build-before ordering);
//! a template key that was never declared is an implicit dependency.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use imgtree_core::{ImageDescriptor, RepoName};
use imgtree_template::extract_keys;

/// Error constructing or validating the dependency graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("'{repo}' depends on unknown repository '{dependency}'")]
    UnknownDependency { repo: RepoName, dependency: String },

    #[error("cyclic dependency: {}", format_path(.path))]
    CyclicDependency { path: Vec<RepoName> },
}

fn format_path(path: &[RepoName]) -> String {
    path.iter()
        .map(RepoName::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Dependency graph over image descriptors, with forward and reverse edges.
///
/// Built once per run from the full descriptor set; read-only thereafter.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Forward edges: repo -> repos it depends on (parents)
    parents: BTreeMap<RepoName, BTreeSet<RepoName>>,

    /// Reverse edges: repo -> repos that depend on it (children)
    children: BTreeMap<RepoName, BTreeSet<RepoName>>,

    /// All nodes in the graph
    nodes: BTreeSet<RepoName>,
}

impl DependencyGraph {
    /// Build the graph from loaded descriptors.
    ///
    /// Every referenced name must resolve to a loaded descriptor, and the
    /// result must be acyclic; either violation is fatal before any build.
    pub fn build(descriptors: &[ImageDescriptor]) -> Result<Self, GraphError> {
        let known: BTreeSet<&str> = descriptors.iter().map(|d| d.repo.as_str()).collect();

        let mut parents: BTreeMap<RepoName, BTreeSet<RepoName>> = BTreeMap::new();
        let mut children: BTreeMap<RepoName, BTreeSet<RepoName>> = BTreeMap::new();
        let mut nodes = BTreeSet::new();

        for descriptor in descriptors {
            let mut deps: BTreeSet<RepoName> = descriptor.declared_deps.clone();
            deps.extend(
                extract_keys(&descriptor.template)
                    .into_iter()
                    .map(RepoName::from),
            );

            for dep in &deps {
                if !known.contains(dep.as_str()) {
                    return Err(GraphError::UnknownDependency {
                        repo: descriptor.repo.clone(),
                        dependency: dep.as_str().to_string(),
                    });
                }
                children
                    .entry(dep.clone())
                    .or_default()
                    .insert(descriptor.repo.clone());
            }

            tracing::debug!(repo = %descriptor.repo, deps = ?deps, "resolved parents");

            nodes.insert(descriptor.repo.clone());
            parents.insert(descriptor.repo.clone(), deps);
        }

        let graph = Self {
            parents,
            children,
            nodes,
        };

        if let Some(path) = graph.find_cycle() {
            return Err(GraphError::CyclicDependency { path });
        }

        Ok(graph)
    }

    /// All nodes, in repository-name order.
    pub fn nodes(&self) -> impl Iterator<Item = &RepoName> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Immediate parents (dependencies) of a repo.
    pub fn parents(&self, repo: &RepoName) -> BTreeSet<RepoName> {
        self.parents.get(repo).cloned().unwrap_or_default()
    }

    /// Immediate children (dependents) of a repo.
    pub fn children(&self, repo: &RepoName) -> BTreeSet<RepoName> {
        self.children.get(repo).cloned().unwrap_or_default()
    }

    /// All downstream repos (transitive closure of children): everything
    /// that must be skipped when this repo fails.
    pub fn downstream(&self, repo: &RepoName) -> BTreeSet<RepoName> {
        let mut visited = BTreeSet::new();
        let mut queue: VecDeque<RepoName> = self.children(repo).into_iter().collect();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            for child in self.children(&current) {
                if !visited.contains(&child) {
                    queue.push_back(child);
                }
            }
        }

        visited
    }

    /// Depth-first cycle search tracking the recursion stack. Returns the
    /// offending path, closed by repeating the entry node.
    pub fn find_cycle(&self) -> Option<Vec<RepoName>> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            InStack,
            Done,
        }

        fn visit(
            graph: &DependencyGraph,
            node: &RepoName,
            states: &mut BTreeMap<RepoName, State>,
            stack: &mut Vec<RepoName>,
        ) -> Option<Vec<RepoName>> {
            match states.get(node) {
                Some(State::Done) => return None,
                Some(State::InStack) => {
                    let start = stack.iter().position(|n| n == node).unwrap_or(0);
                    let mut path = stack[start..].to_vec();
                    path.push(node.clone());
                    return Some(path);
                }
                None => {}
            }

            states.insert(node.clone(), State::InStack);
            stack.push(node.clone());

            for parent in graph.parents(node) {
                if let Some(path) = visit(graph, &parent, states, stack) {
                    return Some(path);
                }
            }

            stack.pop();
            states.insert(node.clone(), State::Done);
            None
        }

        let mut states = BTreeMap::new();
        let mut stack = Vec::new();
        for node in &self.nodes {
            if let Some(path) = visit(self, node, &mut states, &mut stack) {
                return Some(path);
            }
        }
        None
    }
}
