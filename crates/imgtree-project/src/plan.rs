//! Deterministic build-order scheduling
//!
//! Kahn's algorithm with a lexicographic tie-break among ready repos, so an
//! unchanged graph always yields the same order (reproducible logs, diffable
//! output). The plan also exposes ready batches for parallel execution.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use imgtree_core::RepoName;

use crate::graph::{DependencyGraph, GraphError};

/// Ordered build plan: for every edge, the parent appears strictly before
/// the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPlan {
    order: Vec<RepoName>,
    batches: Vec<Vec<RepoName>>,
}

impl BuildPlan {
    /// Schedule the graph. Cycle detection is re-validated here so a plan can
    /// never silently drop unreachable nodes.
    pub fn schedule(graph: &DependencyGraph) -> Result<Self, GraphError> {
        let mut in_degree: BTreeMap<RepoName, usize> = graph
            .nodes()
            .map(|repo| (repo.clone(), graph.parents(repo).len()))
            .collect();

        // Min-heap on repository name: among ready repos, the one that sorts
        // first lexicographically is placed next.
        let mut ready: BinaryHeap<Reverse<RepoName>> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(repo, _)| Reverse(repo.clone()))
            .collect();

        let mut order = Vec::with_capacity(graph.len());
        while let Some(Reverse(repo)) = ready.pop() {
            for child in graph.children(&repo) {
                if let Some(degree) = in_degree.get_mut(&child) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(child));
                    }
                }
            }
            order.push(repo);
        }

        if order.len() != graph.len() {
            let path = graph.find_cycle().unwrap_or_default();
            return Err(GraphError::CyclicDependency { path });
        }

        Ok(Self {
            batches: batches_for(graph, &order),
            order,
        })
    }

    /// The full linear order.
    pub fn order(&self) -> &[RepoName] {
        &self.order
    }

    /// Ready levels: every repo in batch N has all of its parents in batches
    /// strictly before N. Sequential execution walks `order`; parallel
    /// execution runs one batch at a time, the batch boundary acting as the
    /// write-before-read barrier for version bindings.
    pub fn batches(&self) -> &[Vec<RepoName>] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

fn batches_for(graph: &DependencyGraph, order: &[RepoName]) -> Vec<Vec<RepoName>> {
    let mut level: BTreeMap<RepoName, usize> = BTreeMap::new();
    let mut batches: Vec<Vec<RepoName>> = Vec::new();

    // `order` is topological, so every parent's level is already known.
    for repo in order {
        let depth = graph
            .parents(repo)
            .iter()
            .map(|parent| level.get(parent).copied().unwrap_or(0) + 1)
            .max()
            .unwrap_or(0);
        level.insert(repo.clone(), depth);

        if batches.len() <= depth {
            batches.resize_with(depth + 1, Vec::new);
        }
        batches[depth].push(repo.clone());
    }

    for batch in &mut batches {
        batch.sort();
    }
    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgtree_core::ImageDescriptor;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn descriptor(repo: &str, declared: &[&str]) -> ImageDescriptor {
        ImageDescriptor {
            repo: RepoName::from(repo),
            declared_deps: declared.iter().map(|d| RepoName::from(*d)).collect(),
            template: String::new(),
            dir: PathBuf::from(repo),
            context_dir: PathBuf::from(repo).join("context"),
        }
    }

    fn plan_of(descriptors: &[ImageDescriptor]) -> BuildPlan {
        let graph = DependencyGraph::build(descriptors).unwrap();
        BuildPlan::schedule(&graph).unwrap()
    }

    fn names(repos: &[RepoName]) -> Vec<&str> {
        repos.iter().map(RepoName::as_str).collect()
    }

    #[test]
    fn parents_precede_children() {
        let descriptors = vec![
            descriptor("app", &["python"]),
            descriptor("python", &["base"]),
            descriptor("base", &[]),
        ];
        let plan = plan_of(&descriptors);
        assert_eq!(names(plan.order()), vec!["base", "python", "app"]);
    }

    #[test]
    fn every_edge_is_respected() {
        let descriptors = vec![
            descriptor("base", &[]),
            descriptor("jvm", &["base"]),
            descriptor("python", &["base"]),
            descriptor("app", &["python", "jvm"]),
        ];
        let plan = plan_of(&descriptors);
        let graph = DependencyGraph::build(&descriptors).unwrap();

        let index: BTreeMap<_, _> = plan
            .order()
            .iter()
            .enumerate()
            .map(|(i, repo)| (repo.clone(), i))
            .collect();
        for repo in graph.nodes() {
            for parent in graph.parents(repo) {
                assert!(index[&parent] < index[repo], "{parent} must precede {repo}");
            }
        }
    }

    #[test]
    fn ties_break_lexicographically() {
        let descriptors = vec![
            descriptor("zebra", &[]),
            descriptor("alpha", &[]),
            descriptor("mid", &[]),
        ];
        let plan = plan_of(&descriptors);
        assert_eq!(names(plan.order()), vec!["alpha", "mid", "zebra"]);
    }

    #[test]
    fn batches_group_by_ready_level() {
        let descriptors = vec![
            descriptor("base", &[]),
            descriptor("other", &[]),
            descriptor("jvm", &["base"]),
            descriptor("python", &["base"]),
            descriptor("app", &["python", "jvm"]),
        ];
        let plan = plan_of(&descriptors);

        let batches: Vec<Vec<&str>> = plan
            .batches()
            .iter()
            .map(|batch| batch.iter().map(RepoName::as_str).collect())
            .collect();
        assert_eq!(
            batches,
            vec![vec!["base", "other"], vec!["jvm", "python"], vec!["app"]]
        );
    }

    #[test]
    fn schedule_is_reproducible() {
        let descriptors = vec![
            descriptor("base", &[]),
            descriptor("jvm", &["base"]),
            descriptor("python", &["base"]),
        ];
        assert_eq!(plan_of(&descriptors), plan_of(&descriptors));
    }
}
