//! Orchestrated execution of a build plan
//!
//! Walks the plan in topological order. Per image: resolve the next version
//! from the registry, render the template against the keys it references,
//! assemble the context, invoke the builder, then publish the version into
//! the bindings so dependents render against exactly what was just built.
//!
//! Failure policy: a failed image takes its descendants with it; their
//! bindings were never produced, so rendering them would be wrong, not just
//! wasteful. Sequentially that aborts the whole remaining plan; in batched
//! mode, independent images continue.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;

use imgtree_builder::{BuildError, ImageBuilder};
use imgtree_core::{
    Config, ImageDescriptor, ImageOutcome, ImageRef, ImageResult, RepoName, RunReport, Version,
    VersionBindings,
};
use imgtree_project::{load_project, BuildPlan, DependencyGraph, GraphError, LoadError};
use imgtree_registry::{Registry, RegistryError, VersionResolver};
use imgtree_template::{extract_keys, RenderError, TemplateRenderer};

use crate::assemble::assemble;

/// Fatal error raised before any registry or builder call.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("unknown repository '{repo}' in selection")]
    UnknownSelection { repo: RepoName },
}

/// Per-image execution failure.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    // Unreachable given the topological order; checked anyway so a graph or
    // ordering bug surfaces as an error instead of a blank in a Dockerfile.
    #[error("'{repo}' would render before its dependency '{dependency}' was bound")]
    UnresolvedReference { repo: RepoName, dependency: String },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("context assembly failed: {0}")]
    Assemble(#[from] std::io::Error),

    #[error(transparent)]
    Build(#[from] BuildError),
}

impl ExecError {
    fn kind(&self) -> &'static str {
        match self {
            ExecError::Registry(_) => "registry",
            ExecError::UnresolvedReference { .. } => "unresolved_reference",
            ExecError::Render(_) => "render",
            ExecError::Assemble(_) => "assemble",
            ExecError::Build(_) => "build",
        }
    }

    /// Internal invariant violations poison the whole run, not just the
    /// affected subtree.
    fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExecError::UnresolvedReference { .. } | ExecError::Render(_)
        )
    }

    fn into_outcome(self) -> ImageOutcome {
        ImageOutcome::Failed {
            kind: self.kind().to_string(),
            error: self.to_string(),
        }
    }
}

/// How the plan is walked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One image at a time, in plan order. First failure aborts the rest.
    #[default]
    Sequential,

    /// Ready batches run concurrently; the batch boundary is the
    /// write-before-read barrier for version bindings. A failure skips
    /// descendants only.
    Batched,
}

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Build only these repositories. Parents outside the selection are
    /// bound to their current published version instead of being rebuilt.
    pub only: Option<BTreeSet<RepoName>>,

    /// Push images after building them.
    pub push: bool,

    pub mode: ExecutionMode,
}

impl RunOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            only: None,
            push: config.push,
            mode: if config.parallel {
                ExecutionMode::Batched
            } else {
                ExecutionMode::Sequential
            },
        }
    }
}

/// Drives a full run: load, graph, schedule, execute.
pub struct Orchestrator {
    config: Config,
    registry: Arc<dyn Registry>,
    builder: Arc<dyn ImageBuilder>,
    renderer: Arc<TemplateRenderer>,
}

impl Orchestrator {
    pub fn new(
        config: Config,
        registry: Arc<dyn Registry>,
        builder: Arc<dyn ImageBuilder>,
    ) -> Self {
        Self {
            config,
            registry,
            builder,
            renderer: Arc::new(TemplateRenderer::new()),
        }
    }

    /// Run everything under `root`. Load-time and graph-time errors abort
    /// before the registry or builder is touched at all; per-image errors
    /// land in the report.
    pub async fn run(&self, root: &Path, opts: &RunOptions) -> Result<RunReport, RunError> {
        let descriptors = load_project(root)?;
        let graph = DependencyGraph::build(&descriptors)?;
        let plan = BuildPlan::schedule(&graph)?;

        let selection: BTreeSet<RepoName> = match &opts.only {
            Some(only) => {
                for repo in only {
                    if !graph.nodes().any(|n| n == repo) {
                        return Err(RunError::UnknownSelection { repo: repo.clone() });
                    }
                }
                only.clone()
            }
            None => graph.nodes().cloned().collect(),
        };

        tracing::info!(
            images = graph.len(),
            selected = selection.len(),
            mode = ?opts.mode,
            "starting run"
        );

        Ok(self
            .execute(root, &descriptors, &graph, &plan, &selection, opts)
            .await)
    }

    async fn execute(
        &self,
        root: &Path,
        descriptors: &[ImageDescriptor],
        graph: &DependencyGraph,
        plan: &BuildPlan,
        selection: &BTreeSet<RepoName>,
        opts: &RunOptions,
    ) -> RunReport {
        let by_repo: BTreeMap<&RepoName, &ImageDescriptor> =
            descriptors.iter().map(|d| (&d.repo, d)).collect();
        let build_root = root.join(&self.config.build_dir);
        let resolver = VersionResolver::new(self.registry.as_ref());

        let mut bindings = VersionBindings::new();
        let mut outcomes: BTreeMap<RepoName, ImageOutcome> = BTreeMap::new();

        // Parents outside the selection are not rebuilt; bind their current
        // published version so dependents render against something real.
        for repo in reused_parents(&by_repo, selection) {
            match resolver.current_version(&repo).await {
                Ok(version) => {
                    tracing::info!(repo = %repo, version = %version, "reusing published version");
                    bindings.insert(repo.clone(), version);
                    outcomes.insert(repo, ImageOutcome::Reused { version });
                }
                Err(e) => {
                    let err = ExecError::from(e);
                    tracing::error!(repo = %repo, error = %err, "could not bind published version");
                    outcomes.insert(repo, err.into_outcome());
                }
            }
        }

        // The repo whose failure aborted the remainder of the run, if any.
        let mut abort: Option<RepoName> = None;

        for batch in self.batches(plan, selection, opts.mode) {
            // Stage runnable images, skipping anything blocked by an earlier
            // failure. Render mappings are fixed here, before the batch runs:
            // all parents belong to earlier batches, so bindings are stable.
            let mut staged: Vec<(ImageDescriptor, BTreeMap<String, String>)> = Vec::new();

            for repo in batch {
                if let Some(trigger) = &abort {
                    outcomes.insert(
                        repo,
                        ImageOutcome::Skipped {
                            blocked_on: trigger.clone(),
                        },
                    );
                    continue;
                }

                let blocked = graph
                    .parents(&repo)
                    .into_iter()
                    .find(|parent| matches!(outcomes.get(parent), Some(o) if !o.is_success()));
                if let Some(parent) = blocked {
                    tracing::warn!(repo = %repo, blocked_on = %parent, "skipping");
                    outcomes.insert(repo, ImageOutcome::Skipped { blocked_on: parent });
                    continue;
                }

                let descriptor = by_repo[&repo];
                match bindings.render_mapping(&extract_keys(&descriptor.template)) {
                    Ok(mapping) => staged.push((descriptor.clone(), mapping)),
                    Err(key) => {
                        let err = ExecError::UnresolvedReference {
                            repo: repo.clone(),
                            dependency: key,
                        };
                        tracing::error!(repo = %repo, error = %err, "internal ordering bug");
                        outcomes.insert(repo.clone(), err.into_outcome());
                        // Everything already staged this batch is abandoned
                        // along with the rest of the run.
                        for (dropped, _) in staged.drain(..) {
                            outcomes.insert(
                                dropped.repo,
                                ImageOutcome::Skipped {
                                    blocked_on: repo.clone(),
                                },
                            );
                        }
                        abort = Some(repo);
                    }
                }
            }

            let results = match opts.mode {
                ExecutionMode::Sequential => {
                    let mut results = Vec::new();
                    for (descriptor, mapping) in staged {
                        let repo = descriptor.repo.clone();
                        let result = build_one(
                            self.registry.as_ref(),
                            self.builder.as_ref(),
                            &self.renderer,
                            &self.config.namespace,
                            &build_root,
                            &descriptor,
                            &mapping,
                            opts.push,
                        )
                        .await;
                        results.push((repo, result));
                    }
                    results
                }
                ExecutionMode::Batched => {
                    let mut set = JoinSet::new();
                    for (descriptor, mapping) in staged {
                        let registry = Arc::clone(&self.registry);
                        let builder = Arc::clone(&self.builder);
                        let renderer = Arc::clone(&self.renderer);
                        let namespace = self.config.namespace.clone();
                        let build_root = build_root.clone();
                        let push = opts.push;
                        set.spawn(async move {
                            let repo = descriptor.repo.clone();
                            let result = build_one(
                                registry.as_ref(),
                                builder.as_ref(),
                                &renderer,
                                &namespace,
                                &build_root,
                                &descriptor,
                                &mapping,
                                push,
                            )
                            .await;
                            (repo, result)
                        });
                    }

                    let mut results = Vec::new();
                    while let Some(joined) = set.join_next().await {
                        match joined {
                            Ok(result) => results.push(result),
                            Err(e) => {
                                // A panicking build task is an internal bug;
                                // log it rather than hang the run.
                                tracing::error!(error = %e, "build task panicked");
                            }
                        }
                    }
                    results.sort_by(|(a, _), (b, _)| a.cmp(b));
                    results
                }
            };

            for (repo, result) in results {
                match result {
                    Ok(version) => {
                        tracing::info!(repo = %repo, version = %version, "built");
                        bindings.insert(repo.clone(), version);
                        outcomes.insert(
                            repo,
                            ImageOutcome::Built {
                                version,
                                pushed: opts.push,
                            },
                        );
                    }
                    Err(err) => {
                        tracing::error!(repo = %repo, error = %err, "image failed");
                        let fatal = err.is_fatal();
                        outcomes.insert(repo.clone(), err.into_outcome());
                        if fatal || opts.mode == ExecutionMode::Sequential {
                            abort.get_or_insert(repo);
                        }
                    }
                }
            }
        }

        let results = plan
            .order()
            .iter()
            .filter_map(|repo| {
                outcomes.get(repo).map(|outcome| ImageResult {
                    repo: repo.clone(),
                    outcome: outcome.clone(),
                })
            })
            .collect();
        RunReport::from_results(results)
    }

    /// The plan restricted to the selection: singleton batches in plan order
    /// for sequential mode, ready levels for batched mode.
    fn batches(
        &self,
        plan: &BuildPlan,
        selection: &BTreeSet<RepoName>,
        mode: ExecutionMode,
    ) -> Vec<Vec<RepoName>> {
        match mode {
            ExecutionMode::Sequential => plan
                .order()
                .iter()
                .filter(|repo| selection.contains(*repo))
                .map(|repo| vec![repo.clone()])
                .collect(),
            ExecutionMode::Batched => plan
                .batches()
                .iter()
                .map(|batch| {
                    batch
                        .iter()
                        .filter(|repo| selection.contains(*repo))
                        .cloned()
                        .collect::<Vec<_>>()
                })
                .filter(|batch| !batch.is_empty())
                .collect(),
        }
    }
}

/// Direct template-referenced parents of selected images that are not
/// themselves selected. Declared-only dependencies outside the selection
/// need no binding: nothing renders their version.
fn reused_parents(
    by_repo: &BTreeMap<&RepoName, &ImageDescriptor>,
    selection: &BTreeSet<RepoName>,
) -> BTreeSet<RepoName> {
    selection
        .iter()
        .filter_map(|repo| by_repo.get(repo))
        .flat_map(|descriptor| extract_keys(&descriptor.template))
        .map(RepoName::from)
        .filter(|repo| !selection.contains(repo))
        .collect()
}

/// One image's build step: resolve, render, assemble, build, push.
#[allow(clippy::too_many_arguments)]
async fn build_one(
    registry: &dyn Registry,
    builder: &dyn ImageBuilder,
    renderer: &TemplateRenderer,
    namespace: &str,
    build_root: &Path,
    descriptor: &ImageDescriptor,
    mapping: &BTreeMap<String, String>,
    push: bool,
) -> Result<Version, ExecError> {
    let resolver = VersionResolver::new(registry);
    let version = resolver.next_version(&descriptor.repo).await?;
    let image = ImageRef::new(namespace, descriptor.repo.clone(), version);
    tracing::info!(image = %image, "building");

    let rendered = renderer.render(&descriptor.template, mapping)?;
    let context = assemble(build_root, descriptor, &rendered)?;

    builder.build(&context, &image).await?;
    if push {
        builder.push(&image).await?;
    }
    Ok(version)
}
