use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use imgtree_builder::DockerCliBuilder;
use imgtree_core::{Config, ImageOutcome, RepoName, RunReport};
use imgtree_engine::{ExecutionMode, Orchestrator, RunOptions};
use imgtree_project::{load_project, BuildPlan, DependencyGraph};
use imgtree_registry::DockerHubRegistry;

/// imgtree - build and push a dependency tree of container images
#[derive(Parser)]
#[command(name = "imgtree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: imgtree.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (and push) every image under the project root
    Build {
        /// Project root containing one directory per image
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Build the images but do not push them
        #[arg(short = 'p', long)]
        no_push: bool,

        /// Build only this repository (repeatable). Parents outside the
        /// selection are bound to their current published version.
        #[arg(short, long)]
        only: Vec<String>,

        /// Build independent images concurrently
        #[arg(long)]
        parallel: bool,

        /// Write the JSON run report here
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print the deterministic build order without building anything
    Plan {
        /// Project root containing one directory per image
        #[arg(default_value = ".")]
        root: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Build {
            root,
            no_push,
            only,
            parallel,
            report,
        } => build_command(&config, &root, no_push, only, parallel, report.as_deref()).await,
        Commands::Plan { root } => plan_command(&root),
    }
}

fn load_config(path: Option<&Path>, verbose: bool) -> Result<Config> {
    if let Some(path) = path {
        return Ok(Config::from_file(path)?);
    }
    let default_path = Path::new("imgtree.toml");
    if default_path.exists() {
        return Ok(Config::from_file(default_path)?);
    }
    if verbose {
        eprintln!("{}", "No config file found, using defaults".yellow());
    }
    Ok(Config::default())
}

async fn build_command(
    config: &Config,
    root: &Path,
    no_push: bool,
    only: Vec<String>,
    parallel: bool,
    report_path: Option<&Path>,
) -> Result<()> {
    let registry = Arc::new(DockerHubRegistry::from_config(config));
    let builder = Arc::new(DockerCliBuilder::new());
    let orchestrator = Orchestrator::new(config.clone(), registry, builder);

    let mut opts = RunOptions::from_config(config);
    if no_push {
        opts.push = false;
    }
    if parallel {
        opts.mode = ExecutionMode::Batched;
    }
    if !only.is_empty() {
        opts.only = Some(only.iter().map(|repo| RepoName::from(repo.as_str())).collect::<BTreeSet<_>>());
    }

    let report = orchestrator.run(root, &opts).await?;

    if let Some(path) = report_path {
        std::fs::write(path, report.to_json()?)?;
        eprintln!("{} {}", "Report written to".cyan(), path.display());
    }

    print_summary(&report);

    if !report.succeeded() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!();
    for result in &report.images {
        match &result.outcome {
            ImageOutcome::Built { version, pushed } => {
                let action = if *pushed { "built and pushed" } else { "built" };
                println!(
                    "  {} {} {} ({})",
                    "ok".green().bold(),
                    result.repo,
                    version.tag(),
                    action
                );
            }
            ImageOutcome::Reused { version } => {
                println!(
                    "  {} {} {} (reused published version)",
                    "ok".green(),
                    result.repo,
                    version.tag()
                );
            }
            ImageOutcome::Failed { kind, error } => {
                println!(
                    "  {} {} [{}] {}",
                    "failed".red().bold(),
                    result.repo,
                    kind,
                    error
                );
            }
            ImageOutcome::Skipped { blocked_on } => {
                println!(
                    "  {} {} (blocked on {})",
                    "skipped".yellow(),
                    result.repo,
                    blocked_on
                );
            }
        }
    }

    println!();
    let summary = &report.summary;
    let line = format!(
        "{} images: {} built, {} reused, {} failed, {} skipped",
        summary.total, summary.built, summary.reused, summary.failed, summary.skipped
    );
    if report.succeeded() {
        println!("{}", line.green());
    } else {
        println!("{}", line.red());
    }
}

fn plan_command(root: &Path) -> Result<()> {
    let descriptors = load_project(root)?;
    let graph = DependencyGraph::build(&descriptors)?;
    let plan = BuildPlan::schedule(&graph)?;

    for (position, repo) in plan.order().iter().enumerate() {
        let parents = graph.parents(repo);
        if parents.is_empty() {
            println!("{:>3}. {}", position + 1, repo);
        } else {
            let parents: Vec<&str> = parents.iter().map(|p| p.as_str()).collect();
            println!(
                "{:>3}. {} {}",
                position + 1,
                repo,
                format!("(after {})", parents.join(", ")).dimmed()
            );
        }
    }
    Ok(())
}
