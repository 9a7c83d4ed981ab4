//! CLI command implementations.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use comprehender_annotator::{
    copy_tree, process_tree, Annotator, AnnotatorConfig, OpenAiConfig, OpenAiService, OutputMode,
    RequestLimits, Summary,
};
use comprehender_core::discover_sources;
use comprehender_graph::{build_graph, to_diagram, to_markdown, ArchitectureGraph, DiagramFormat, GraphBuild};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::Cli;

/// Copies and annotates the repository, then writes the requested reports.
///
/// `progress` is the spinner shown while files are annotated; log output
/// must be routed around it.
pub async fn run(cli: &Cli, progress: &ProgressBar) -> Result<()> {
    let source_count = validate_repo(&cli.repo)?;
    println!("{} Found {} Java files", "✓".green(), source_count.to_string().cyan());

    let repo_name = repo_name(&cli.repo)?;
    fs::create_dir_all(&cli.out)
        .with_context(|| format!("cannot create output directory {}", cli.out.display()))?;

    let output_repo = cli.out.join(format!("{}_commented", repo_name));
    let copied = {
        let src = cli.repo.clone();
        let dest = output_repo.clone();
        tokio::task::spawn_blocking(move || copy_tree(&src, &dest)).await??
    };
    println!(
        "{} Repo copied to {} ({} files)",
        "✓".green(),
        output_repo.display(),
        copied
    );

    annotate(cli, &output_repo, progress).await?;

    if cli.arch_report || cli.visual || cli.architecture {
        // Reports always describe the original tree, not the annotated copy.
        let build = {
            let repo = cli.repo.clone();
            tokio::task::spawn_blocking(move || build_graph(&repo)).await??
        };
        print_graph_build(&build);

        if cli.arch_report {
            let path = write_architecture_report(&build.graph, &cli.out, &repo_name)?;
            println!("{} Architecture report saved to {}", "✓".green(), path.display());
        }

        if cli.visual {
            match write_diagrams(&build.graph, &cli.out, &repo_name)? {
                Some((mermaid, dot)) => {
                    println!("{} Mermaid diagram saved to {}", "✓".green(), mermaid.display());
                    println!("{} Graphviz DOT file saved to {}", "✓".green(), dot.display());
                }
                None => println!("{} No architecture data found, diagrams skipped", "⚠".yellow()),
            }
        }

        if cli.architecture {
            println!("\n{}", to_diagram(&build.graph, cli.diagram_format));
        }
    }

    Ok(())
}

/// Checks that `repo` exists and holds Java sources; returns their count.
fn validate_repo(repo: &Path) -> Result<usize> {
    if !repo.exists() {
        bail!("Repository path does not exist: {}", repo.display());
    }

    let sources = discover_sources(repo)
        .with_context(|| format!("cannot read repository {}", repo.display()))?;
    if sources.is_empty() {
        bail!("No Java files found in: {}", repo.display());
    }

    Ok(sources.len())
}

/// Final path component of the canonical repository path.
fn repo_name(repo: &Path) -> Result<String> {
    let canonical = repo
        .canonicalize()
        .with_context(|| format!("cannot resolve {}", repo.display()))?;

    Ok(canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repo".to_string()))
}

fn annotator_config(cli: &Cli) -> AnnotatorConfig {
    AnnotatorConfig {
        workers: cli.workers,
        requests: RequestLimits {
            max_in_flight: cli.max_requests,
            timeout: Duration::from_secs(cli.request_timeout),
        },
        output_mode: if cli.suffixed {
            OutputMode::Suffixed
        } else {
            OutputMode::InPlace
        },
        ..AnnotatorConfig::default()
    }
}

async fn annotate(cli: &Cli, output_repo: &Path, spinner: &ProgressBar) -> Result<Summary> {
    let openai = OpenAiConfig::from_env();
    if !openai.has_api_key() {
        println!(
            "{} OPENAI_API_KEY is not set; files will be copied without comments",
            "⚠".yellow()
        );
    }

    debug!("Model {} at {}", openai.model, openai.endpoint);
    let service = OpenAiService::new(openai).context("cannot create annotation client")?;

    let config = annotator_config(cli);
    debug!("{:?}", config);
    let annotator = Arc::new(Annotator::new(Arc::new(service), config));

    println!(
        "{}",
        format!("Processing files with {} workers...", annotator.config().workers).cyan()
    );

    spinner.set_draw_target(ProgressDrawTarget::stderr());
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message("Annotating sources...");

    let result = process_tree(output_repo, annotator).await;
    spinner.finish_and_clear();
    let summary = result?;

    println!(
        "{} Processed {} Java files in {:.1}s ({} errors, {} methods documented, {:.1} files/sec)",
        "✓".green(),
        summary.processed.to_string().cyan(),
        summary.elapsed.as_secs_f64(),
        summary.errored,
        summary.methods_annotated,
        summary.files_per_sec()
    );

    if summary.errored > 0 {
        println!("\n{} files copied without comments:", "⚠".yellow());
        for outcome in summary.failures().take(5) {
            println!(
                "  {} - {}",
                outcome.path.display().to_string().red(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
        if summary.errored > 5 {
            println!("  ... and {} more", summary.errored - 5);
        }
    }

    Ok(summary)
}

fn print_graph_build(build: &GraphBuild) {
    println!(
        "{} Analyzed {} files ({} classes) in {}ms",
        "✓".green(),
        build.files_scanned.to_string().cyan(),
        build.graph.len().to_string().cyan(),
        build.duration_ms
    );

    if !build.errors.is_empty() {
        println!("{} {} files contributed no class", "⚠".yellow(), build.errors.len());
    }
}

/// Writes `<out>/<name>_architecture.md`.
fn write_architecture_report(graph: &ArchitectureGraph, out: &Path, name: &str) -> Result<PathBuf> {
    let path = out.join(format!("{}_architecture.md", name));
    fs::write(&path, to_markdown(graph))
        .with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}

/// Writes the Mermaid and DOT diagrams. Returns `None` for an empty graph.
fn write_diagrams(
    graph: &ArchitectureGraph,
    out: &Path,
    name: &str,
) -> Result<Option<(PathBuf, PathBuf)>> {
    if graph.is_empty() {
        return Ok(None);
    }

    let mermaid_path = out.join(format!("{}_architecture_mermaid.md", name));
    let mermaid = format!(
        "# Architecture Diagram\n\n{}\n",
        to_diagram(graph, DiagramFormat::Mermaid)
    );
    fs::write(&mermaid_path, mermaid)
        .with_context(|| format!("cannot write {}", mermaid_path.display()))?;

    let dot_path = out.join(format!("{}_architecture.dot", name));
    fs::write(&dot_path, to_diagram(graph, DiagramFormat::Dot))
        .with_context(|| format!("cannot write {}", dot_path.display()))?;

    Ok(Some((mermaid_path, dot_path)))
}
