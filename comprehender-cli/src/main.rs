//! Comprehender CLI - Java codebase commenter and architecture mapper
//!
//! Copies a Java repository, documents every class and method in the copy
//! and optionally writes architecture reports for the original tree.

use clap::builder::RangedU64ValueParser;
use clap::Parser;
use colored::Colorize;
use comprehender_graph::DiagramFormat;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod progress;

use progress::SuspendingWriter;

/// Upper bound for `--workers` and `--max-requests`.
const MAX_CONCURRENCY: u64 = 1024;

#[derive(Parser)]
#[command(name = "comprehender")]
#[command(author = "Comprehender Contributors")]
#[command(version)]
#[command(about = "Java codebase analyzer and commenter", long_about = None)]
pub struct Cli {
    /// Path to the Java repository to process
    #[arg(long)]
    pub repo: PathBuf,

    /// Output base folder
    #[arg(long, default_value = "output")]
    pub out: PathBuf,

    /// Number of files processed in parallel
    #[arg(
        long,
        default_value = "4",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_CONCURRENCY)
    )]
    pub workers: usize,

    /// Generate the architecture report (Markdown)
    #[arg(long)]
    pub arch_report: bool,

    /// Generate Mermaid and Graphviz architecture diagrams
    #[arg(long)]
    pub visual: bool,

    /// Print the class diagram to the console
    #[arg(long)]
    pub architecture: bool,

    /// Console diagram format for --architecture (mermaid or dot)
    #[arg(long, default_value = "mermaid", value_parser = DiagramFormat::from_str)]
    pub diagram_format: DiagramFormat,

    /// Write `Foo_commented.java` beside each file instead of rewriting it
    #[arg(long)]
    pub suffixed: bool,

    /// Concurrent annotation requests per file
    #[arg(
        long,
        default_value = "10",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..=MAX_CONCURRENCY)
    )]
    pub max_requests: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "60")]
    pub request_timeout: u64,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    // Optional .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Drawn only while files are being annotated
    let progress = ProgressBar::hidden();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(SuspendingWriter::new(progress.clone(), std::io::stderr))
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    if let Err(e) = commands::run(&cli, &progress).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
