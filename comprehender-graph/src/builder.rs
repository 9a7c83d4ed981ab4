//! Graph builder for constructing the architecture graph from a source tree.
//!
//! The builder walks the tree, extracts one class record per file and keeps
//! only the files that declare a class. Files that cannot be read or parsed
//! are recorded in the build report and skipped.

use crate::graph::ArchitectureGraph;
use comprehender_core::{discover_sources, JavaExtractor};
use std::fs;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result of building the graph for one tree.
#[derive(Debug, Default)]
pub struct GraphBuild {
    pub graph: ArchitectureGraph,

    /// Number of Java files visited.
    pub files_scanned: usize,

    /// Files that contributed no class, with the reason.
    pub errors: Vec<(String, String)>,

    /// Classes dropped because an earlier file declared the same name.
    pub duplicates: usize,

    pub duration_ms: u64,
}

/// Builds the architecture graph for every Java file under `root`.
///
/// `file_path` of each record is relative to `root`, with `/` separators.
pub fn build_graph(root: &Path) -> Result<GraphBuild, GraphError> {
    let start = Instant::now();
    let files = discover_sources(root)?;
    let extractor = JavaExtractor;

    let mut build = GraphBuild {
        files_scanned: files.len(),
        ..Default::default()
    };

    for path in files {
        let rel_path = relative_path(root, &path);

        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                warn!("Error processing {}: {}", path.display(), e);
                build.errors.push((rel_path, e.to_string()));
                continue;
            }
        };

        let parsed = match extractor.try_parse(&source) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Error parsing {}: {}", rel_path, e);
                build.errors.push((rel_path, e.to_string()));
                continue;
            }
        };

        match parsed.into_class_record(rel_path.clone()) {
            Some(record) => {
                if !build.graph.insert(record) {
                    build.duplicates += 1;
                }
            }
            None => {
                debug!("No class declared in {}", rel_path);
                build.errors.push((rel_path, "no class declaration".to_string()));
            }
        }
    }

    build.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Architecture graph: {} classes from {} files in {}ms",
        build.graph.len(),
        build.files_scanned,
        build.duration_ms
    );

    Ok(build)
}

/// Path of `path` relative to `root`, with forward slashes.
fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
