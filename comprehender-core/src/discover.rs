//! Source file discovery.
//!
//! Finds the Java files under a root and recognises files written by a
//! previous annotation run, so re-running over an output tree never
//! annotates the same file twice.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Extension of the files Comprehender processes.
pub const JAVA_EXTENSION: &str = "java";

/// File stem suffix of annotated copies written beside their source.
pub const ANNOTATED_SUFFIX: &str = "_commented";

/// Returns true for `*.java` paths.
pub fn is_java_source(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(JAVA_EXTENSION)
}

/// Returns true for `*_commented.java` paths.
pub fn is_annotated_output(path: &Path) -> bool {
    is_java_source(path)
        && path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.ends_with(ANNOTATED_SUFFIX))
}

/// Maps `dir/Foo.java` to `dir/Foo_commented.java`.
pub fn annotated_output_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}.{}", stem, ANNOTATED_SUFFIX, JAVA_EXTENSION))
}

/// Lists every Java file under `root` that is not itself an annotated copy.
///
/// Paths are returned in a stable, name-sorted walk order. Unreadable
/// entries below the root are logged and skipped; a missing or unreadable
/// root is an error.
pub fn discover_sources(root: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if is_java_source(path) && !is_annotated_output(path) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}
