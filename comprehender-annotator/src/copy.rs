//! Output tree preparation.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{AnnotateError, Result};

/// Copies the directory tree at `src` to `dest`, replacing any existing
/// `dest`. Returns the number of files copied.
///
/// `dest` may lie inside `src`; it is skipped while walking. A `dest` that
/// is `src` itself or one of its ancestors is rejected before anything is
/// removed. Symlinks to files are copied as regular files holding the
/// target's content; symlinks to directories and dangling links are skipped.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    let src = src.canonicalize().map_err(|e| AnnotateError::io(src, e))?;
    let dest_abs = absolute(dest)?;

    if src.starts_with(&dest_abs) {
        return Err(AnnotateError::OverlapsInput(dest_abs));
    }

    if dest_abs.exists() {
        debug!("Removing previous output at {}", dest_abs.display());
        fs::remove_dir_all(&dest_abs).map_err(|e| AnnotateError::io(&dest_abs, e))?;
    }
    fs::create_dir_all(&dest_abs).map_err(|e| AnnotateError::io(&dest_abs, e))?;

    let mut copied = 0;
    let walker = WalkDir::new(&src)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !entry.path().starts_with(&dest_abs));

    for entry in walker {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(&src) else {
            continue;
        };
        let target = dest_abs.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| AnnotateError::io(&target, e))?;
        } else if file_type.is_file() || links_to_file(entry.path()) {
            // fs::copy follows the link.
            fs::copy(entry.path(), &target).map_err(|e| AnnotateError::io(entry.path(), e))?;
            copied += 1;
        } else {
            debug!("Skipping {}", entry.path().display());
        }
    }

    info!(
        "Copied {} files from {} to {}",
        copied,
        src.display(),
        dest_abs.display()
    );
    Ok(copied)
}

fn links_to_file(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false)
}

/// `path` made absolute with its existing ancestors canonicalized, so it
/// compares against the canonical source path.
fn absolute(path: &Path) -> Result<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut rest = Vec::new();

    loop {
        if existing.as_os_str().is_empty() {
            existing = std::env::current_dir().map_err(|e| AnnotateError::io(path, e))?;
        }
        match existing.canonicalize() {
            Ok(canonical) => {
                let mut result = canonical;
                result.extend(rest.iter().rev());
                return Ok(result);
            }
            Err(e) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    rest.push(name.to_os_string());
                    existing = parent.to_path_buf();
                }
                _ => return Err(AnnotateError::io(path, e)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_copies_nested_tree() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("repo");
        write(&src.join("src/main/App.java"), "class App {}");
        write(&src.join("README.md"), "# repo");

        let dest = dir.path().join("out/repo_commented");
        let copied = copy_tree(&src, &dest).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(
            fs::read_to_string(dest.join("src/main/App.java")).unwrap(),
            "class App {}"
        );
        assert!(dest.join("README.md").exists());
    }

    #[test]
    fn test_replaces_existing_copy() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("repo");
        write(&src.join("A.java"), "class A {}");
        let dest = dir.path().join("repo_commented");
        write(&dest.join("Stale.java"), "class Stale {}");

        copy_tree(&src, &dest).unwrap();

        assert!(dest.join("A.java").exists());
        assert!(!dest.join("Stale.java").exists());
    }

    #[test]
    fn test_destination_inside_source_is_skipped() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("repo");
        write(&src.join("A.java"), "class A {}");
        let dest = src.join("output/repo_commented");

        let copied = copy_tree(&src, &dest).unwrap();

        assert_eq!(copied, 1);
        assert!(!dest.join("output/repo_commented").exists());
    }

    #[test]
    fn test_destination_containing_source_is_rejected() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("repo");
        write(&src.join("A.java"), "class A {}");

        let result = copy_tree(&src, dir.path());

        assert!(matches!(result, Err(AnnotateError::OverlapsInput(_))));
        assert!(src.join("A.java").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_symlinks_are_copied_as_files() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        let shared = dir.path().join("shared");
        write(&shared.join("Common.java"), "class Common {}");
        let src = dir.path().join("repo");
        write(&src.join("A.java"), "class A {}");
        symlink(shared.join("Common.java"), src.join("Common.java")).unwrap();
        symlink(&shared, src.join("linked_dir")).unwrap();
        symlink(dir.path().join("gone.java"), src.join("Dangling.java")).unwrap();

        let dest = dir.path().join("repo_commented");
        let copied = copy_tree(&src, &dest).unwrap();

        assert_eq!(copied, 2);
        let common = dest.join("Common.java");
        assert!(!fs::symlink_metadata(&common).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&common).unwrap(), "class Common {}");
        assert!(!dest.join("linked_dir").exists());
        assert!(!dest.join("Dangling.java").exists());
    }
}
