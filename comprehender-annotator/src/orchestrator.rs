//! Per-file annotation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error};

use comprehender_core::{JavaExtractor, SymbolExtractor};

use crate::batch::request_annotations;
use crate::config::AnnotatorConfig;
use crate::error::{AnnotateError, Result};
use crate::rewriter::{rewrite, split_lines};
use crate::service::AnnotationService;

/// What happened to one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOutcome {
    pub path: PathBuf,
    pub output_path: PathBuf,

    /// `false` when the file fell back to a verbatim copy after an error.
    pub ok: bool,

    pub methods_annotated: usize,
    pub error: Option<String>,
}

impl ProcessingOutcome {
    pub fn succeeded(path: PathBuf, output_path: PathBuf, methods_annotated: usize) -> Self {
        Self {
            path,
            output_path,
            ok: true,
            methods_annotated,
            error: None,
        }
    }

    pub fn failed(path: PathBuf, output_path: PathBuf, error: impl Into<String>) -> Self {
        Self {
            path,
            output_path,
            ok: false,
            methods_annotated: 0,
            error: Some(error.into()),
        }
    }
}

/// Annotates single files: extract, request comments, rewrite, write.
pub struct Annotator {
    service: Arc<dyn AnnotationService>,
    extractor: Arc<dyn SymbolExtractor>,
    config: AnnotatorConfig,
}

impl Annotator {
    /// Creates an annotator backed by the Java extractor.
    pub fn new(service: Arc<dyn AnnotationService>, config: AnnotatorConfig) -> Self {
        Self {
            service,
            extractor: Arc::new(JavaExtractor),
            config: config.normalized(),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn SymbolExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &AnnotatorConfig {
        &self.config
    }

    /// Annotates `path` into `output_path`.
    ///
    /// Never fails: any read, parse or write error leaves a verbatim copy
    /// of the input at `output_path` and an errored outcome.
    pub async fn annotate_file(&self, path: &Path, output_path: &Path) -> ProcessingOutcome {
        match self.try_annotate(path, output_path).await {
            Ok(methods_annotated) => ProcessingOutcome::succeeded(
                path.to_path_buf(),
                output_path.to_path_buf(),
                methods_annotated,
            ),
            Err(e) => {
                error!("Failed to annotate {}: {}", path.display(), e);
                if let Err(copy_err) = copy_verbatim(path, output_path).await {
                    error!(
                        "Fallback copy of {} failed: {}",
                        path.display(),
                        copy_err
                    );
                }
                ProcessingOutcome::failed(path.to_path_buf(), output_path.to_path_buf(), e.to_string())
            }
        }
    }

    async fn try_annotate(&self, path: &Path, output_path: &Path) -> Result<usize> {
        let source = fs::read_to_string(path)
            .await
            .map_err(|e| AnnotateError::io(path, e))?;

        let parsed = self.extractor.extract(&source);
        if parsed.methods.is_empty() {
            debug!("No methods in {}, copying verbatim", path.display());
            copy_verbatim(path, output_path).await?;
            return Ok(0);
        }

        let class_snippet = parsed.class.as_ref().map(|_| source.as_str());
        let batch = request_annotations(
            self.service.as_ref(),
            class_snippet,
            &parsed.methods,
            &self.config.requests,
        )
        .await;

        let rewritten = rewrite(
            &split_lines(&source),
            batch.class_comment.as_deref(),
            &parsed.methods,
            &batch.method_comments,
        );
        let methods_annotated = rewritten.methods_annotated;

        write_atomic(output_path, &rewritten.into_content()).await?;
        debug!(
            "Annotated {} ({} of {} methods)",
            path.display(),
            methods_annotated,
            parsed.methods.len()
        );

        Ok(methods_annotated)
    }
}

/// Writes through a temporary sibling file and renames it into place, so
/// `path` holds either its old or its new content.
async fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AnnotateError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&tmp, content)
        .await
        .map_err(|e| AnnotateError::io(&tmp, e))?;

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(AnnotateError::io(path, e));
    }
    Ok(())
}

/// Copies `path` to `output_path` unchanged. A no-op when they are the
/// same file.
pub(crate) async fn copy_verbatim(path: &Path, output_path: &Path) -> Result<()> {
    if path == output_path {
        return Ok(());
    }
    let bytes = fs::read(path).await.map_err(|e| AnnotateError::io(path, e))?;
    write_bytes(output_path, &bytes).await
}

async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AnnotateError::io(parent, e))?;
    }
    fs::write(path, bytes)
        .await
        .map_err(|e| AnnotateError::io(path, e))
}
