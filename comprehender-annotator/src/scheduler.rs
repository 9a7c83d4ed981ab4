//! Parallel file scheduler.
//!
//! Every discovered file becomes one task on a [`JoinSet`]; a semaphore
//! sized to `AnnotatorConfig::workers` admits that many at a time. Tasks
//! complete in any order. A panic inside one task is caught at the task
//! boundary and reported as that file's error.

use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

use comprehender_core::discover_sources;

use crate::error::Result;
use crate::orchestrator::{copy_verbatim, Annotator, ProcessingOutcome};

/// Result of a [`process_tree`] run.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Files annotated (or copied for lack of methods) without error.
    pub processed: usize,

    /// Files that fell back to a verbatim copy.
    pub errored: usize,

    pub methods_annotated: usize,
    pub elapsed: Duration,

    /// One entry per discovered file, sorted by path.
    pub outcomes: Vec<ProcessingOutcome>,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.processed + self.errored
    }

    pub fn files_per_sec(&self) -> f64 {
        rate(self.total(), self.elapsed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProcessingOutcome> {
        self.outcomes.iter().filter(|o| !o.ok)
    }
}

/// Counters shared by the tasks of one run.
struct RunStats {
    total: usize,
    progress_every: usize,
    started: Instant,
    completed: AtomicUsize,
    processed: AtomicUsize,
    errored: AtomicUsize,
    methods_annotated: AtomicUsize,
}

impl RunStats {
    fn new(total: usize, progress_every: usize) -> Self {
        Self {
            total,
            progress_every: progress_every.max(1),
            started: Instant::now(),
            completed: AtomicUsize::new(0),
            processed: AtomicUsize::new(0),
            errored: AtomicUsize::new(0),
            methods_annotated: AtomicUsize::new(0),
        }
    }

    fn record(&self, outcome: &ProcessingOutcome) {
        if outcome.ok {
            self.processed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.errored.fetch_add(1, Ordering::Relaxed);
        }
        self.methods_annotated
            .fetch_add(outcome.methods_annotated, Ordering::Relaxed);
        self.complete_one();
    }

    fn record_lost(&self) {
        self.errored.fetch_add(1, Ordering::Relaxed);
        self.complete_one();
    }

    fn complete_one(&self) {
        let done = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        if done % self.progress_every == 0 || done == self.total {
            info!(
                "Progress: {}/{} files ({:.2} files/sec)",
                done,
                self.total,
                rate(done, self.started.elapsed())
            );
        }
    }
}

/// Annotates every Java source under `root` with `annotator`.
///
/// Files already carrying the annotated suffix are not picked up. Only a
/// failure to walk `root` itself is returned as an error; per-file failures
/// are reported in the [`Summary`].
pub async fn process_tree(root: &Path, annotator: Arc<Annotator>) -> Result<Summary> {
    let files = discover_sources(root)?;
    let config = annotator.config().clone();

    info!(
        "Annotating {} files with {} workers ({} requests in flight per file)",
        files.len(),
        config.workers,
        config.requests.max_in_flight
    );

    let stats = Arc::new(RunStats::new(files.len(), config.progress_every));
    let workers = Arc::new(Semaphore::new(config.workers));
    let mut tasks = JoinSet::new();

    for path in files {
        let annotator = Arc::clone(&annotator);
        let workers = Arc::clone(&workers);
        let stats = Arc::clone(&stats);

        tasks.spawn(async move {
            let _permit = workers.acquire_owned().await.ok();
            let output = annotator.config().output_mode.output_path(&path);

            let outcome = match AssertUnwindSafe(annotator.annotate_file(&path, &output))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let message = panic_message(panic);
                    error!("Worker panicked on {}: {}", path.display(), message);
                    if let Err(e) = copy_verbatim(&path, &output).await {
                        error!("Fallback copy of {} failed: {}", path.display(), e);
                    }
                    ProcessingOutcome::failed(path, output, format!("worker panicked: {}", message))
                }
            };

            stats.record(&outcome);
            outcome
        });
    }

    let mut outcomes = Vec::with_capacity(stats.total);
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                error!("Worker task lost: {}", e);
                stats.record_lost();
            }
        }
    }
    outcomes.sort_by(|a, b| a.path.cmp(&b.path));

    let summary = Summary {
        processed: stats.processed.load(Ordering::Acquire),
        errored: stats.errored.load(Ordering::Acquire),
        methods_annotated: stats.methods_annotated.load(Ordering::Acquire),
        elapsed: stats.started.elapsed(),
        outcomes,
    };

    info!(
        "Finished: {} processed, {} errored, {} methods annotated in {:.2}s ({:.2} files/sec)",
        summary.processed,
        summary.errored,
        summary.methods_annotated,
        summary.elapsed.as_secs_f64(),
        summary.files_per_sec()
    );

    Ok(summary)
}

fn rate(count: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnnotatorConfig, OutputMode};
    use crate::error::{AnnotateError, ServiceError};
    use crate::service::{AnnotationService, SnippetKind};
    use async_trait::async_trait;
    use crate::config::RequestLimits;
    use comprehender_core::{JavaExtractor, ParsedSource, SymbolExtractor};
    use std::fs;
    use tempfile::tempdir;

    struct FixedService;

    #[async_trait]
    impl AnnotationService for FixedService {
        async fn generate(&self, _snippet: &str, _kind: SnippetKind) -> std::result::Result<String, ServiceError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok("/** Documented. */".to_string())
        }
    }

    /// Panics on sources mentioning `Explode`.
    struct ExplodingExtractor;

    impl SymbolExtractor for ExplodingExtractor {
        fn extract(&self, source: &str) -> ParsedSource {
            if source.contains("Explode") {
                panic!("extractor blew up");
            }
            JavaExtractor.extract(source)
        }
    }

    fn java(name: &str) -> String {
        format!("public class {} {{\n    void run() {{}}\n}}\n", name)
    }

    fn config(output_mode: OutputMode) -> AnnotatorConfig {
        AnnotatorConfig {
            workers: 2,
            output_mode,
            progress_every: 2,
            ..AnnotatorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_processes_every_file() {
        let dir = tempdir().unwrap();
        for name in ["A", "B", "C", "D", "E"] {
            fs::write(dir.path().join(format!("{}.java", name)), java(name)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "not java").unwrap();

        let annotator = Arc::new(Annotator::new(Arc::new(FixedService), config(OutputMode::InPlace)));
        let summary = process_tree(dir.path(), annotator).await.unwrap();

        assert_eq!(summary.processed, 5);
        assert_eq!(summary.errored, 0);
        assert_eq!(summary.methods_annotated, 5);
        assert_eq!(summary.outcomes.len(), 5);
        assert!(summary.outcomes.windows(2).all(|w| w[0].path < w[1].path));

        let a = fs::read_to_string(dir.path().join("A.java")).unwrap();
        assert!(a.starts_with("/** Documented. */\n\npublic class A {\n"));
    }

    /// Tracks the highest number of files being annotated at once.
    #[derive(Default)]
    struct PeakService {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl AnnotationService for PeakService {
        async fn generate(&self, _snippet: &str, _kind: SnippetKind) -> std::result::Result<String, ServiceError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok("/** Documented. */".to_string())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_files_in_flight_are_bounded_by_workers() {
        let dir = tempdir().unwrap();
        for i in 0..12 {
            // One method and no class: exactly one request per file.
            fs::write(
                dir.path().join(format!("Api{}.java", i)),
                format!("interface Api{} {{\n    void call();\n}}\n", i),
            )
            .unwrap();
        }

        let service = Arc::new(PeakService::default());
        let config = AnnotatorConfig {
            workers: 2,
            requests: RequestLimits {
                max_in_flight: 1,
                timeout: Duration::from_secs(5),
            },
            ..config(OutputMode::Suffixed)
        };
        let annotator = Arc::new(Annotator::new(service.clone(), config));

        let summary = process_tree(dir.path(), annotator).await.unwrap();

        assert_eq!(summary.processed, 12);
        assert_eq!(summary.methods_annotated, 12);
        assert_eq!(service.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panic_is_isolated_to_its_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Good.java"), java("Good")).unwrap();
        fs::write(dir.path().join("Explode.java"), java("Explode")).unwrap();

        let annotator = Annotator::new(Arc::new(FixedService), config(OutputMode::Suffixed))
            .with_extractor(Arc::new(ExplodingExtractor));
        let summary = process_tree(dir.path(), Arc::new(annotator)).await.unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.errored, 1);
        assert!(dir.path().join("Good_commented.java").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("Explode_commented.java")).unwrap(),
            java("Explode")
        );

        let failure = summary.failures().next().unwrap();
        assert_eq!(failure.path, dir.path().join("Explode.java"));
        assert!(failure.error.as_deref().unwrap().contains("extractor blew up"));
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let annotator = Arc::new(Annotator::new(Arc::new(FixedService), AnnotatorConfig::default()));

        let result = process_tree(&dir.path().join("missing"), annotator).await;

        assert!(matches!(result, Err(AnnotateError::Discovery(_))));
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(7)), "unknown panic");
    }
}
