//! Run configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use comprehender_core::annotated_output_path;

/// Where an annotated file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Replace the file in the output tree, keeping its name.
    #[default]
    InPlace,
    /// Write `Foo_commented.java` beside `Foo.java`.
    Suffixed,
}

impl OutputMode {
    /// Output path for an input file under this mode.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        match self {
            Self::InPlace => input.to_path_buf(),
            Self::Suffixed => annotated_output_path(input),
        }
    }
}

/// Bounds on requests to the annotation service within one file's batch.
#[derive(Debug, Clone)]
pub struct RequestLimits {
    /// Maximum concurrent in-flight requests per batch.
    pub max_in_flight: usize,

    /// Per-request deadline. A timed-out request counts as failed.
    pub timeout: Duration,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_in_flight: 10,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Configuration for an annotation run.
///
/// `workers` and `requests.max_in_flight` bound different layers and
/// multiply: up to `workers * max_in_flight` requests may be in flight.
#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    /// Files processed concurrently.
    pub workers: usize,

    pub requests: RequestLimits,

    pub output_mode: OutputMode,

    /// Log throughput every this many completed files.
    pub progress_every: usize,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            requests: RequestLimits::default(),
            output_mode: OutputMode::default(),
            progress_every: 5,
        }
    }
}

impl AnnotatorConfig {
    /// Clamps zero-sized bounds to one so neither pool can deadlock.
    pub fn normalized(mut self) -> Self {
        self.workers = self.workers.max(1);
        self.requests.max_in_flight = self.requests.max_in_flight.max(1);
        self.progress_every = self.progress_every.max(1);
        self
    }
}
