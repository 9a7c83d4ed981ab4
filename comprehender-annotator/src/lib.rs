//! Comprehender Annotator - JavaDoc annotation of source trees
//!
//! Walks a tree of Java files and inserts generated documentation above
//! each class and method. Files are processed in parallel; within a file,
//! the requests to the annotation service run as one bounded batch.
//!
//! ```no_run
//! use comprehender_annotator::{process_tree, Annotator, AnnotatorConfig, OpenAiConfig, OpenAiService};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let service = OpenAiService::new(OpenAiConfig::from_env())?;
//! let annotator = Annotator::new(Arc::new(service), AnnotatorConfig::default());
//!
//! let summary = process_tree(Path::new("output/repo_commented"), Arc::new(annotator)).await?;
//! println!("{} files annotated", summary.processed);
//! # Ok(())
//! # }
//! ```
//!
//! A failed request leaves its method undocumented. A failed file is
//! copied to its output unchanged and reported in the [`Summary`].

mod batch;
mod config;
mod copy;
mod error;
mod orchestrator;
mod prompt;
mod rewriter;
mod scheduler;
mod service;

pub use batch::{request_annotations, BatchResult};
pub use config::{AnnotatorConfig, OutputMode, RequestLimits};
pub use copy::copy_tree;
pub use error::{AnnotateError, Result, ServiceError};
pub use orchestrator::{Annotator, ProcessingOutcome};
pub use prompt::{class_prompt, method_prompt, CLASS_SNIPPET_LIMIT};
pub use rewriter::{rewrite, split_lines, Rewritten, CLASS_MARKER};
pub use scheduler::{process_tree, Summary};
pub use service::{clean_response, AnnotationService, OpenAiConfig, OpenAiService, SnippetKind};
