//! Comprehender Graph - class architecture of a Java tree
//!
//! This crate builds the architecture graph of a source tree (one node per
//! class, keyed by simple class name) and renders it as a Markdown report,
//! a Mermaid class diagram or a Graphviz DOT digraph.
//!
//! # Example
//!
//! ```no_run
//! use comprehender_graph::{build_graph, to_diagram, to_markdown, DiagramFormat};
//! use std::path::Path;
//!
//! let build = build_graph(Path::new("my-java-repo")).unwrap();
//!
//! let report = to_markdown(&build.graph);
//! let dot = to_diagram(&build.graph, DiagramFormat::Dot);
//! ```
//!
//! Edges are derived on every render. Import-based dependencies resolve by
//! simple class name, so two unrelated classes sharing a name across
//! packages are indistinguishable.

mod builder;
mod diagram;
mod edge;
mod graph;
mod report;

pub use builder::{build_graph, GraphBuild, GraphError};
pub use diagram::{to_diagram, DiagramFormat};
pub use edge::{Edge, EdgeKind};
pub use graph::ArchitectureGraph;
pub use report::{to_markdown, to_markdown_with, MarkdownOptions};
