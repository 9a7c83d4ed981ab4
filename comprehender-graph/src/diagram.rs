//! Diagram rendering for the architecture graph.
//!
//! Every class becomes one node. Inheritance and realization edges are
//! emitted even when the supertype is not a node of the graph, so external
//! base classes and interfaces show up as dangling targets. Dependency
//! edges only connect classes of the graph.

use crate::edge::EdgeKind;
use crate::graph::ArchitectureGraph;
use std::fmt::Write;
use std::str::FromStr;

/// Output format for [`to_diagram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramFormat {
    /// Mermaid `classDiagram`, wrapped in a fenced code block.
    Mermaid,
    /// Graphviz DOT digraph.
    Dot,
}

impl FromStr for DiagramFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mermaid" => Ok(Self::Mermaid),
            "dot" | "graphviz" => Ok(Self::Dot),
            other => Err(format!("unknown diagram format: {}", other)),
        }
    }
}

/// Renders the graph in the requested format.
pub fn to_diagram(graph: &ArchitectureGraph, format: DiagramFormat) -> String {
    match format {
        DiagramFormat::Mermaid => render_mermaid(graph),
        DiagramFormat::Dot => render_dot(graph),
    }
}

fn render_mermaid(graph: &ArchitectureGraph) -> String {
    if graph.is_empty() {
        return "```mermaid\nclassDiagram\n    note \"No Java classes found\"\n```".to_string();
    }

    let mut out = String::from("```mermaid\nclassDiagram\n");

    for class in graph.classes() {
        let _ = writeln!(out, "    class {} {{", class.class_name);
        let _ = writeln!(out, "        +{}", class.file_name());
        out.push_str("    }\n");
    }
    out.push('\n');

    let edges = graph.edges();

    for edge in edges.iter().filter(|e| e.kind.is_hierarchy()) {
        let arrow = match edge.kind {
            EdgeKind::Realization => "<|..",
            _ => "<|--",
        };
        let _ = writeln!(out, "    {} {} {}", edge.from, arrow, edge.to);
    }
    out.push('\n');

    for edge in edges.iter().filter(|e| e.kind == EdgeKind::Dependency) {
        let _ = writeln!(out, "    {} --> {}", edge.from, edge.to);
    }

    out.push_str("```");
    out
}

fn render_dot(graph: &ArchitectureGraph) -> String {
    let mut out = String::from(
        "digraph Architecture {\n    rankdir=TB;\n    node [shape=box, style=filled, fillcolor=lightblue];\n\n",
    );

    for class in graph.classes() {
        let _ = writeln!(
            out,
            "    \"{}\" [label=\"{}\\n({})\"];",
            escape_dot(&class.class_name),
            escape_dot(&class.class_name),
            escape_dot(class.file_name())
        );
    }
    out.push('\n');

    for edge in graph.edges() {
        let style = match edge.kind {
            EdgeKind::Inheritance => "arrowhead=empty, color=blue",
            EdgeKind::Realization => "arrowhead=empty, style=dashed, color=green",
            EdgeKind::Dependency => "style=dotted, color=red",
        };
        let _ = writeln!(
            out,
            "    \"{}\" -> \"{}\" [{}];",
            escape_dot(&edge.from),
            escape_dot(&edge.to),
            style
        );
    }

    out.push('}');
    out
}

fn escape_dot(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}
