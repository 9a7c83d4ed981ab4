//! Markdown architecture report.

use crate::graph::ArchitectureGraph;

/// Options for [`to_markdown_with`].
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Imports starting with any of these prefixes are not listed.
    pub ignored_prefixes: Vec<String>,

    /// Maximum number of imports listed per class.
    pub max_imports: usize,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            ignored_prefixes: vec!["java.lang".to_string(), "java.util".to_string()],
            max_imports: 5,
        }
    }
}

/// Renders the report with default options.
pub fn to_markdown(graph: &ArchitectureGraph) -> String {
    to_markdown_with(graph, &MarkdownOptions::default())
}

/// Renders one section per class, sorted by name, followed by a summary.
pub fn to_markdown_with(graph: &ArchitectureGraph, options: &MarkdownOptions) -> String {
    if graph.is_empty() {
        return "# Project Architecture\n\nNo Java classes found.".to_string();
    }

    let mut lines = vec!["# Project Architecture\n".to_string()];

    for class in graph.sorted_classes() {
        lines.push(format!("## `{}`", class.class_name));
        lines.push(format!("- **File**: `{}`", class.file_path));

        if let Some(parent) = &class.extends {
            lines.push(format!("- **Extends**: `{}`", parent));
        }

        if !class.implements.is_empty() {
            lines.push(format!("- **Implements**: {}", code_list(&class.implements)));
        }

        let notable: Vec<&String> = class
            .imports
            .iter()
            .filter(|imp| {
                !options
                    .ignored_prefixes
                    .iter()
                    .any(|prefix| imp.starts_with(prefix.as_str()))
            })
            .collect();

        if !notable.is_empty() {
            let shown = notable.len().min(options.max_imports);
            let mut list = code_list(&notable[..shown]);
            if notable.len() > shown {
                list.push_str(&format!(" (and {} more)", notable.len() - shown));
            }
            lines.push(format!("- **Key Imports**: {}", list));
        }

        lines.push(String::new());
    }

    lines.push("---".to_string());
    lines.push(format!("**Total Classes**: {}", graph.len()));

    let extends_count = graph.extends_count();
    let implements_count = graph.implements_count();

    if extends_count > 0 {
        lines.push(format!("**Classes with Inheritance**: {}", extends_count));
    }
    if implements_count > 0 {
        lines.push(format!("**Classes with Interfaces**: {}", implements_count));
    }

    let cycles = graph.dependency_cycles();
    if !cycles.is_empty() {
        lines.push(format!("**Dependency Cycles**: {}", cycles.len()));
    }

    lines.join("\n")
}

fn code_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| format!("`{}`", item.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
