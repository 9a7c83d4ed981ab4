//! Core graph data structure.
//!
//! The ArchitectureGraph holds one class record per class name, in the
//! order the classes were discovered, with a name index for lookups. It is
//! built once per request and only read afterwards.

use crate::edge::{Edge, EdgeKind};
use comprehender_core::ClassRecord;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::debug;

/// The class architecture of one source tree.
#[derive(Debug, Default, Clone)]
pub struct ArchitectureGraph {
    /// Records in discovery order.
    classes: Vec<ClassRecord>,

    /// Maps class names to positions in `classes`.
    name_index: HashMap<String, usize>,
}

impl ArchitectureGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class record.
    ///
    /// The first record seen for a name wins. Later duplicates are dropped
    /// and `false` is returned; they can still appear as edge targets.
    pub fn insert(&mut self, record: ClassRecord) -> bool {
        if self.name_index.contains_key(&record.class_name) {
            debug!(
                "Duplicate class {} in {} ignored",
                record.class_name, record.file_path
            );
            return false;
        }

        self.name_index
            .insert(record.class_name.clone(), self.classes.len());
        self.classes.push(record);
        true
    }

    /// Gets a class by name.
    pub fn get(&self, name: &str) -> Option<&ClassRecord> {
        self.name_index.get(name).map(|&idx| &self.classes[idx])
    }

    /// Returns true if a class with this exact simple name is in the graph.
    pub fn contains(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    /// Returns the number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterates over classes in discovery order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassRecord> {
        self.classes.iter()
    }

    /// Returns the classes sorted by name.
    pub fn sorted_classes(&self) -> Vec<&ClassRecord> {
        let mut sorted: Vec<_> = self.classes.iter().collect();
        sorted.sort_by(|a, b| a.class_name.cmp(&b.class_name));
        sorted
    }

    /// Number of classes with a superclass.
    pub fn extends_count(&self) -> usize {
        self.classes.iter().filter(|c| c.extends.is_some()).count()
    }

    /// Number of classes implementing at least one interface.
    pub fn implements_count(&self) -> usize {
        self.classes
            .iter()
            .filter(|c| !c.implements.is_empty())
            .count()
    }

    /// Resolves an import to a class of this graph.
    ///
    /// Resolution is by simple name only: `com.foo.Bar` resolves to any
    /// class named `Bar`, whatever its package.
    pub fn resolve_import<'a>(&self, import: &'a str) -> Option<&'a str> {
        let simple = import.rsplit('.').next().unwrap_or(import);
        self.contains(simple).then_some(simple)
    }

    /// Derives the edges of a single class in emission order: inheritance,
    /// then realization, then dependencies.
    pub fn edges_of(&self, class: &ClassRecord) -> Vec<Edge> {
        let mut edges = Vec::new();
        let name = class.class_name.as_str();

        if let Some(parent) = &class.extends {
            edges.push(Edge::new(parent.as_str(), name, EdgeKind::Inheritance));
        }

        for interface in &class.implements {
            edges.push(Edge::new(interface.as_str(), name, EdgeKind::Realization));
        }

        for import in &class.imports {
            if let Some(target) = self.resolve_import(import) {
                edges.push(Edge::new(name, target, EdgeKind::Dependency));
            }
        }

        edges
    }

    /// Derives every edge of the graph, class by class in discovery order.
    pub fn edges(&self) -> Vec<Edge> {
        self.classes.iter().flat_map(|c| self.edges_of(c)).collect()
    }

    /// Finds groups of classes that depend on each other in a cycle.
    ///
    /// Each group is sorted by name; groups are sorted by their first member.
    pub fn dependency_cycles(&self) -> Vec<Vec<String>> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let indexes: HashMap<&str, NodeIndex> = self
            .classes
            .iter()
            .map(|c| (c.class_name.as_str(), graph.add_node(c.class_name.as_str())))
            .collect();

        for edge in self.edges() {
            if edge.kind != EdgeKind::Dependency {
                continue;
            }
            if let (Some(&from), Some(&to)) =
                (indexes.get(edge.from.as_str()), indexes.get(edge.to.as_str()))
            {
                graph.update_edge(from, to, ());
            }
        }

        let mut cycles: Vec<Vec<String>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut names: Vec<String> =
                    component.iter().map(|&idx| graph[idx].to_string()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }
}
