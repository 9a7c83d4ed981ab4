//! Edge types for the architecture graph.
//!
//! Edges are never stored. They are derived from the class records each
//! time a diagram or report is rendered.

use serde::{Deserialize, Serialize};

/// The type of relationship between two classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Parent class -> child class.
    Inheritance,

    /// Interface -> implementing class.
    Realization,

    /// Importing class -> imported class.
    Dependency,
}

impl EdgeKind {
    /// Inheritance and realization edges both describe a supertype.
    pub fn is_hierarchy(&self) -> bool {
        matches!(self, Self::Inheritance | Self::Realization)
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Inheritance => "inheritance",
            Self::Realization => "realization",
            Self::Dependency => "dependency",
        };
        write!(f, "{}", s)
    }
}

/// A directed relationship between two class names.
///
/// For hierarchy edges `from` may name a class that is not in the graph
/// (a dangling edge to an external supertype).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl Edge {
    /// Creates a new edge.
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from, self.kind, self.to)
    }
}
