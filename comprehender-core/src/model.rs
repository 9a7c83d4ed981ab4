//! Structural records extracted from a Java file.
//!
//! Records are created per file and per run and are never mutated after
//! extraction. Line numbers always refer to the original, unmodified file.

use serde::{Deserialize, Serialize};

/// A method declaration and where it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    /// 0-based line of the declaration in the original file, modifiers and
    /// annotations included.
    pub start_line: usize,

    /// Simple method name.
    pub name: String,

    /// Source text of the whole declaration.
    pub raw_text: String,
}

impl MethodRecord {
    pub fn new(start_line: usize, name: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            start_line,
            name: name.into(),
            raw_text: raw_text.into(),
        }
    }
}

/// The primary class declared in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,

    /// Simple name of the superclass, generic arguments removed.
    pub extends: Option<String>,

    /// Simple names of the implemented interfaces in declaration order,
    /// without duplicates.
    pub implements: Vec<String>,
}

/// Everything the extractor knows about one file.
///
/// `class` is `None` when the file declares no class or could not be
/// parsed; callers have to handle that case explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSource {
    pub class: Option<ClassDecl>,

    /// Dotted import paths in file order.
    pub imports: Vec<String>,

    /// Methods in ascending `start_line` order.
    pub methods: Vec<MethodRecord>,
}

impl ParsedSource {
    /// Returns true if nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        self.class.is_none() && self.imports.is_empty() && self.methods.is_empty()
    }

    /// Builds the architecture record for this file, if it declares a class.
    pub fn into_class_record(self, file_path: impl Into<String>) -> Option<ClassRecord> {
        let class = self.class?;
        Some(ClassRecord {
            class_name: class.name,
            extends: class.extends,
            implements: class.implements,
            imports: self.imports,
            file_path: file_path.into(),
        })
    }
}

/// A class node of the architecture graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub class_name: String,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub imports: Vec<String>,

    /// Path relative to the analyzed root.
    pub file_path: String,
}

impl ClassRecord {
    pub fn new(class_name: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            extends: None,
            implements: Vec::new(),
            imports: Vec::new(),
            file_path: file_path.into(),
        }
    }

    pub fn with_extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn with_implements(mut self, interfaces: Vec<String>) -> Self {
        self.implements = interfaces;
        self
    }

    pub fn with_imports(mut self, imports: Vec<String>) -> Self {
        self.imports = imports;
        self
    }

    /// File name component of `file_path`.
    pub fn file_name(&self) -> &str {
        self.file_path
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(&self.file_path)
    }
}
