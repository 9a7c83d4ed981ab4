//! Java symbol extraction.
//!
//! Parses .java files with Tree-sitter and extracts the primary class
//! declaration, the import list and every method declaration together with
//! the line it starts on.

use crate::error::{ParseError, Result};
use crate::model::{ClassDecl, MethodRecord, ParsedSource};
use tree_sitter::{Node, Parser};
use tracing::warn;

/// Turns source text into structural records.
///
/// Implementations must fail closed: malformed input produces an empty
/// [`ParsedSource`], never a panic or an error.
pub trait SymbolExtractor: Send + Sync {
    fn extract(&self, source: &str) -> ParsedSource;
}

/// Tree-sitter backed extractor for Java.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaExtractor;

impl JavaExtractor {
    /// Parses `source`, reporting why it was rejected.
    ///
    /// A tree containing any syntax error is rejected as a whole.
    pub fn try_parse(&self, source: &str) -> Result<ParsedSource> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::language())
            .map_err(|e| ParseError::Language(e.to_string()))?;

        let tree = parser.parse(source, None).ok_or(ParseError::NoTree)?;
        let root = tree.root_node();

        if root.has_error() {
            let line = first_error_row(&root).unwrap_or(root.start_position().row);
            return Err(ParseError::Syntax { line: line + 1 });
        }

        let mut parsed = ParsedSource::default();
        extract_from_node(&root, source, &mut parsed);

        // Rewriting relies on ascending start lines
        parsed.methods.sort_by_key(|m| m.start_line);

        Ok(parsed)
    }
}

impl SymbolExtractor for JavaExtractor {
    fn extract(&self, source: &str) -> ParsedSource {
        match self.try_parse(source) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Error parsing Java code: {}", e);
                ParsedSource::default()
            }
        }
    }
}

/// Recursively extracts records from the Java AST.
fn extract_from_node(node: &Node, source: &str, parsed: &mut ParsedSource) {
    match node.kind() {
        // Only the first class in document order is the file's class
        "class_declaration" if parsed.class.is_none() => {
            parsed.class = extract_class(node, source);
        }

        "method_declaration" => {
            if let Some(method) = extract_method(node, source) {
                parsed.methods.push(method);
            }
        }

        "import_declaration" => {
            if let Some(path) = extract_import(node, source) {
                parsed.imports.push(path);
            }
            return;
        }

        _ => {}
    }

    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            extract_from_node(&child, source, parsed);
        }
    }
}

/// Extracts a class declaration with its supertypes.
fn extract_class(node: &Node, source: &str) -> Option<ClassDecl> {
    let name_node = node.child_by_field_name("name")?;
    let name = get_text(&name_node, source);

    let extends = node
        .child_by_field_name("superclass")
        .and_then(|superclass| superclass.named_child(0))
        .map(|ty| simple_type_name(&get_text(&ty, source)))
        .filter(|name| !name.is_empty());

    let mut implements: Vec<String> = Vec::new();
    if let Some(interfaces) = node.child_by_field_name("interfaces") {
        for i in 0..interfaces.named_child_count() {
            let Some(list) = interfaces.named_child(i) else {
                continue;
            };
            if list.kind() != "type_list" {
                continue;
            }
            for j in 0..list.named_child_count() {
                if let Some(ty) = list.named_child(j) {
                    let iface = simple_type_name(&get_text(&ty, source));
                    if !iface.is_empty() && !implements.contains(&iface) {
                        implements.push(iface);
                    }
                }
            }
        }
    }

    Some(ClassDecl {
        name,
        extends,
        implements,
    })
}

/// Extracts a method declaration.
fn extract_method(node: &Node, source: &str) -> Option<MethodRecord> {
    let name_node = node.child_by_field_name("name")?;

    Some(MethodRecord::new(
        node.start_position().row,
        get_text(&name_node, source),
        get_text(node, source),
    ))
}

/// Extracts the dotted path of an import declaration.
fn extract_import(node: &Node, source: &str) -> Option<String> {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() == "scoped_identifier" || child.kind() == "identifier" {
                return Some(get_text(&child, source));
            }
        }
    }
    None
}

// ============================================================================
// Helper functions
// ============================================================================

/// Gets text content of a node.
fn get_text(node: &Node, source: &str) -> String {
    source[node.byte_range()].to_string()
}

/// Reduces a type reference to its simple name: `java.util.Map.Entry<K, V>`
/// becomes `Entry`.
fn simple_type_name(text: &str) -> String {
    let without_generics = text.split('<').next().unwrap_or(text);
    without_generics
        .rsplit('.')
        .next()
        .unwrap_or(without_generics)
        .trim()
        .to_string()
}

/// Finds the row of the first error or missing node.
fn first_error_row(node: &Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row);
    }

    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.has_error() {
                if let Some(row) = first_error_row(&child) {
                    return Some(row);
                }
            }
        }
    }
    None
}
