//! Error types for symbol extraction.

use thiserror::Error;

/// Why a source file could not be turned into structural records.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The Java grammar could not be loaded into the parser.
    #[error("failed to load Java grammar: {0}")]
    Language(String),

    /// Tree-sitter gave up without producing a tree.
    #[error("tree-sitter returned no tree")]
    NoTree,

    /// The source contains syntax errors.
    #[error("syntax error near line {line}")]
    Syntax { line: usize },
}

pub type Result<T> = std::result::Result<T, ParseError>;
