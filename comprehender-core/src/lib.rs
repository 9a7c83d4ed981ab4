//! Comprehender Core - Java symbol extraction
//!
//! This crate turns Java source text into the structural records the rest of
//! Comprehender works with: the methods of a file (with the line each one
//! starts on) and the primary class declared in it (with its supertypes and
//! imports).
//!
//! # Example
//!
//! ```no_run
//! use comprehender_core::{JavaExtractor, SymbolExtractor};
//!
//! let source = "public class Greeter { void greet() {} }";
//! let parsed = JavaExtractor.extract(source);
//!
//! assert_eq!(parsed.methods[0].name, "greet");
//! ```
//!
//! Extraction fails closed: unparseable input yields an empty
//! [`ParsedSource`] instead of an error.

pub mod discover;
pub mod error;
pub mod extractor;
pub mod model;

pub use discover::{
    annotated_output_path, discover_sources, is_annotated_output, is_java_source,
    ANNOTATED_SUFFIX, JAVA_EXTENSION,
};
pub use error::{ParseError, Result};
pub use extractor::{JavaExtractor, SymbolExtractor};
pub use model::{ClassDecl, ClassRecord, MethodRecord, ParsedSource};
