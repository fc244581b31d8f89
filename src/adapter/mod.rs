//! Language Adapter Framework
//!
//! Each language provides a Tree-sitter grammar and an adapter that reports
//! import directives and top-level type declarations. The extractor never
//! sees language-specific logic.

pub mod framework;
pub mod csharp;

pub use framework::{SourceParser, ParsedSource, TypeDeclaration, AdapterRegistry, default_registry};
pub use csharp::CSharpParser;
