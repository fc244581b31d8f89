//! Core adapter framework
//!
//! Defines the parser contract the extractor consumes. An adapter only has to
//! report a file's import directives and its top-level type declarations; the
//! extractor never sees syntax trees.

use crate::Result;
use crate::module::ModuleKind;
use std::path::Path;

/// One top-level type declaration found in a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDeclaration {
    /// Kind mapped onto the closed module kind set
    pub kind: ModuleKind,
    /// Fully qualified enclosing namespace, or `None` outside any namespace
    pub namespace: Option<String>,
    /// Type identifier
    pub name: String,
}

/// What an adapter extracts from a single file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSource {
    /// Import directives as plain namespace strings, deduplicated
    pub imports: Vec<String>,
    /// Top-level type declarations in source order
    pub declarations: Vec<TypeDeclaration>,
}

impl ParsedSource {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an import, ignoring repeats within the file
    pub fn add_import(&mut self, import: impl Into<String>) {
        let import = import.into();
        if !import.is_empty() && !self.imports.contains(&import) {
            self.imports.push(import);
        }
    }

    pub fn add_declaration(&mut self, declaration: TypeDeclaration) {
        self.declarations.push(declaration);
    }
}

/// Trait for source parsers
///
/// Each adapter is responsible for:
/// 1. Identifying files it can parse
/// 2. Reporting the file's import directives
/// 3. Reporting top-level type declarations with their namespace
pub trait SourceParser: Send + Sync {
    /// Get the language name (for display)
    fn language_name(&self) -> &str;

    /// Get file extensions this adapter handles (lowercase, no dot)
    fn file_extensions(&self) -> &[&str];

    /// Check if this adapter can handle a file
    fn can_handle(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_ascii_lowercase();
            self.file_extensions().contains(&ext.as_str())
        } else {
            false
        }
    }

    /// Parse one file
    fn parse_source(&self, path: &str, content: &str) -> Result<ParsedSource>;
}

/// Registry of source parsers
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn SourceParser>>,
}

impl AdapterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter
    pub fn register(&mut self, adapter: impl SourceParser + 'static) {
        self.adapters.push(Box::new(adapter));
    }

    /// Find an adapter for a file
    pub fn find_adapter(&self, path: &Path) -> Option<&dyn SourceParser> {
        self.adapters
            .iter()
            .find(|a| a.can_handle(path))
            .map(|a| a.as_ref())
    }

    /// Whether any registered adapter accepts this path
    pub fn is_source(&self, path: &Path) -> bool {
        self.find_adapter(path).is_some()
    }

    /// Get all registered adapters
    pub fn adapters(&self) -> &[Box<dyn SourceParser>] {
        &self.adapters
    }

    /// Parse a file using the appropriate adapter
    pub fn parse_source(&self, path: &str, content: &str) -> Result<Option<ParsedSource>> {
        match self.find_adapter(Path::new(path)) {
            Some(adapter) => adapter.parse_source(path, content).map(Some),
            None => Ok(None),
        }
    }
}

/// Create a default registry with all built-in adapters
pub fn default_registry() -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    registry.register(super::csharp::CSharpParser::new());
    registry
}
