//! Declaration extraction
//!
//! Turns a project's source files into module nodes and placeholder import
//! edges. Pure function of its input: no I/O, no store access.

use std::collections::HashMap;
use crate::{Error, Result};
use crate::adapter::AdapterRegistry;
use crate::edge::PlaceholderEdge;
use crate::module::{ModuleNode, GLOBAL_NAMESPACE};

/// A source file handed to the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path inside the project (archive entry name or relative path)
    pub path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// How to treat two declarations that derive the same node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Later declaration replaces the attributes of the earlier one; the node
    /// keeps its first position. Mirrors the store's merge-by-id upsert.
    #[default]
    OverwriteById,
    /// First declaration wins; later duplicates are reported and dropped
    /// together with their imports.
    KeepFirst,
}

/// Result of extracting one project
#[derive(Debug, Default)]
pub struct Extraction {
    /// Unique nodes in first-declaration order
    pub nodes: Vec<ModuleNode>,
    /// One placeholder per (declared node, file import)
    pub placeholders: Vec<PlaceholderEdge>,
    /// Files that produced a parse result
    pub files_parsed: usize,
    /// Files skipped because the source failed to parse or no adapter matched
    pub files_skipped: usize,
    /// Ids declared more than once, one entry per repeat
    pub duplicates: Vec<String>,
}

/// Extracts declarations with the registered adapters
pub struct Extractor<'a> {
    registry: &'a AdapterRegistry,
    policy: MergePolicy,
}

impl<'a> Extractor<'a> {
    pub fn new(registry: &'a AdapterRegistry) -> Self {
        Self {
            registry,
            policy: MergePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Extract nodes and placeholder edges for every file of `project`.
    ///
    /// A file that fails to parse is skipped. Any other adapter error, such
    /// as a grammar that cannot be loaded, aborts the extraction.
    pub fn extract(&self, project: &str, files: &[SourceFile]) -> Result<Extraction> {
        let mut extraction = Extraction::default();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for file in files {
            let parsed = match self.registry.parse_source(&file.path, &file.text) {
                Ok(Some(parsed)) => parsed,
                Ok(None) => {
                    tracing::debug!("No adapter for {}, skipping", file.path);
                    extraction.files_skipped += 1;
                    continue;
                }
                Err(Error::Parse(e)) => {
                    tracing::warn!("Failed to parse {}: {}", file.path, e);
                    extraction.files_skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            extraction.files_parsed += 1;

            for decl in parsed.declarations {
                let namespace = decl.namespace.unwrap_or_else(|| GLOBAL_NAMESPACE.to_string());
                let node = ModuleNode::new(project, namespace, decl.name, decl.kind, &file.path);
                let source_id = node.id.clone();

                match (self.policy, positions.get(&node.id)) {
                    (MergePolicy::OverwriteById, Some(&position)) => {
                        tracing::warn!(
                            "Duplicate module id {} ({} overwrites {})",
                            node.id, file.path, extraction.nodes[position].file_path
                        );
                        extraction.duplicates.push(node.id.clone());
                        extraction.nodes[position] = node;
                    }
                    (MergePolicy::KeepFirst, Some(&position)) => {
                        tracing::warn!(
                            "Duplicate module id {} in {} ignored, keeping {}",
                            node.id, file.path, extraction.nodes[position].file_path
                        );
                        extraction.duplicates.push(node.id.clone());
                        continue;
                    }
                    (_, None) => {
                        positions.insert(node.id.clone(), extraction.nodes.len());
                        extraction.nodes.push(node);
                    }
                }

                for import in &parsed.imports {
                    extraction.placeholders.push(PlaceholderEdge::new(&source_id, import));
                }
            }
        }

        tracing::debug!(
            "Extracted {} nodes and {} placeholder edges from {} files",
            extraction.nodes.len(),
            extraction.placeholders.len(),
            extraction.files_parsed
        );
        Ok(extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{default_registry, AdapterRegistry, ParsedSource, SourceParser};
    use crate::module::ModuleKind;

    /// Adapter that fails every file with the given error
    struct FailingAdapter {
        config_fault: bool,
    }

    impl SourceParser for FailingAdapter {
        fn language_name(&self) -> &str {
            "Failing"
        }

        fn file_extensions(&self) -> &[&str] {
            &["cs"]
        }

        fn parse_source(&self, path: &str, _content: &str) -> Result<ParsedSource> {
            if self.config_fault {
                Err(Error::Adapter("Failed to set language: incompatible version".into()))
            } else {
                Err(Error::Parse(format!("{}: no syntax tree", path)))
            }
        }
    }

    fn failing_registry(config_fault: bool) -> AdapterRegistry {
        let mut registry = AdapterRegistry::new();
        registry.register(FailingAdapter { config_fault });
        registry
    }

    #[test]
    fn test_extracts_nodes_and_placeholders() {
        let registry = default_registry();
        let files = vec![
            SourceFile::new("src/X.cs", "using A.B.C;\nusing System;\nnamespace A.B { class X {} interface IX {} }"),
            SourceFile::new("src/Y.cs", "namespace A.B.C { class Y {} }"),
        ];

        let extraction = Extractor::new(&registry).extract("proj", &files).unwrap();

        let ids: Vec<_> = extraction.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["proj:A.B.X", "proj:A.B.IX", "proj:A.B.C.Y"]);
        assert_eq!(extraction.files_parsed, 2);
        // two nodes in X.cs, two imports each
        assert_eq!(extraction.placeholders.len(), 4);
        assert!(extraction.placeholders.contains(&PlaceholderEdge::new("proj:A.B.IX", "A.B.C")));
    }

    #[test]
    fn test_global_namespace_sentinel() {
        let registry = default_registry();
        let files = vec![SourceFile::new("Program.cs", "class Program {}")];

        let extraction = Extractor::new(&registry).extract("p", &files).unwrap();
        assert_eq!(extraction.nodes[0].namespace, GLOBAL_NAMESPACE);
        assert_eq!(extraction.nodes[0].id, "p:Global.Program");
    }

    #[test]
    fn test_overwrite_by_id_policy() {
        let registry = default_registry();
        let files = vec![
            SourceFile::new("a/Dup.cs", "namespace N { class Dup {} class Keep {} }"),
            SourceFile::new("b/Dup.cs", "using Other;\nnamespace N { interface Dup {} }"),
        ];

        let extraction = Extractor::new(&registry)
            .with_policy(MergePolicy::OverwriteById)
            .extract("p", &files).unwrap();

        assert_eq!(extraction.nodes.len(), 2);
        // the node keeps its first position but carries the later attributes
        assert_eq!(extraction.nodes[0].id, "p:N.Dup");
        assert_eq!(extraction.nodes[0].file_path, "b/Dup.cs");
        assert_eq!(extraction.nodes[0].kind, ModuleKind::Interface);
        assert_eq!(extraction.duplicates, vec!["p:N.Dup".to_string()]);
        assert_eq!(extraction.placeholders, vec![PlaceholderEdge::new("p:N.Dup", "Other")]);
    }

    #[test]
    fn test_keep_first_policy() {
        let registry = default_registry();
        let files = vec![
            SourceFile::new("a/Dup.cs", "namespace N { class Dup {} }"),
            SourceFile::new("b/Dup.cs", "using Other;\nnamespace N { interface Dup {} }"),
        ];

        let extraction = Extractor::new(&registry)
            .with_policy(MergePolicy::KeepFirst)
            .extract("p", &files).unwrap();

        assert_eq!(extraction.nodes.len(), 1);
        assert_eq!(extraction.nodes[0].file_path, "a/Dup.cs");
        assert!(extraction.placeholders.is_empty());
    }

    #[test]
    fn test_non_source_files_are_skipped() {
        let registry = default_registry();
        let files = vec![SourceFile::new("README.md", "# readme")];

        let extraction = Extractor::new(&registry).extract("p", &files).unwrap();
        assert!(extraction.nodes.is_empty());
        assert_eq!(extraction.files_skipped, 1);
    }

    #[test]
    fn test_adapter_fault_aborts_extraction() {
        let registry = failing_registry(true);
        let files = vec![SourceFile::new("src/X.cs", "namespace A { class X {} }")];

        let result = Extractor::new(&registry).extract("p", &files);
        assert!(matches!(result, Err(Error::Adapter(_))));
    }

    #[test]
    fn test_parse_failure_skips_file() {
        let registry = failing_registry(false);
        let files = vec![
            SourceFile::new("src/X.cs", "namespace A { class X {} }"),
            SourceFile::new("src/Y.cs", "namespace A { class Y {} }"),
        ];

        let extraction = Extractor::new(&registry).extract("p", &files).unwrap();
        assert!(extraction.nodes.is_empty());
        assert_eq!(extraction.files_parsed, 0);
        assert_eq!(extraction.files_skipped, 2);
    }
}
