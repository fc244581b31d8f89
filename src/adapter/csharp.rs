//! C# language adapter
//!
//! Walks the tree-sitter syntax tree of a C# file and reports the `using`
//! directives of the compilation unit plus the type declarations that sit
//! directly in the compilation unit or in a namespace. Types nested inside
//! other types are skipped, and so are `using` directives inside a block
//! namespace body.

use crate::{Error, Result};
use crate::module::ModuleKind;
use super::framework::{ParsedSource, SourceParser, TypeDeclaration};
use tree_sitter::{Node, Parser};

/// C# adapter backed by the tree-sitter C# grammar
pub struct CSharpParser;

impl CSharpParser {
    pub fn new() -> Self {
        Self
    }

    /// `top_level` is true for the compilation unit and a file-scoped
    /// namespace, the only places whose usings apply to the whole file.
    fn collect(&self, node: Node, namespace: Option<&str>, top_level: bool, source: &[u8], out: &mut ParsedSource) {
        // A file-scoped namespace applies to every sibling that follows it
        let mut file_namespace: Option<String> = None;
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            let enclosing = file_namespace.as_deref().or(namespace);

            match child.kind() {
                "using_directive" if top_level => {
                    if let Some(target) = child.utf8_text(source).ok().and_then(using_target) {
                        out.add_import(target);
                    }
                }
                "namespace_declaration" => {
                    let Some(name) = field_text(child, "name", source) else {
                        continue;
                    };
                    let qualified = qualify(enclosing, &name);
                    let body = child.child_by_field_name("body").or_else(|| {
                        let mut body_cursor = child.walk();
                        let found = child
                            .named_children(&mut body_cursor)
                            .find(|n| n.kind() == "declaration_list");
                        found
                    });
                    if let Some(body) = body {
                        self.collect(body, Some(&qualified), false, source, out);
                    }
                }
                "file_scoped_namespace_declaration" => {
                    let Some(name) = field_text(child, "name", source) else {
                        continue;
                    };
                    let qualified = qualify(namespace, &name);
                    // Some grammar versions nest the members under the declaration
                    self.collect(child, Some(&qualified), top_level, source, out);
                    file_namespace = Some(qualified);
                }
                kind => {
                    if let Some(module_kind) = declaration_kind(kind) {
                        if let Some(name) = field_text(child, "name", source) {
                            out.add_declaration(TypeDeclaration {
                                kind: module_kind,
                                namespace: enclosing.map(str::to_string),
                                name,
                            });
                        }
                    }
                }
            }
        }
    }
}

impl Default for CSharpParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceParser for CSharpParser {
    fn language_name(&self) -> &str {
        "C#"
    }

    fn file_extensions(&self) -> &[&str] {
        &["cs"]
    }

    fn parse_source(&self, path: &str, content: &str) -> Result<ParsedSource> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_c_sharp::LANGUAGE.into())
            .map_err(|e| Error::Adapter(format!("Failed to set language: {}", e)))?;

        let tree = parser
            .parse(content, None)
            .ok_or_else(|| Error::Parse(format!("tree-sitter produced no tree for {}", path)))?;

        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!("{} has syntax errors, extracting what parsed", path);
        }

        let mut parsed = ParsedSource::new();
        self.collect(root, None, true, content.as_bytes(), &mut parsed);
        Ok(parsed)
    }
}

/// Map a declaration node kind onto the module kind set.
///
/// Returns `None` for nodes that are not base type declarations (delegates,
/// global statements, attributes, ...).
fn declaration_kind(kind: &str) -> Option<ModuleKind> {
    match kind {
        "class_declaration" => Some(ModuleKind::Class),
        "interface_declaration" => Some(ModuleKind::Interface),
        "struct_declaration" => Some(ModuleKind::Struct),
        "enum_declaration" => Some(ModuleKind::Enum),
        "record_declaration" | "record_struct_declaration" | "record_class_declaration" => {
            Some(ModuleKind::Other)
        }
        _ => None,
    }
}

fn field_text(node: Node, field: &str, source: &[u8]) -> Option<String> {
    let text = node.child_by_field_name(field)?.utf8_text(source).ok()?;
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    (!compact.is_empty()).then_some(compact)
}

fn qualify(outer: Option<&str>, name: &str) -> String {
    match outer {
        Some(outer) => format!("{}.{}", outer, name),
        None => name.to_string(),
    }
}

/// Extract the imported name from the text of a using directive.
///
/// `global using static A.B;` and `using Alias = A.B;` both yield `A.B`.
fn using_target(directive: &str) -> Option<String> {
    let mut rest = directive.trim().trim_end_matches(';').trim();

    loop {
        let stripped = ["global", "using", "static", "unsafe"]
            .iter()
            .find_map(|keyword| strip_keyword(rest, keyword));
        match stripped {
            Some(next) => rest = next,
            None => break,
        }
    }

    if let Some((_, target)) = rest.split_once('=') {
        rest = target;
    }

    let target: String = rest.chars().filter(|c| !c.is_whitespace()).collect();
    (!target.is_empty()).then_some(target)
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}
