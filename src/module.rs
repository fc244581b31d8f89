//! Module nodes - one graph node per top-level type declaration
//!
//! Every declared type maps onto a closed set of kinds:
//! - `Class`
//! - `Interface`
//! - `Struct`
//! - `Enum`
//! - `Other`: records and any declaration form the parser does not recognize

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Namespace assigned to declarations that sit outside any namespace.
pub const GLOBAL_NAMESPACE: &str = "Global";

/// The closed set of declaration kinds a module node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    Class,
    Interface,
    Struct,
    Enum,
    Other,
}

impl ModuleKind {
    /// Get the string representation of the module kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Class => "Class",
            ModuleKind::Interface => "Interface",
            ModuleKind::Struct => "Struct",
            ModuleKind::Enum => "Enum",
            ModuleKind::Other => "Other",
        }
    }

    /// Get all module kinds
    pub fn all() -> &'static [ModuleKind] {
        &[
            ModuleKind::Class,
            ModuleKind::Interface,
            ModuleKind::Struct,
            ModuleKind::Enum,
            ModuleKind::Other,
        ]
    }
}

impl FromStr for ModuleKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "class" => Ok(ModuleKind::Class),
            "interface" => Ok(ModuleKind::Interface),
            "struct" => Ok(ModuleKind::Struct),
            "enum" => Ok(ModuleKind::Enum),
            "other" | "type" => Ok(ModuleKind::Other),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derive the node id for a declaration: `{project}:{namespace}.{name}`.
pub fn module_id(project: &str, namespace: &str, name: &str) -> String {
    format!("{}:{}.{}", project, namespace, name)
}

/// A node in the dependency graph.
///
/// The id is derived from project, namespace and name, so re-ingesting the
/// same declaration addresses the same node and overwrites its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleNode {
    pub id: String,
    /// Type identifier, not qualified
    pub name: String,
    /// Enclosing namespace, or [`GLOBAL_NAMESPACE`]
    pub namespace: String,
    pub kind: ModuleKind,
    /// Path of the declaring file inside the ingested project
    pub file_path: String,
}

impl ModuleNode {
    /// Create a node, deriving its id from the project name
    pub fn new(
        project: &str,
        namespace: impl Into<String>,
        name: impl Into<String>,
        kind: ModuleKind,
        file_path: impl Into<String>,
    ) -> Self {
        let namespace = namespace.into();
        let name = name.into();
        Self {
            id: module_id(project, &namespace, &name),
            name,
            namespace,
            kind,
            file_path: file_path.into(),
        }
    }

    /// Fully qualified type name (`{namespace}.{name}`)
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Drop the file path for search listings
    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            kind: self.kind,
        }
    }
}

/// Search result shape: a node without its file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub kind: ModuleKind,
}
