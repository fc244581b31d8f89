//! Edge types
//!
//! The graph carries a single relationship today:
//! - `Imports`: module → module, derived from `using` directives
//!
//! Extraction produces [`PlaceholderEdge`]s that still point at a raw import
//! string; the linker turns them into concrete [`Edge`]s.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Edge kinds stored in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// Source module's file imports a namespace containing the target
    Imports,
}

impl EdgeKind {
    /// Get the string representation of the edge kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Imports => "IMPORTS",
        }
    }

    /// Get all edge kinds
    pub fn all() -> &'static [EdgeKind] {
        &[EdgeKind::Imports]
    }
}

impl FromStr for EdgeKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "IMPORTS" | "IMPORT" => Ok(EdgeKind::Imports),
            _ => Err(crate::Error::InvalidKind(format!("Unknown edge kind: {}", s))),
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed, resolved edge between two module ids.
///
/// Identity is the full `(source, target, kind)` tuple, so duplicates
/// collapse in hash sets and in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    /// Shorthand for an `IMPORTS` edge
    pub fn imports(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(source, target, EdgeKind::Imports)
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// An import edge whose target is still the raw import string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceholderEdge {
    /// Id of the importing module
    pub source: String,
    /// Namespace reference exactly as written in the directive
    pub import: String,
}

impl PlaceholderEdge {
    pub fn new(source: impl Into<String>, import: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            import: import.into(),
        }
    }
}
