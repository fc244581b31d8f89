//! Storage Layer - graph persistence contract
//!
//! The graph lives behind [`GraphStore`]: merge-by-id upserts for nodes,
//! edges and packages plus bounded read queries. Two backends:
//! - [`SqliteStore`]: system of record, tables `modules`, `edges`, `packages`
//! - [`MemoryStore`]: adjacency lists in memory, same contract
//!
//! Ingest is two-phase. [`GraphStore::ensure_schema`] establishes the
//! uniqueness constraints; [`GraphStore::ingest`] then writes one statement
//! per entity with no batch-wide transaction, so a failure part-way leaves
//! the earlier writes committed.

pub mod schema;
pub mod sqlite;
pub mod memory;

pub use sqlite::SqliteStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use crate::Result;
use crate::edge::Edge;
use crate::module::{ModuleKind, ModuleNode};
use crate::package::PackageRecord;

/// Hard cap on node listings
pub const MAX_LISTED_NODES: usize = 1000;
/// Hard cap on edge listings
pub const MAX_LISTED_EDGES: usize = 5000;
/// Hard cap on package listings
pub const MAX_LISTED_PACKAGES: usize = 1000;
/// Default and cap for substring search
pub const MAX_SEARCH_RESULTS: usize = 50;
/// Package records attached to a module detail
pub const DETAIL_PACKAGE_LIMIT: usize = 50;

/// One end of an `IMPORTS` relationship seen from a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    /// Id of the module on the other end
    pub node_id: String,
    pub source_name: String,
    pub target_name: String,
}

/// Aggregate view of one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDetail {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub kind: ModuleKind,
    pub file_path: String,
    /// Distinct target names of the outgoing edges
    pub imports: Vec<String>,
    pub outgoing: Vec<Relation>,
    pub incoming: Vec<Relation>,
    /// Package records of the whole store, not scoped to this module
    pub package_risks: Vec<PackageRecord>,
}

/// What one ingest call submitted and wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub nodes: usize,
    pub edges: usize,
    /// Edges skipped because an endpoint was not a stored node
    pub edges_skipped: usize,
    pub packages: usize,
}

/// Store statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub modules: usize,
    pub edges: usize,
    pub packages: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Graph Statistics:")?;
        writeln!(f, "  Modules: {}", self.modules)?;
        writeln!(f, "  Edges: {}", self.edges)?;
        writeln!(f, "  Packages: {}", self.packages)
    }
}

/// Persistence contract for the dependency graph.
///
/// Implementations must be safe to share across request handlers; each
/// method is atomic on its own and nothing spans calls.
pub trait GraphStore: Send + Sync {
    /// Establish uniqueness on module id and package name. Idempotent.
    fn ensure_schema(&self) -> Result<()>;

    /// Merge a node by id, overwriting its attributes
    fn upsert_node(&self, node: &ModuleNode) -> Result<()>;

    /// Merge an edge if both endpoints exist. Returns `false` when skipped.
    fn upsert_edge(&self, edge: &Edge) -> Result<bool>;

    /// Merge a package by name, overwriting its attributes
    fn upsert_package(&self, package: &PackageRecord) -> Result<()>;

    fn get_node(&self, id: &str) -> Result<Option<ModuleNode>>;

    /// Nodes in storage order, at most `min(limit, MAX_LISTED_NODES)`
    fn list_nodes(&self, limit: usize) -> Result<Vec<ModuleNode>>;

    /// Edges in storage order, at most `min(limit, MAX_LISTED_EDGES)`
    fn list_edges(&self, limit: usize) -> Result<Vec<Edge>>;

    /// Case-insensitive substring match on name or namespace
    fn search_nodes(&self, query: &str, limit: usize) -> Result<Vec<ModuleNode>>;

    /// Targets of the node's outgoing `IMPORTS` edges
    fn outgoing(&self, id: &str) -> Result<Vec<ModuleNode>>;

    /// Sources of the node's incoming `IMPORTS` edges
    fn incoming(&self, id: &str) -> Result<Vec<ModuleNode>>;

    /// Packages in storage order, at most `min(limit, MAX_LISTED_PACKAGES)`
    fn list_packages(&self, limit: usize) -> Result<Vec<PackageRecord>>;

    fn stats(&self) -> Result<StoreStats>;

    /// Write phase of an ingest: nodes, then edges, then packages
    fn ingest(
        &self,
        nodes: &[ModuleNode],
        edges: &[Edge],
        packages: &[PackageRecord],
    ) -> Result<WriteSummary> {
        let mut summary = WriteSummary::default();

        for node in nodes {
            self.upsert_node(node)?;
            summary.nodes += 1;
        }

        for edge in edges {
            if self.upsert_edge(edge)? {
                summary.edges += 1;
            } else {
                summary.edges_skipped += 1;
            }
        }

        for package in packages {
            self.upsert_package(package)?;
            summary.packages += 1;
        }

        Ok(summary)
    }

    /// The node with its relationships, or `None` if the id is unknown
    fn module_detail(&self, id: &str) -> Result<Option<ModuleDetail>> {
        let Some(node) = self.get_node(id)? else {
            return Ok(None);
        };

        let outgoing: Vec<Relation> = self
            .outgoing(id)?
            .into_iter()
            .map(|target| Relation {
                node_id: target.id,
                source_name: node.name.clone(),
                target_name: target.name,
            })
            .collect();

        let incoming: Vec<Relation> = self
            .incoming(id)?
            .into_iter()
            .map(|source| Relation {
                node_id: source.id,
                source_name: source.name,
                target_name: node.name.clone(),
            })
            .collect();

        let mut imports: Vec<String> = Vec::new();
        for rel in &outgoing {
            if !imports.contains(&rel.target_name) {
                imports.push(rel.target_name.clone());
            }
        }

        Ok(Some(ModuleDetail {
            id: node.id,
            name: node.name,
            namespace: node.namespace,
            kind: node.kind,
            file_path: node.file_path,
            imports,
            outgoing,
            incoming,
            package_risks: self.list_packages(DETAIL_PACKAGE_LIMIT)?,
        }))
    }
}
