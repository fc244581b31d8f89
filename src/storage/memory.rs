//! In-memory graph store
//!
//! Adjacency lists behind a single `RwLock`. Mirrors [`super::SqliteStore`]
//! down to the schema step: every operation fails with
//! [`Error::SchemaMissing`] until [`GraphStore::ensure_schema`] has run.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use crate::{Error, Result};
use crate::edge::{Edge, EdgeKind};
use crate::module::ModuleNode;
use crate::package::PackageRecord;
use super::{
    GraphStore, StoreStats, MAX_LISTED_EDGES, MAX_LISTED_NODES, MAX_LISTED_PACKAGES, MAX_SEARCH_RESULTS,
};

#[derive(Default)]
struct Graph {
    nodes: Vec<ModuleNode>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    edge_set: HashSet<Edge>,
    /// node id -> positions in `edges`
    outgoing: HashMap<String, Vec<usize>>,
    incoming: HashMap<String, Vec<usize>>,
    packages: Vec<PackageRecord>,
    package_index: HashMap<String, usize>,
}

impl Graph {
    fn neighbors(&self, adjacency: &HashMap<String, Vec<usize>>, id: &str, outgoing: bool) -> Vec<ModuleNode> {
        adjacency
            .get(id)
            .into_iter()
            .flatten()
            .map(|&pos| &self.edges[pos])
            .filter(|edge| edge.kind == EdgeKind::Imports)
            .filter_map(|edge| {
                let other = if outgoing { &edge.target } else { &edge.source };
                self.node_index.get(other).map(|&i| self.nodes[i].clone())
            })
            .collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    schema_ready: AtomicBool,
    graph: RwLock<Graph>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Graph>> {
        if !self.schema_ready.load(Ordering::Acquire) {
            return Err(Error::SchemaMissing);
        }
        self.graph.read().map_err(|_| Error::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Graph>> {
        if !self.schema_ready.load(Ordering::Acquire) {
            return Err(Error::SchemaMissing);
        }
        self.graph.write().map_err(|_| Error::LockPoisoned)
    }
}

impl GraphStore for MemoryStore {
    fn ensure_schema(&self) -> Result<()> {
        self.schema_ready.store(true, Ordering::Release);
        Ok(())
    }

    fn upsert_node(&self, node: &ModuleNode) -> Result<()> {
        let mut graph = self.write()?;
        match graph.node_index.get(&node.id).copied() {
            Some(pos) => graph.nodes[pos] = node.clone(),
            None => {
                let pos = graph.nodes.len();
                graph.node_index.insert(node.id.clone(), pos);
                graph.nodes.push(node.clone());
            }
        }
        Ok(())
    }

    fn upsert_edge(&self, edge: &Edge) -> Result<bool> {
        let mut graph = self.write()?;
        if !graph.node_index.contains_key(&edge.source) || !graph.node_index.contains_key(&edge.target) {
            return Ok(false);
        }
        if graph.edge_set.insert(edge.clone()) {
            let pos = graph.edges.len();
            graph.edges.push(edge.clone());
            graph.outgoing.entry(edge.source.clone()).or_default().push(pos);
            graph.incoming.entry(edge.target.clone()).or_default().push(pos);
        }
        Ok(true)
    }

    fn upsert_package(&self, package: &PackageRecord) -> Result<()> {
        let mut graph = self.write()?;
        match graph.package_index.get(&package.name).copied() {
            Some(pos) => graph.packages[pos] = package.clone(),
            None => {
                let pos = graph.packages.len();
                graph.package_index.insert(package.name.clone(), pos);
                graph.packages.push(package.clone());
            }
        }
        Ok(())
    }

    fn get_node(&self, id: &str) -> Result<Option<ModuleNode>> {
        let graph = self.read()?;
        Ok(graph.node_index.get(id).map(|&pos| graph.nodes[pos].clone()))
    }

    fn list_nodes(&self, limit: usize) -> Result<Vec<ModuleNode>> {
        let graph = self.read()?;
        Ok(graph.nodes.iter().take(limit.min(MAX_LISTED_NODES)).cloned().collect())
    }

    fn list_edges(&self, limit: usize) -> Result<Vec<Edge>> {
        let graph = self.read()?;
        Ok(graph.edges.iter().take(limit.min(MAX_LISTED_EDGES)).cloned().collect())
    }

    fn search_nodes(&self, query: &str, limit: usize) -> Result<Vec<ModuleNode>> {
        let graph = self.read()?;
        let needle = query.to_lowercase();
        Ok(graph
            .nodes
            .iter()
            .filter(|n| n.name.to_lowercase().contains(&needle) || n.namespace.to_lowercase().contains(&needle))
            .take(limit.min(MAX_SEARCH_RESULTS))
            .cloned()
            .collect())
    }

    fn outgoing(&self, id: &str) -> Result<Vec<ModuleNode>> {
        let graph = self.read()?;
        Ok(graph.neighbors(&graph.outgoing, id, true))
    }

    fn incoming(&self, id: &str) -> Result<Vec<ModuleNode>> {
        let graph = self.read()?;
        Ok(graph.neighbors(&graph.incoming, id, false))
    }

    fn list_packages(&self, limit: usize) -> Result<Vec<PackageRecord>> {
        let graph = self.read()?;
        Ok(graph.packages.iter().take(limit.min(MAX_LISTED_PACKAGES)).cloned().collect())
    }

    fn stats(&self) -> Result<StoreStats> {
        let graph = self.read()?;
        Ok(StoreStats {
            modules: graph.nodes.len(),
            edges: graph.edges.len(),
            packages: graph.packages.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contract;

    #[test]
    fn test_idempotent_ingest() {
        contract::idempotent_ingest(&MemoryStore::new());
    }

    #[test]
    fn test_edge_endpoint_closure() {
        contract::edge_endpoint_closure(&MemoryStore::new());
    }

    #[test]
    fn test_last_write_wins() {
        contract::last_write_wins(&MemoryStore::new());
    }

    #[test]
    fn test_case_insensitive_search() {
        contract::case_insensitive_search(&MemoryStore::new());
    }

    #[test]
    fn test_listing_caps() {
        contract::caps(&MemoryStore::new());
    }

    #[test]
    fn test_module_detail() {
        contract::detail(&MemoryStore::new());
    }

    #[test]
    fn test_schema_missing() {
        let store = MemoryStore::new();
        let result = store.ingest(&[contract::node("A", "X")], &[], &[]);
        assert!(matches!(result, Err(Error::SchemaMissing)));
        assert!(matches!(store.list_nodes(10), Err(Error::SchemaMissing)));
    }
}
