//! Query engine implementation
//!
//! Read-side operations over a [`GraphStore`]:
//! - Node and edge listings (capped)
//! - Substring search over name and namespace
//! - Module detail with incoming/outgoing relations
//! - Explanations via [`Explainer`]

use crate::Result;
use crate::edge::Edge;
use crate::module::{ModuleNode, NodeSummary};
use crate::storage::{GraphStore, ModuleDetail, StoreStats, MAX_SEARCH_RESULTS};
use super::explain::{Explainer, Explanation};

/// Query engine over any graph store
pub struct QueryEngine<'a> {
    store: &'a dyn GraphStore,
}

impl<'a> QueryEngine<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self { store }
    }

    pub fn nodes(&self, limit: usize) -> Result<Vec<ModuleNode>> {
        self.store.list_nodes(limit)
    }

    pub fn edges(&self, limit: usize) -> Result<Vec<Edge>> {
        self.store.list_edges(limit)
    }

    /// Search by name or namespace; `None` uses the default limit
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<Vec<NodeSummary>> {
        let limit = limit.unwrap_or(MAX_SEARCH_RESULTS);
        let hits = self.store.search_nodes(query, limit)?;
        tracing::debug!("Search '{}': {} hits", query, hits.len());
        Ok(hits.iter().map(ModuleNode::summary).collect())
    }

    /// `Ok(None)` when no module has this id
    pub fn module_detail(&self, id: &str) -> Result<Option<ModuleDetail>> {
        self.store.module_detail(id)
    }

    pub async fn explain(&self, id: &str, explainer: &Explainer) -> Result<Option<Explanation>> {
        let Some(detail) = self.module_detail(id)? else {
            return Ok(None);
        };
        let explanation = explainer.explain(&detail).await?;
        Ok(Some(Explanation {
            id: id.to_string(),
            explanation,
        }))
    }

    pub fn stats(&self) -> Result<StoreStats> {
        self.store.stats()
    }
}
