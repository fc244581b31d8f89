use std::collections::HashSet;
use std::fmt;
use crate::edge::{Edge, PlaceholderEdge};
use crate::module::ModuleNode;
use super::namespace_index::NamespaceIndex;

/// Most target nodes a single import reference can expand to.
pub const MAX_TARGETS_PER_IMPORT: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportLinkerStats {
    /// Placeholder edges processed
    pub placeholders: usize,
    /// Resolved edges emitted after deduplication
    pub resolved: usize,
    /// Expansions that collapsed into an already emitted edge
    pub duplicates: usize,
    /// Placeholders whose import matched no node (dropped)
    pub unresolved: usize,
    /// Placeholders that hit the per-import target cap
    pub truncated: usize,
}

impl fmt::Display for ImportLinkerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Import Linker Stats:")?;
        writeln!(f, "  Placeholders: {}", self.placeholders)?;
        writeln!(f, "  ✅ Resolved edges: {}", self.resolved)?;
        writeln!(f, "  🔁 Duplicates: {}", self.duplicates)?;
        writeln!(f, "  🌍 Unresolved: {}", self.unresolved)?;
        writeln!(f, "  ✂️  Truncated: {}", self.truncated)
    }
}

/// Resolves placeholder import edges with the namespace-prefix heuristic.
///
/// An import `S` links the importing module to every node whose namespace
/// starts with `S` (first [`MAX_TARGETS_PER_IMPORT`] in node-list order). This
/// is an over-approximation standing in for a symbol table: `"Foo.Bar"` links
/// to `"Foo.Bar"`, `"Foo.Bar.Baz"` and `"Foo.BarQux"` alike. Imports that
/// match nothing are dropped.
pub struct ImportLinker {
    index: NamespaceIndex,
    max_targets: usize,
}

impl ImportLinker {
    pub fn new(nodes: &[ModuleNode]) -> Self {
        Self {
            index: NamespaceIndex::build(nodes),
            max_targets: MAX_TARGETS_PER_IMPORT,
        }
    }

    pub fn with_max_targets(mut self, max_targets: usize) -> Self {
        self.max_targets = max_targets;
        self
    }

    /// Turn placeholders into deduplicated resolved edges
    pub fn run(&self, placeholders: &[PlaceholderEdge]) -> (Vec<Edge>, ImportLinkerStats) {
        let mut stats = ImportLinkerStats {
            placeholders: placeholders.len(),
            ..Default::default()
        };
        let mut seen: HashSet<Edge> = HashSet::new();
        let mut edges = Vec::new();

        for placeholder in placeholders {
            // one past the cap tells us whether the cap bit
            let targets = self.index.prefix_matches(&placeholder.import, self.max_targets + 1);
            if targets.is_empty() {
                tracing::debug!("Unresolved import {} from {}", placeholder.import, placeholder.source);
                stats.unresolved += 1;
                continue;
            }
            if targets.len() > self.max_targets {
                stats.truncated += 1;
            }

            for target in targets.into_iter().take(self.max_targets) {
                let edge = Edge::imports(&placeholder.source, target);
                if seen.insert(edge.clone()) {
                    edges.push(edge);
                } else {
                    stats.duplicates += 1;
                }
            }
        }

        stats.resolved = edges.len();
        tracing::debug!(
            "Linked {} placeholders into {} edges ({} unresolved)",
            stats.placeholders, stats.resolved, stats.unresolved
        );
        (edges, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleKind;

    fn node(namespace: &str, name: &str) -> ModuleNode {
        ModuleNode::new("p", namespace, name, ModuleKind::Class, "f.cs")
    }

    #[test]
    fn test_prefix_resolution_is_over_inclusive() {
        let nodes = vec![
            node("Src", "User"),
            node("A.B", "X"),
            node("A.B.C", "Y"),
            node("A.BX", "Z"),
            node("Other", "W"),
        ];
        let placeholders = vec![PlaceholderEdge::new("p:Src.User", "A.B")];

        let (edges, stats) = ImportLinker::new(&nodes).run(&placeholders);

        let targets: HashSet<&str> = edges.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, HashSet::from(["p:A.B.X", "p:A.B.C.Y", "p:A.BX.Z"]));
        assert!(edges.iter().all(|e| e.source == "p:Src.User"));
        assert_eq!(stats.resolved, 3);
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let nodes = vec![node("Src", "User"), node("a.b", "Lower")];
        let placeholders = vec![PlaceholderEdge::new("p:Src.User", "A.B")];

        let (edges, stats) = ImportLinker::new(&nodes).run(&placeholders);
        assert!(edges.is_empty());
        assert_eq!(stats.unresolved, 1);
    }

    #[test]
    fn test_duplicate_expansions_collapse() {
        let nodes = vec![node("Src", "User"), node("Lib", "A"), node("Lib.Sub", "B")];
        let placeholders = vec![
            PlaceholderEdge::new("p:Src.User", "Lib"),
            PlaceholderEdge::new("p:Src.User", "Lib.Sub"),
            PlaceholderEdge::new("p:Src.User", "Lib"),
        ];

        let (edges, stats) = ImportLinker::new(&nodes).run(&placeholders);

        assert_eq!(edges, vec![
            Edge::imports("p:Src.User", "p:Lib.A"),
            Edge::imports("p:Src.User", "p:Lib.Sub.B"),
        ]);
        assert_eq!(stats.duplicates, 3);
    }

    #[test]
    fn test_target_cap_takes_first_in_node_order() {
        let mut nodes = vec![node("Src", "User")];
        for i in 0..25 {
            nodes.push(node("Wide", &format!("T{:02}", i)));
        }
        let placeholders = vec![PlaceholderEdge::new("p:Src.User", "Wide")];

        let (edges, stats) = ImportLinker::new(&nodes).run(&placeholders);

        assert_eq!(edges.len(), MAX_TARGETS_PER_IMPORT);
        assert_eq!(edges.first().map(|e| e.target.as_str()), Some("p:Wide.T00"));
        assert_eq!(edges.last().map(|e| e.target.as_str()), Some("p:Wide.T19"));
        assert_eq!(stats.truncated, 1);
    }

    #[test]
    fn test_repeatable() {
        let nodes = vec![node("A", "X"), node("B", "Y")];
        let placeholders = vec![PlaceholderEdge::new("p:A.X", "B")];
        let linker = ImportLinker::new(&nodes);

        assert_eq!(linker.run(&placeholders), linker.run(&placeholders));
    }
}
