//! Namespace prefix index
//!
//! Sorted list of distinct namespaces, each carrying the node-list positions
//! of its members. Every namespace that starts with a given prefix sits in one
//! contiguous run of the sorted list, so a lookup is a binary search plus a
//! scan of that run instead of a pass over every node.

use crate::module::ModuleNode;

struct NamespaceEntry {
    namespace: String,
    /// Positions into the original node list, ascending
    positions: Vec<usize>,
}

/// Prefix index over node namespaces
pub struct NamespaceIndex {
    /// Sorted by namespace, byte order
    entries: Vec<NamespaceEntry>,
    /// Node ids in node-list order
    ids: Vec<String>,
}

impl NamespaceIndex {
    /// Build the index from nodes in their node-list order
    pub fn build(nodes: &[ModuleNode]) -> Self {
        let mut order: Vec<usize> = (0..nodes.len()).collect();
        // stable sort keeps positions ascending inside each namespace
        order.sort_by(|&a, &b| nodes[a].namespace.cmp(&nodes[b].namespace));

        let mut entries: Vec<NamespaceEntry> = Vec::new();
        for position in order {
            let namespace = &nodes[position].namespace;
            match entries.last_mut() {
                Some(entry) if entry.namespace == *namespace => entry.positions.push(position),
                _ => entries.push(NamespaceEntry {
                    namespace: namespace.clone(),
                    positions: vec![position],
                }),
            }
        }

        Self {
            entries,
            ids: nodes.iter().map(|n| n.id.clone()).collect(),
        }
    }

    /// Ids of nodes whose namespace starts with `prefix`, in node-list order,
    /// at most `limit` of them.
    ///
    /// Matching is a literal, case-sensitive string prefix: `"A.B"` also
    /// matches `"A.BX"`.
    pub fn prefix_matches(&self, prefix: &str, limit: usize) -> Vec<&str> {
        let start = self
            .entries
            .partition_point(|entry| entry.namespace.as_str() < prefix);

        let mut positions: Vec<usize> = self.entries[start..]
            .iter()
            .take_while(|entry| entry.namespace.starts_with(prefix))
            .flat_map(|entry| entry.positions.iter().copied())
            .collect();

        positions.sort_unstable();
        positions.truncate(limit);
        positions.into_iter().map(|p| self.ids[p].as_str()).collect()
    }

    /// Number of distinct namespaces
    pub fn namespace_count(&self) -> usize {
        self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleKind;

    fn node(namespace: &str, name: &str) -> ModuleNode {
        ModuleNode::new("p", namespace, name, ModuleKind::Class, "f.cs")
    }

    /// Reference behavior: linear scan in node-list order
    fn linear(nodes: &[ModuleNode], prefix: &str, limit: usize) -> Vec<String> {
        nodes
            .iter()
            .filter(|n| n.namespace.starts_with(prefix))
            .take(limit)
            .map(|n| n.id.clone())
            .collect()
    }

    #[test]
    fn test_matches_linear_scan() {
        let nodes = vec![
            node("A.BX", "Q"),
            node("A.B.C", "Y"),
            node("Z", "Z1"),
            node("A.B", "X"),
            node("A", "Root"),
            node("A.B.C", "Y2"),
            node("a.b", "Lower"),
        ];
        let index = NamespaceIndex::build(&nodes);
        assert_eq!(index.namespace_count(), 6);

        for prefix in ["A.B", "A", "A.B.C", "a", "Z", "B", "", "A.B.C.D"] {
            for limit in [1, 2, 20] {
                let got: Vec<String> = index
                    .prefix_matches(prefix, limit)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                assert_eq!(got, linear(&nodes, prefix, limit), "prefix {:?} limit {}", prefix, limit);
            }
        }
    }

    #[test]
    fn test_prefix_is_not_segment_aware() {
        let nodes = vec![node("A.B", "X"), node("A.B.C", "Y"), node("A.BX", "Z")];
        let index = NamespaceIndex::build(&nodes);

        assert_eq!(index.prefix_matches("A.B", 20), vec!["p:A.B.X", "p:A.B.C.Y", "p:A.BX.Z"]);
    }

    #[test]
    fn test_empty_index() {
        let index = NamespaceIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.prefix_matches("A", 20).is_empty());
    }
}
