//! Directed dependency graph of Terraform files.
//!
//! Nodes are normalized absolute paths; an edge A -> B means A's
//! configuration uses a module defined in B. The graph is built once
//! per run and treated as read-only afterwards. Cycles are allowed.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<PathBuf, ()>,
    // Normalized path -> node, so two spellings of one file share a node.
    path_index: HashMap<PathBuf, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node for `path`, or returns the existing one.
    pub fn add_node(&mut self, path: PathBuf) -> NodeIndex {
        if let Some(&idx) = self.path_index.get(&path) {
            return idx;
        }
        let idx = self.graph.add_node(path.clone());
        self.path_index.insert(path, idx);
        idx
    }

    /// Adds a directed edge, creating missing nodes. Inserting the
    /// same edge twice leaves a single edge.
    pub fn add_edge(&mut self, from: &Path, to: &Path) {
        let from_idx = self.add_node(from.to_path_buf());
        let to_idx = self.add_node(to.to_path_buf());
        self.graph.update_edge(from_idx, to_idx, ());
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.path_index.contains_key(path)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Every file transitively reachable from `entry` via outgoing
    /// edges, excluding `entry` itself. An entry that is not in the
    /// graph yields an empty set; that is a recoverable "no relevant
    /// files known" condition, not an error. The visited set makes
    /// cycles terminate and keeps the result duplicate-free.
    pub fn reachable(&self, entry: &Path) -> BTreeSet<PathBuf> {
        let Some(&start) = self.path_index.get(entry) else {
            return BTreeSet::new();
        };

        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        let mut result = BTreeSet::new();

        while let Some(current) = queue.pop_front() {
            for neighbor in self.graph.neighbors(current) {
                if visited.insert(neighbor) {
                    result.insert(self.graph[neighbor].clone());
                    queue.push_back(neighbor);
                }
            }
        }
        result
    }

    /// Files `path` references directly, sorted.
    pub fn direct_dependencies(&self, path: &Path) -> Vec<PathBuf> {
        let Some(&idx) = self.path_index.get(path) else {
            return Vec::new();
        };
        let deps: BTreeSet<PathBuf> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].clone())
            .collect();
        deps.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn test_node_uniqueness_after_normalization() {
        let mut graph = DependencyGraph::new();
        graph.add_node(resolver::normalize(Path::new("/repo/a/../main.tf")));
        graph.add_node(resolver::normalize(Path::new("/repo/./main.tf")));

        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_edge_insertion_is_idempotent() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&p("/a.tf"), &p("/b.tf"));
        graph.add_edge(&p("/a.tf"), &p("/b.tf"));

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_reachable_transitive() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&p("/a.tf"), &p("/b.tf"));
        graph.add_edge(&p("/b.tf"), &p("/c.tf"));
        graph.add_edge(&p("/a.tf"), &p("/c.tf"));

        let reachable = graph.reachable(&p("/a.tf"));
        assert_eq!(
            reachable,
            BTreeSet::from([p("/b.tf"), p("/c.tf")])
        );
    }

    #[test]
    fn test_reachable_terminates_on_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&p("/a.tf"), &p("/b.tf"));
        graph.add_edge(&p("/b.tf"), &p("/a.tf"));

        assert_eq!(graph.reachable(&p("/a.tf")), BTreeSet::from([p("/b.tf")]));
        assert_eq!(graph.reachable(&p("/b.tf")), BTreeSet::from([p("/a.tf")]));
    }

    #[test]
    fn test_reachable_excludes_entry() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&p("/a.tf"), &p("/b.tf"));

        assert!(!graph.reachable(&p("/a.tf")).contains(&p("/a.tf")));
    }

    #[test]
    fn test_absent_entry_yields_empty_set() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&p("/a.tf"), &p("/b.tf"));

        assert!(graph.reachable(&p("/missing.tf")).is_empty());
    }

    #[test]
    fn test_direct_dependencies_sorted() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&p("/a.tf"), &p("/z.tf"));
        graph.add_edge(&p("/a.tf"), &p("/b.tf"));
        graph.add_edge(&p("/b.tf"), &p("/c.tf"));

        assert_eq!(
            graph.direct_dependencies(&p("/a.tf")),
            vec![p("/b.tf"), p("/z.tf")]
        );
        assert!(graph.direct_dependencies(&p("/missing.tf")).is_empty());
    }
}
