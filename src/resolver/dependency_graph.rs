//! Field dependency graph for cascade resolution.
//!
//! Nodes are field keys; an edge `parent → child` exists for every entry in
//! `child.depends_on`. The graph is rebuilt from the active field-set on every
//! resolve call and must be proven acyclic before any callback runs.
//!
//! `depends_on` entries naming keys outside the field-set are dropped silently.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::core::PanelError;
use crate::field::FieldConfig;

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Directed graph of field dependencies.
///
/// Node indices follow field-definition order, which makes traversal and the
/// reported cycle path deterministic.
pub struct DependencyGraph {
    /// The underlying directed graph, edges point from dependency to dependent.
    graph: DiGraph<Arc<FieldConfig>, ()>,
    /// Map from field keys to their graph indices.
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph for a field-set.
    pub fn build(fields: &[Arc<FieldConfig>]) -> Self {
        let mut graph = DiGraph::with_capacity(fields.len(), fields.len());
        let mut node_map = HashMap::with_capacity(fields.len());

        for field in fields {
            if node_map.contains_key(field.key()) {
                tracing::warn!("Field '{}' appears twice in the field-set; keeping the first", field.key());
                continue;
            }
            let index = graph.add_node(Arc::clone(field));
            node_map.insert(field.key().to_string(), index);
        }

        for field in fields {
            let Some(&child) = node_map.get(field.key()) else {
                continue;
            };
            if !Arc::ptr_eq(&graph[child], field) {
                continue;
            }
            for dependency in field.depends_on() {
                match node_map.get(dependency) {
                    Some(&parent) => {
                        if !graph.contains_edge(parent, child) {
                            graph.add_edge(parent, child, ());
                        }
                    }
                    None => tracing::trace!(
                        "Field '{}' depends on unknown key '{}'; ignoring",
                        field.key(),
                        dependency
                    ),
                }
            }
        }

        Self {
            graph,
            node_map,
        }
    }

    /// Detect cycles using DFS with colors.
    ///
    /// Roots are visited in field-definition order and children in definition
    /// order, so the same field-set always reports the same cycle. The error
    /// lists the cycle's keys in traversal order and closes it by repeating the
    /// first key; a self-dependency reports `[a, a]`.
    pub fn detect_circular_dependencies(&self) -> Result<(), PanelError> {
        let mut colors = vec![Color::White; self.graph.node_count()];
        let mut path: Vec<NodeIndex> = Vec::new();

        for node in self.graph.node_indices() {
            if colors[node.index()] == Color::White {
                if let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path) {
                    let chain: Vec<String> =
                        cycle.iter().map(|idx| self.graph[*idx].key().to_string()).collect();
                    tracing::debug!("Circular dependency between fields: {}", chain.join(" → "));
                    return Err(PanelError::CircularDependency {
                        chain,
                    });
                }
            }
        }

        Ok(())
    }

    /// DFS visit for cycle detection.
    ///
    /// Returns `Some(cycle_path)` if a cycle is detected, None otherwise.
    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut [Color],
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors[node.index()] = Color::Gray;
        path.push(node);

        for child in self.children_of(node) {
            match colors[child.index()] {
                Color::Gray => {
                    let start = path.iter().position(|n| *n == child).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(child);
                    return Some(cycle);
                }
                Color::White => {
                    if let Some(cycle) = self.dfs_visit(child, colors, path) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        path.pop();
        colors[node.index()] = Color::Black;
        None
    }

    /// Children of a node in definition order.
    fn children_of(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> =
            self.graph.neighbors_directed(node, Direction::Outgoing).collect();
        children.sort_unstable();
        children
    }

    /// Topological rank of every field key.
    ///
    /// Dependencies rank lower than their dependents; among independent fields
    /// the earlier-defined one ranks lower.
    pub fn topological_ranks(&self) -> Result<HashMap<String, usize>, PanelError> {
        self.detect_circular_dependencies()?;

        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();
        let mut ready: BTreeSet<NodeIndex> =
            self.graph.node_indices().filter(|n| in_degree[n.index()] == 0).collect();
        let mut ranks = HashMap::with_capacity(self.graph.node_count());

        while let Some(node) = ready.pop_first() {
            ranks.insert(self.graph[node].key().to_string(), ranks.len());
            for child in self.graph.neighbors_directed(node, Direction::Outgoing) {
                in_degree[child.index()] -= 1;
                if in_degree[child.index()] == 0 {
                    ready.insert(child);
                }
            }
        }

        Ok(ranks)
    }

    /// Fields whose `depends_on` lists `key`, in definition order.
    #[must_use]
    pub fn dependents_of(&self, key: &str) -> Vec<&Arc<FieldConfig>> {
        self.node_map
            .get(key)
            .map(|&idx| self.children_of(idx).into_iter().map(|c| &self.graph[c]).collect())
            .unwrap_or_default()
    }

    /// Whether any field depends on `key`.
    #[must_use]
    pub fn has_dependents(&self, key: &str) -> bool {
        self.node_map
            .get(key)
            .is_some_and(|&idx| self.graph.neighbors_directed(idx, Direction::Outgoing).next().is_some())
    }

    /// Get the total number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the total number of edges (dependencies) in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(key: &str, deps: &[&str]) -> Arc<FieldConfig> {
        FieldConfig::builder(key).depends_on(deps.iter().copied()).shared()
    }

    #[test]
    fn test_simple_dependency_chain() {
        let graph = DependencyGraph::build(&[field("c", &["b"]), field("a", &[]), field("b", &["a"])]);

        assert!(graph.detect_circular_dependencies().is_ok());
        let ranks = graph.topological_ranks().unwrap();
        assert!(ranks["a"] < ranks["b"]);
        assert!(ranks["b"] < ranks["c"]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_circular_dependency_detection() {
        let graph = DependencyGraph::build(&[field("a", &["c"]), field("b", &["a"]), field("c", &["b"])]);

        let err = graph.detect_circular_dependencies().unwrap_err();
        match err {
            PanelError::CircularDependency {
                chain,
            } => assert_eq!(chain, ["a", "b", "c", "a"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_dependency() {
        let graph = DependencyGraph::build(&[field("x", &[]), field("a", &["a"])]);

        let err = graph.detect_circular_dependencies().unwrap_err();
        assert!(matches!(err, PanelError::CircularDependency { ref chain } if chain == &["a", "a"]));
        assert!(graph.topological_ranks().is_err());
    }

    #[test]
    fn test_cycle_report_is_deterministic() {
        let fields = [field("a", &["b"]), field("b", &["a"]), field("c", &["c"])];
        let first = DependencyGraph::build(&fields).detect_circular_dependencies().unwrap_err();
        let second = DependencyGraph::build(&fields).detect_circular_dependencies().unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(first.to_string(), "Circular dependency detected: a → b → a");
    }

    #[test]
    fn test_diamond_dependency() {
        let graph = DependencyGraph::build(&[
            field("a", &[]),
            field("b", &["a"]),
            field("c", &["a"]),
            field("d", &["b", "c"]),
        ]);

        let ranks = graph.topological_ranks().unwrap();
        assert!(ranks["a"] < ranks["b"]);
        assert!(ranks["b"] < ranks["c"]);
        assert!(ranks["c"] < ranks["d"]);
        let keys: Vec<&str> = graph.dependents_of("a").iter().map(|f| f.key()).collect();
        assert_eq!(keys, ["b", "c"]);
    }

    #[test]
    fn test_unknown_dependency_is_ignored() {
        let graph = DependencyGraph::build(&[field("city", &["country", "planet"]), field("country", &[])]);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.detect_circular_dependencies().is_ok());
        assert!(graph.dependents_of("planet").is_empty());
        assert!(!graph.has_dependents("planet"));
    }

    #[test]
    fn test_dependents_in_definition_order() {
        let graph = DependencyGraph::build(&[
            field("country", &[]),
            field("zip", &["country"]),
            field("city", &["country"]),
        ]);

        let keys: Vec<&str> = graph.dependents_of("country").iter().map(|f| f.key()).collect();
        assert_eq!(keys, ["zip", "city"]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::build(&[]);
        assert_eq!(graph.node_count(), 0);
        assert!(graph.detect_circular_dependencies().is_ok());
        assert!(graph.topological_ranks().unwrap().is_empty());
    }

    #[test]
    fn test_long_acyclic_chain_has_no_cycle() {
        let fields: Vec<_> = (0..200usize)
            .map(|i| {
                let key = format!("f{i}");
                let dep = format!("f{}", i.saturating_sub(1));
                if i == 0 { field(&key, &[]) } else { field(&key, &[dep.as_str()]) }
            })
            .collect();
        let graph = DependencyGraph::build(&fields);
        assert!(graph.detect_circular_dependencies().is_ok());
        assert_eq!(graph.topological_ranks().unwrap()["f199"], 199);
    }
}
