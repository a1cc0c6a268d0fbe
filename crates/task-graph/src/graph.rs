//! String-keyed directed graph built on petgraph.
//!
//! Vertices are identified by name. An edge `a -> b` means "`a` depends on
//! `b`": `b` must complete before `a` may start.

use crate::{Error, Result};
use petgraph::Direction;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use tracing::trace;

/// Directed graph over named vertices.
///
/// Used both for workspace dependency graphs and for task-execution graphs.
/// Adding a vertex or an edge twice is a no-op.
#[derive(Debug, Clone, Default)]
pub struct Dag {
    /// The directed graph of vertex names.
    graph: DiGraph<String, ()>,
    /// Map from vertex names to node indices.
    name_to_node: HashMap<String, NodeIndex>,
}

impl Dag {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex, returning its index.
    ///
    /// If a vertex with the same name already exists, returns the existing index.
    pub fn add_vertex(&mut self, name: &str) -> NodeIndex {
        if let Some(&node) = self.name_to_node.get(name) {
            return node;
        }

        let node = self.graph.add_node(name.to_string());
        self.name_to_node.insert(name.to_string(), node);
        trace!("Added vertex '{}'", name);
        node
    }

    /// Connect `from` to `to`, meaning `from` depends on `to`.
    ///
    /// Missing endpoints are created. Returns `true` if the edge is new.
    pub fn connect(&mut self, from: &str, to: &str) -> bool {
        let from_idx = self.add_vertex(from);
        let to_idx = self.add_vertex(to);
        if self.graph.contains_edge(from_idx, to_idx) {
            return false;
        }
        self.graph.add_edge(from_idx, to_idx, ());
        true
    }

    /// Check if a vertex exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.name_to_node.contains_key(name)
    }

    /// Check if the edge `from -> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.name_to_node.get(from), self.name_to_node.get(to)) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if the graph has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Iterate over all vertex names.
    pub fn vertices(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Iterate over all edges as `(dependent, dependency)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].as_str(),
                self.graph[edge.target()].as_str(),
            )
        })
    }

    /// Vertices that `name` depends on.
    ///
    /// Returns an empty list for unknown vertices.
    #[must_use]
    pub fn down_edges(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Vertices that depend on `name`.
    ///
    /// Returns an empty list for unknown vertices.
    #[must_use]
    pub fn up_edges(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        self.name_to_node
            .get(name)
            .map(|&idx| {
                self.graph
                    .neighbors_directed(idx, direction)
                    .map(|n| self.graph[n].as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check if the graph has cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Find one cycle in the graph.
    ///
    /// Returns the sorted names of the vertices in a strongly connected
    /// component that forms a cycle (including a self-loop).
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        tarjan_scc(&self.graph).into_iter().find_map(|component| {
            let cyclic = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&idx| self.graph.contains_edge(idx, idx));
            cyclic.then(|| {
                let mut names: Vec<String> =
                    component.iter().map(|&idx| self.graph[idx].clone()).collect();
                names.sort();
                names
            })
        })
    }

    /// Validate that the graph is acyclic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] naming the vertices of one cycle.
    pub fn validate(&self) -> Result<()> {
        match self.find_cycle() {
            Some(cycle) => Err(Error::CycleDetected { cycle }),
            None => Ok(()),
        }
    }

    /// Get vertices in dependency order: every vertex comes after all the
    /// vertices it depends on.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        self.sorted_indices().map(|indices| {
            indices
                .into_iter()
                .map(|idx| self.graph[idx].clone())
                .collect()
        })
    }

    /// Group vertices into levels that can be processed in parallel.
    ///
    /// Vertices in level N only depend on vertices in levels below N.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn levels(&self) -> Result<Vec<Vec<String>>> {
        let sorted = self.sorted_indices()?;

        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut level_of: HashMap<NodeIndex, usize> = HashMap::new();

        for idx in sorted {
            // Dependencies were placed already, so their levels are known
            let level = self
                .graph
                .neighbors_directed(idx, Direction::Outgoing)
                .filter_map(|dep| level_of.get(&dep).map(|l| l + 1))
                .max()
                .unwrap_or(0);

            if level >= groups.len() {
                groups.resize(level + 1, Vec::new());
            }
            groups[level].push(self.graph[idx].clone());
            level_of.insert(idx, level);
        }

        Ok(groups)
    }

    /// Indices sorted dependencies-first.
    fn sorted_indices(&self) -> Result<Vec<NodeIndex>> {
        match toposort(&self.graph, None) {
            Ok(mut sorted) => {
                // petgraph yields dependents before their dependencies
                sorted.reverse();
                Ok(sorted)
            }
            Err(_) => Err(Error::CycleDetected {
                cycle: self.find_cycle().unwrap_or_default(),
            }),
        }
    }
}
