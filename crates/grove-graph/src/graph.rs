//! Core graph data structure.
//!
//! CodeGraph wraps petgraph and adds a label index, so nodes can be
//! addressed by entity name, file name or embedding id. It holds at most
//! one edge per ordered node pair.

use crate::edge::{Edge, GraphEdge};
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Unique identifier for a node in the graph.
pub type NodeId = NodeIndex;

/// What a node stands for. Only used when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Function,
    Class,
    File,
    Embedding,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Function => write!(f, "function"),
            NodeKind::Class => write!(f, "class"),
            NodeKind::File => write!(f, "file"),
            NodeKind::Embedding => write!(f, "embedding"),
        }
    }
}

impl From<grove_core::EntityKind> for NodeKind {
    fn from(kind: grove_core::EntityKind) -> Self {
        match kind {
            grove_core::EntityKind::Function => NodeKind::Function,
            grove_core::EntityKind::Class => NodeKind::Class,
        }
    }
}

/// A vertex: a label plus the kind tag used for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub label: String,
    pub kind: NodeKind,
}

/// A directed graph over labeled nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeGraph {
    /// The underlying petgraph graph.
    pub(crate) graph: DiGraph<GraphNode, Edge>,

    /// Maps labels to graph node indexes.
    label_index: HashMap<String, NodeId>,
}

impl CodeGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, or returns the existing one with the same label.
    ///
    /// The kind of an existing node is left untouched: the first
    /// insertion decides how it is drawn.
    pub fn add_node(&mut self, label: &str, kind: NodeKind) -> NodeId {
        if let Some(&index) = self.label_index.get(label) {
            return index;
        }
        let index = self.graph.add_node(GraphNode {
            label: label.to_string(),
            kind,
        });
        self.label_index.insert(label.to_string(), index);
        index
    }

    /// Adds an edge, replacing the edge data if the pair is already connected.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, edge: Edge) -> EdgeIndex {
        self.graph.update_edge(from, to, edge)
    }

    /// Adds an edge between two labels, creating missing endpoints with
    /// the given kinds.
    pub fn connect(
        &mut self,
        from: (&str, NodeKind),
        to: (&str, NodeKind),
        edge: Edge,
    ) -> EdgeIndex {
        let from = self.add_node(from.0, from.1);
        let to = self.add_node(to.0, to.1);
        self.add_edge(from, to, edge)
    }

    /// Removes an edge and returns its data.
    pub fn remove_edge(&mut self, edge: EdgeIndex) -> Option<Edge> {
        self.graph.remove_edge(edge)
    }

    /// Gets the node index for a label.
    pub fn get_index(&self, label: &str) -> Option<NodeId> {
        self.label_index.get(label).copied()
    }

    /// Gets a node by its graph index.
    pub fn get(&self, index: NodeId) -> Option<&GraphNode> {
        self.graph.node_weight(index)
    }

    /// Returns the label of a node, or an empty string for a stale index.
    pub fn label(&self, index: NodeId) -> &str {
        self.graph
            .node_weight(index)
            .map(|n| n.label.as_str())
            .unwrap_or("")
    }

    pub fn contains(&self, label: &str) -> bool {
        self.label_index.contains_key(label)
    }

    /// Gets the edge between two labels, if any.
    pub fn edge_between(&self, from: &str, to: &str) -> Option<&Edge> {
        let from = self.get_index(from)?;
        let to = self.get_index(to)?;
        let edge = self.graph.find_edge(from, to)?;
        self.graph.edge_weight(edge)
    }

    /// Labels of the nodes this node points to.
    pub fn successors(&self, label: &str) -> Vec<&str> {
        self.neighbors(label, Direction::Outgoing)
    }

    /// Labels of the nodes pointing at this node.
    pub fn predecessors(&self, label: &str) -> Vec<&str> {
        self.neighbors(label, Direction::Incoming)
    }

    fn neighbors(&self, label: &str, direction: Direction) -> Vec<&str> {
        let Some(index) = self.get_index(label) else {
            return Vec::new();
        };
        let mut labels: Vec<&str> = self
            .graph
            .edges_directed(index, direction)
            .map(|e| match direction {
                Direction::Outgoing => self.label(e.target()),
                Direction::Incoming => self.label(e.source()),
            })
            .collect();
        // petgraph walks adjacency lists newest-first.
        labels.reverse();
        labels
    }

    /// Number of outgoing edges of a node.
    pub fn out_degree(&self, label: &str) -> usize {
        self.get_index(label)
            .map(|i| self.graph.edges_directed(i, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterates over all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Node labels in insertion order.
    pub fn labels(&self) -> Vec<&str> {
        self.graph.node_weights().map(|n| n.label.as_str()).collect()
    }

    /// Returns all edges with source and target labels for export.
    pub fn export_edges(&self) -> Vec<GraphEdge> {
        self.graph
            .edge_references()
            .map(|edge_ref| GraphEdge {
                source: self.label(edge_ref.source()).to_string(),
                target: self.label(edge_ref.target()).to_string(),
                kind: edge_ref.weight().kind,
                weight: edge_ref.weight().weight,
            })
            .collect()
    }

    /// Edges as (source, target) label pairs.
    pub fn edge_labels(&self) -> Vec<(String, String)> {
        self.graph
            .edge_references()
            .map(|e| {
                (
                    self.label(e.source()).to_string(),
                    self.label(e.target()).to_string(),
                )
            })
            .collect()
    }

    /// True when the graph has no directed cycle.
    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Returns graph statistics.
    pub fn stats(&self) -> GraphStats {
        let count = |kind: NodeKind| self.nodes().filter(|n| n.kind == kind).count();
        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            functions: count(NodeKind::Function),
            classes: count(NodeKind::Class),
            files: count(NodeKind::File),
        }
    }
}

/// Graph statistics for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub functions: usize,
    pub classes: usize,
    pub files: usize,
}
