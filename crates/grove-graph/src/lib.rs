//! Grove Graph - component graphs and the algorithms that run on them
//!
//! This crate turns extracted functions and classes into a directed graph
//! and answers a few questions about it: which nodes are most central,
//! in what order should files be read, which embeddings are neighbors.
//!
//! # Architecture
//!
//! Everything is built on one petgraph-backed structure, [`CodeGraph`],
//! with a label index so nodes can be addressed by name:
//! - [`builder`] builds acyclic component graphs in one of three modes
//! - [`cycles`] breaks directed cycles by dropping the lightest edge
//! - [`neighbors`] builds k-nearest-neighbor graphs over embeddings
//! - [`ranking`] scores nodes by degree plus betweenness centrality
//! - [`sequence`] topologically orders file nodes
//! - [`render`] produces DOT and JSON output
//!
//! # Example
//!
//! ```no_run
//! use grove_core::Entity;
//! use grove_graph::{build_component_graph, rank_representative_nodes};
//!
//! let functions = vec![Entity::function("app.py", "run", "def run():\n    return App()")];
//! let classes = vec![
//!     Entity::class("app.py", "App", "class App: pass"),
//!     Entity::class("db.py", "Db", "class Db: pass"),
//! ];
//!
//! let component = build_component_graph(&functions, &classes).unwrap();
//! let top = rank_representative_nodes(&component.graph, 5);
//! ```

pub mod builder;
pub mod cycles;
mod edge;
mod error;
mod graph;
pub mod neighbors;
pub mod ranking;
pub mod render;
pub mod sequence;

pub use builder::{
    build_component_graph, ComponentGraph, ComponentGraphBuilder, ConstructionMode,
    DependencyInference, SubstringInference,
};
pub use cycles::{eliminate_cycles, find_cycle, RemovedEdge};
pub use edge::{Edge, EdgeKind, GraphEdge};
pub use error::{GraphError, RankingError, RenderError, Result};
pub use graph::{CodeGraph, GraphNode, GraphStats, NodeId, NodeKind};
pub use neighbors::{build_neighbor_graph, build_neighbor_graph_with, Metric, NeighborConfig};
pub use ranking::{rank_representative_nodes, try_rank_nodes, EdgeList, GraphView, RankedNode};
pub use render::{render_block_diagram, DotRenderer, GraphExport, Renderer};
pub use sequence::{sequence_files, sequence_files_matching};
