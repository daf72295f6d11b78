//! Error types for graph construction and ordering.

use thiserror::Error;

/// Result alias used throughout grove-graph.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Structural failures. Each one is fatal to the output that raised it
/// (a diagram, an ordering) but not to the analysis as a whole.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// No functions, classes or embeddings to build from.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Embedding vectors of differing lengths.
    #[error("embedding '{id}' has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        found: usize,
    },

    /// Cycle elimination hit its iteration cap.
    #[error("cycle elimination did not converge after {iterations} iterations ({remaining_edges} edges left)")]
    CycleEliminationFailed {
        iterations: usize,
        remaining_edges: usize,
    },

    /// The file subgraph still contains a cycle.
    #[error("no execution order exists: cycle through '{node}'")]
    OrderingImpossible { node: String },

    /// The graph has no file nodes to order.
    #[error("execution order is empty")]
    EmptyExecutionOrder,
}

/// Failures while computing centrality.
///
/// These are contract violations rather than data problems.
/// `rank_representative_nodes` masks them as an empty ranking.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RankingError {
    /// An edge names a node the view does not list.
    #[error("edge endpoint '{0}' is not a node of the graph")]
    UnknownNode(String),

    /// A score came out as NaN or infinite.
    #[error("centrality score for '{0}' is not finite")]
    NonFiniteScore(String),
}

/// Failures while rendering a graph.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to format graph: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("failed to serialize graph: {0}")]
    Json(#[from] serde_json::Error),
}
