//! Edge types for the component graph.
//!
//! Every edge carries an optional weight. The weight is the only signal
//! cycle elimination looks at; an edge without one counts as 1.

use serde::{Deserialize, Serialize};

/// The type of relationship an edge records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// A class is referenced from a function's source text.
    DependsOn,

    /// Consecutive functions of the same file (function-sequence mode).
    Sequence,

    /// A file defines an entity.
    Contains,

    /// An entity in one file depends on an entity in another file.
    FileDependency,

    /// Nearest-neighbor relation between two embeddings.
    SimilarTo,
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DependsOn => "depends_on",
            Self::Sequence => "sequence",
            Self::Contains => "contains",
            Self::FileDependency => "file_dependency",
            Self::SimilarTo => "similar_to",
        };
        write!(f, "{}", s)
    }
}

/// An edge in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// The kind of relationship.
    pub kind: EdgeKind,

    /// Occurrence count, similarity or distance depending on how the
    /// graph was built. `None` for unweighted edges.
    pub weight: Option<f64>,
}

impl Edge {
    /// Creates an unweighted edge.
    pub fn new(kind: EdgeKind) -> Self {
        Self { kind, weight: None }
    }

    /// Creates an edge with an explicit weight.
    pub fn weighted(kind: EdgeKind, weight: f64) -> Self {
        Self {
            kind,
            weight: Some(weight),
        }
    }

    /// The weight used when choosing which edge of a cycle to drop.
    pub fn effective_weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }
}

/// A simplified edge for export and inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_weight_defaults_to_one() {
        assert_eq!(Edge::new(EdgeKind::Sequence).effective_weight(), 1.0);
        assert_eq!(
            Edge::weighted(EdgeKind::DependsOn, 3.0).effective_weight(),
            3.0
        );
    }

    #[test]
    fn test_kind_display_matches_serde() {
        for kind in [
            EdgeKind::DependsOn,
            EdgeKind::Sequence,
            EdgeKind::Contains,
            EdgeKind::FileDependency,
            EdgeKind::SimilarTo,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }
}
