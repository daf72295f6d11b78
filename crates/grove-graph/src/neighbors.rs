//! k-nearest-neighbor graphs over embeddings.
//!
//! Every embedding becomes a node; each node points at its `k` closest
//! other nodes. The result may contain cycles (two mutual neighbors form
//! one) and is never passed through cycle elimination.

use crate::edge::{Edge, EdgeKind};
use crate::error::{GraphError, Result};
use crate::graph::{CodeGraph, NodeKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// How closeness between two vectors is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Cosine similarity, higher is closer.
    #[default]
    Cosine,
    /// Euclidean distance, lower is closer.
    Euclidean,
}

impl Metric {
    fn score(self, a: &[f32], b: &[f32]) -> f64 {
        match self {
            Metric::Cosine => cosine_similarity(a, b),
            Metric::Euclidean => euclidean_distance(a, b),
        }
    }

    /// Orders candidates so the closest comes first.
    fn closer_first(self, a: f64, b: f64) -> Ordering {
        let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
        match self {
            Metric::Cosine => ord.reverse(),
            Metric::Euclidean => ord,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cosine => write!(f, "cosine"),
            Metric::Euclidean => write!(f, "euclidean"),
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" => Ok(Metric::Euclidean),
            other => Err(format!("unknown metric '{}'", other)),
        }
    }
}

/// Configuration for neighbor graph construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborConfig {
    /// Neighbors per node before clamping to `n - 1`.
    pub k: usize,
    pub metric: Metric,
}

impl Default for NeighborConfig {
    fn default() -> Self {
        Self {
            k: 3,
            metric: Metric::Cosine,
        }
    }
}

impl NeighborConfig {
    /// Creates a cosine config with a custom k.
    pub fn with_k(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }
}

/// Builds a cosine k-NN graph.
pub fn build_neighbor_graph(embeddings: &[(String, Vec<f32>)], k: usize) -> Result<CodeGraph> {
    build_neighbor_graph_with(embeddings, &NeighborConfig::with_k(k))
}

/// Builds a k-NN graph with the given metric.
///
/// Each node gets edges to its `min(k, n - 1)` nearest other nodes, ties
/// broken by input order. Edge weights hold the similarity or distance.
///
/// # Errors
///
/// `InsufficientData` for empty input, `DimensionMismatch` when vector
/// lengths differ.
pub fn build_neighbor_graph_with(
    embeddings: &[(String, Vec<f32>)],
    config: &NeighborConfig,
) -> Result<CodeGraph> {
    if embeddings.is_empty() {
        return Err(GraphError::InsufficientData(
            "no embeddings to build a neighbor graph from".into(),
        ));
    }

    let mut seen = HashSet::new();
    let mut points: Vec<(&str, &[f32])> = Vec::with_capacity(embeddings.len());
    for (id, vector) in embeddings {
        if !seen.insert(id.as_str()) {
            warn!("Duplicate embedding id '{}', keeping the first vector", id);
            continue;
        }
        points.push((id, vector));
    }

    let expected = points[0].1.len();
    if let Some((id, vector)) = points.iter().find(|(_, v)| v.len() != expected) {
        return Err(GraphError::DimensionMismatch {
            id: id.to_string(),
            expected,
            found: vector.len(),
        });
    }

    let mut graph = CodeGraph::new();
    let indexes: Vec<_> = points
        .iter()
        .map(|(id, _)| graph.add_node(id, NodeKind::Embedding))
        .collect();

    let k = config.k.min(points.len() - 1);
    for (i, (_, vector)) in points.iter().enumerate() {
        let mut candidates: Vec<(usize, f64)> = points
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(j, (_, other))| (j, config.metric.score(vector, other)))
            .collect();
        // Stable, so equal scores keep input order.
        candidates.sort_by(|a, b| config.metric.closer_first(a.1, b.1));

        for &(j, score) in candidates.iter().take(k) {
            graph.add_edge(
                indexes[i],
                indexes[j],
                Edge::weighted(EdgeKind::SimilarTo, score),
            );
        }
    }

    debug!(
        "Neighbor graph: {} nodes, {} edges (k = {}, {})",
        graph.node_count(),
        graph.edge_count(),
        k,
        config.metric
    );
    Ok(graph)
}

/// Cosine similarity; 0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(id: &str, v: &[f32]) -> (String, Vec<f32>) {
        (id.to_string(), v.to_vec())
    }

    #[test]
    fn test_k_is_clamped_to_n_minus_one() {
        let embeddings = vec![
            emb("a", &[1.0, 0.0]),
            emb("b", &[0.0, 1.0]),
            emb("c", &[1.0, 1.0]),
            emb("d", &[-1.0, 0.5]),
        ];

        let graph = build_neighbor_graph(&embeddings, 5).unwrap();

        assert_eq!(graph.node_count(), 4);
        for id in ["a", "b", "c", "d"] {
            assert_eq!(graph.out_degree(id), 3, "out-degree of {}", id);
        }
        assert_eq!(graph.edge_count(), 12);
    }

    #[test]
    fn test_nearest_by_cosine() {
        let embeddings = vec![
            emb("x", &[1.0, 0.0]),
            emb("near_x", &[0.9, 0.1]),
            emb("y", &[0.0, 1.0]),
        ];

        let graph = build_neighbor_graph(&embeddings, 1).unwrap();

        assert_eq!(graph.successors("x"), vec!["near_x"]);
        assert_eq!(graph.successors("near_x"), vec!["x"]);
        assert_eq!(graph.successors("y"), vec!["near_x"]);
        let w = graph.edge_between("x", "near_x").unwrap().weight.unwrap();
        assert!(w > 0.99);
    }

    #[test]
    fn test_nearest_by_euclidean() {
        let embeddings = vec![
            emb("origin", &[0.0, 0.0]),
            emb("close", &[1.0, 0.0]),
            emb("far", &[10.0, 0.0]),
        ];
        let config = NeighborConfig::with_k(1).with_metric(Metric::Euclidean);

        let graph = build_neighbor_graph_with(&embeddings, &config).unwrap();

        assert_eq!(graph.successors("origin"), vec!["close"]);
        assert_eq!(graph.successors("far"), vec!["close"]);
        assert_eq!(
            graph.edge_between("origin", "close").unwrap().weight,
            Some(1.0)
        );
    }

    #[test]
    fn test_ties_keep_input_order() {
        let embeddings = vec![
            emb("q", &[1.0, 0.0]),
            emb("first", &[0.0, 1.0]),
            emb("second", &[0.0, 1.0]),
        ];

        let graph = build_neighbor_graph(&embeddings, 1).unwrap();
        assert_eq!(graph.successors("q"), vec!["first"]);
    }

    #[test]
    fn test_zero_vector_has_zero_similarity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);

        let embeddings = vec![emb("zero", &[0.0, 0.0]), emb("one", &[1.0, 0.0])];
        let graph = build_neighbor_graph(&embeddings, 1).unwrap();
        assert_eq!(graph.edge_between("zero", "one").unwrap().weight, Some(0.0));
    }

    #[test]
    fn test_single_embedding_has_no_edges() {
        let graph = build_neighbor_graph(&[emb("only", &[1.0])], 3).unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_empty_input_is_insufficient_data() {
        let err = build_neighbor_graph(&[], 3).unwrap_err();
        assert!(matches!(err, GraphError::InsufficientData(_)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let embeddings = vec![emb("a", &[1.0, 0.0]), emb("b", &[1.0, 0.0, 0.0])];
        let err = build_neighbor_graph(&embeddings, 1).unwrap_err();
        assert_eq!(
            err,
            GraphError::DimensionMismatch {
                id: "b".into(),
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_duplicate_ids_keep_first_vector() {
        let embeddings = vec![
            emb("a", &[1.0, 0.0]),
            emb("b", &[0.0, 1.0]),
            emb("a", &[0.0, 1.0, 5.0]),
        ];

        let graph = build_neighbor_graph(&embeddings, 2).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.out_degree("a"), 1);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("cosine".parse::<Metric>().unwrap(), Metric::Cosine);
        assert_eq!("Euclidean".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert!("manhattan".parse::<Metric>().is_err());
    }
}
