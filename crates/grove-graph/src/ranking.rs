//! Centrality ranking.
//!
//! Picks the "representative" nodes of a graph: those that touch many
//! edges and sit on many shortest paths. The score is the sum of
//! normalized degree centrality and normalized betweenness centrality.
//!
//! Betweenness uses Brandes' algorithm on unweighted shortest paths,
//! which is O(V·E) and plenty fast for per-repository graphs.

use crate::error::RankingError;
use crate::graph::CodeGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, warn};

/// Read-only view of a graph for ranking.
pub trait GraphView {
    /// Node identifiers in iteration order. Ties in the ranking keep this order.
    fn node_ids(&self) -> Vec<String>;

    /// Edges as (source, target) identifier pairs.
    fn edge_pairs(&self) -> Vec<(String, String)>;

    fn is_directed(&self) -> bool {
        true
    }
}

impl GraphView for CodeGraph {
    fn node_ids(&self) -> Vec<String> {
        self.labels().into_iter().map(String::from).collect()
    }

    fn edge_pairs(&self) -> Vec<(String, String)> {
        self.edge_labels()
    }
}

/// A plain node and edge list, for graphs that did not come from this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeList {
    pub nodes: Vec<String>,
    pub edges: Vec<(String, String)>,
    pub directed: bool,
}

impl EdgeList {
    /// A directed view over explicit nodes and edges.
    pub fn new(nodes: Vec<String>, edges: Vec<(String, String)>) -> Self {
        Self {
            nodes,
            edges,
            directed: true,
        }
    }

    /// Derives the node list from the edges in first-seen order.
    pub fn from_edges(edges: Vec<(String, String)>) -> Self {
        let mut nodes: Vec<String> = Vec::new();
        for (source, target) in &edges {
            for id in [source, target] {
                if !nodes.contains(id) {
                    nodes.push(id.clone());
                }
            }
        }
        Self::new(nodes, edges)
    }

    pub fn undirected(mut self) -> Self {
        self.directed = false;
        self
    }
}

impl GraphView for EdgeList {
    fn node_ids(&self) -> Vec<String> {
        self.nodes.clone()
    }

    fn edge_pairs(&self) -> Vec<(String, String)> {
        self.edges.clone()
    }

    fn is_directed(&self) -> bool {
        self.directed
    }
}

/// A node with its centrality scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNode {
    pub id: String,
    pub degree: f64,
    pub betweenness: f64,
    /// `degree + betweenness`
    pub score: f64,
}

/// Ranks every node of the view, best first, truncated to `top_n`.
///
/// # Errors
///
/// `UnknownNode` if an edge names a node the view does not list,
/// `NonFiniteScore` if any score is NaN or infinite.
pub fn try_rank_nodes(
    graph: &impl GraphView,
    top_n: usize,
) -> Result<Vec<RankedNode>, RankingError> {
    let ids = graph.node_ids();
    let index: HashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let n = ids.len();
    let directed = graph.is_directed();

    // Adjacency used for shortest paths; undirected views get both directions.
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut degree = vec![0usize; n];
    for (source, target) in graph.edge_pairs() {
        let s = *index
            .get(source.as_str())
            .ok_or_else(|| RankingError::UnknownNode(source.clone()))?;
        let t = *index
            .get(target.as_str())
            .ok_or_else(|| RankingError::UnknownNode(target.clone()))?;
        degree[s] += 1;
        degree[t] += 1;
        adjacency[s].push(t);
        if !directed {
            adjacency[t].push(s);
        }
    }

    let betweenness = brandes(&adjacency);
    let degree_scale = if n > 1 { 1.0 / (n - 1) as f64 } else { 0.0 };
    let betweenness_scale = if n > 2 {
        1.0 / ((n - 1) * (n - 2)) as f64
    } else {
        0.0
    };

    let mut ranked = Vec::with_capacity(n);
    for (i, id) in ids.iter().enumerate() {
        let degree = degree[i] as f64 * degree_scale;
        let betweenness = betweenness[i] * betweenness_scale;
        let score = degree + betweenness;
        if !score.is_finite() {
            return Err(RankingError::NonFiniteScore(id.clone()));
        }
        ranked.push(RankedNode {
            id: id.clone(),
            degree,
            betweenness,
            score,
        });
    }

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(top_n);

    debug!("Ranked {} of {} nodes", ranked.len(), n);
    Ok(ranked)
}

/// Best-effort ranking: the ids of the `top_n` most central nodes.
///
/// Any ranking error is logged and turned into an empty list, so an empty
/// result means either an empty graph or "ranking unavailable". Use
/// [`try_rank_nodes`] to tell the two apart.
pub fn rank_representative_nodes(graph: &impl GraphView, top_n: usize) -> Vec<String> {
    match try_rank_nodes(graph, top_n) {
        Ok(ranked) => ranked.into_iter().map(|r| r.id).collect(),
        Err(e) => {
            warn!("Ranking unavailable: {}", e);
            Vec::new()
        }
    }
}

/// Raw (unnormalized) betweenness for every node.
///
/// For undirected adjacency every pair is counted from both ends.
fn brandes(adjacency: &[Vec<usize>]) -> Vec<f64> {
    let n = adjacency.len();
    let mut centrality = vec![0.0f64; n];

    for s in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut distance: Vec<Option<usize>> = vec![None; n];
        sigma[s] = 1.0;
        distance[s] = Some(0);

        let mut queue = VecDeque::new();
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let Some(dv) = distance[v] else {
                continue;
            };
            for &w in &adjacency[v] {
                if distance[w].is_none() {
                    distance[w] = Some(dv + 1);
                    queue.push_back(w);
                }
                if distance[w] == Some(dv + 1) {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    centrality
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{Edge, EdgeKind};
    use crate::graph::NodeKind;

    fn pairs(edges: &[(&str, &str)]) -> Vec<(String, String)> {
        edges
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn test_path_middle_ranks_first() {
        // a -> b -> c: b is the only bridge.
        let view = EdgeList::from_edges(pairs(&[("a", "b"), ("b", "c")]));
        let ranked = try_rank_nodes(&view, 3).unwrap();

        assert_eq!(ranked[0].id, "b");
        assert!((ranked[0].degree - 1.0).abs() < 1e-9);
        // One pair (a, c) out of (n-1)(n-2) = 2 ordered pairs.
        assert!((ranked[0].betweenness - 0.5).abs() < 1e-9);
        assert!((ranked[0].score - 1.5).abs() < 1e-9);
        // a and c tie; input order wins.
        assert_eq!(ranked[1].id, "a");
        assert_eq!(ranked[2].id, "c");
    }

    #[test]
    fn test_undirected_star() {
        let view = EdgeList::from_edges(pairs(&[("hub", "x"), ("hub", "y"), ("hub", "z")]))
            .undirected();
        let ranked = try_rank_nodes(&view, 10).unwrap();

        assert_eq!(ranked[0].id, "hub");
        assert!((ranked[0].degree - 1.0).abs() < 1e-9);
        // Every leaf pair passes through the hub.
        assert!((ranked[0].betweenness - 1.0).abs() < 1e-9);
        assert_eq!(ranked[1].betweenness, 0.0);
    }

    #[test]
    fn test_split_shortest_paths() {
        // Two equal paths from s to t share the credit.
        let view = EdgeList::from_edges(pairs(&[("s", "a"), ("s", "b"), ("a", "t"), ("b", "t")]));
        let ranked = try_rank_nodes(&view, 4).unwrap();
        let a = ranked.iter().find(|r| r.id == "a").unwrap();
        let b = ranked.iter().find(|r| r.id == "b").unwrap();

        assert!((a.betweenness - b.betweenness).abs() < 1e-9);
        assert!((a.betweenness - 0.5 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_truncates_to_top_n() {
        let view = EdgeList::from_edges(pairs(&[("a", "b"), ("b", "c"), ("c", "d")]));
        assert_eq!(rank_representative_nodes(&view, 2).len(), 2);
        assert!(rank_representative_nodes(&view, 0).is_empty());
    }

    #[test]
    fn test_small_graphs() {
        let empty = EdgeList::default();
        assert!(try_rank_nodes(&empty, 5).unwrap().is_empty());

        let single = EdgeList::new(vec!["only".into()], Vec::new());
        let ranked = try_rank_nodes(&single, 5).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 0.0);

        let pair = EdgeList::from_edges(pairs(&[("a", "b")]));
        let ranked = try_rank_nodes(&pair, 5).unwrap();
        assert_eq!(ranked[0].degree, 1.0);
        assert_eq!(ranked[0].betweenness, 0.0);
    }

    #[test]
    fn test_unknown_node_is_masked_by_best_effort_wrapper() {
        let view = EdgeList::new(vec!["a".into()], pairs(&[("a", "ghost")]));

        let err = try_rank_nodes(&view, 5).unwrap_err();
        assert_eq!(err, RankingError::UnknownNode("ghost".into()));
        assert!(rank_representative_nodes(&view, 5).is_empty());
    }

    #[test]
    fn test_ranks_code_graph_members_only() {
        let mut graph = CodeGraph::new();
        for (from, to) in [("Store", "load"), ("Store", "save"), ("Cache", "load")] {
            graph.connect(
                (from, NodeKind::Class),
                (to, NodeKind::Function),
                Edge::weighted(EdgeKind::DependsOn, 1.0),
            );
        }

        let ranked = rank_representative_nodes(&graph, 10);
        assert_eq!(ranked.len(), 4);
        assert!(ranked.iter().all(|id| graph.contains(id)));
        assert_eq!(ranked[0], "Store");
    }
}
