//! Cycle elimination.
//!
//! Repeatedly finds a directed cycle and drops its lightest edge until
//! the graph is acyclic. This is a greedy feedback-edge removal: it always
//! terminates with a DAG, but it does not promise to remove the fewest
//! possible edges.
//!
//! When several edges of a cycle share the minimum weight, the first one
//! in the order the DFS reports the cycle is removed. Which edge that is
//! depends on node insertion order, so two graphs with the same edge set
//! but different insertion order may lose different (equal-weight) edges.

use crate::edge::EdgeKind;
use crate::error::{GraphError, Result};
use crate::graph::{CodeGraph, NodeId};
use petgraph::graph::EdgeIndex;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// An edge dropped to break a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub weight: Option<f64>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Finds one directed cycle and returns its edges in path order.
///
/// Self loops are cycles of length one.
pub fn find_cycle(graph: &CodeGraph) -> Option<Vec<EdgeIndex>> {
    let g = &graph.graph;
    let mut marks = vec![Mark::Unvisited; g.node_count()];

    for start in g.node_indices() {
        if marks[start.index()] != Mark::Unvisited {
            continue;
        }

        // Each frame is a node on the current path plus its pending edges.
        let mut frames: Vec<(NodeId, Vec<EdgeIndex>, usize)> =
            vec![(start, outgoing(graph, start), 0)];
        // path_edges[i] leads from frames[i] to frames[i + 1].
        let mut path_edges: Vec<EdgeIndex> = Vec::new();
        marks[start.index()] = Mark::OnPath;

        while let Some(frame) = frames.last_mut() {
            let (node, edges, next) = frame;
            if *next == edges.len() {
                marks[node.index()] = Mark::Done;
                frames.pop();
                path_edges.pop();
                continue;
            }

            let edge = edges[*next];
            *next += 1;
            let Some((_, target)) = g.edge_endpoints(edge) else {
                continue;
            };

            match marks[target.index()] {
                Mark::OnPath => {
                    let pos = frames
                        .iter()
                        .position(|(n, _, _)| *n == target)
                        .unwrap_or(0);
                    let mut cycle = path_edges[pos..].to_vec();
                    cycle.push(edge);
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    marks[target.index()] = Mark::OnPath;
                    path_edges.push(edge);
                    frames.push((target, outgoing(graph, target), 0));
                }
                Mark::Done => {}
            }
        }
    }

    None
}

/// Outgoing edges of a node in insertion order.
fn outgoing(graph: &CodeGraph, node: NodeId) -> Vec<EdgeIndex> {
    let mut edges: Vec<EdgeIndex> = graph
        .graph
        .edges_directed(node, Direction::Outgoing)
        .map(|e| e.id())
        .collect();
    edges.reverse();
    edges
}

/// Removes lightest-edge-per-cycle until no cycle remains.
///
/// Each iteration removes exactly one edge, so the loop can never need
/// more iterations than the graph has edges. `max_iterations` turns a
/// broken invariant into an error instead of a hang.
pub fn eliminate_cycles(graph: &mut CodeGraph, max_iterations: usize) -> Result<Vec<RemovedEdge>> {
    let mut removed = Vec::new();
    let mut iterations = 0;

    while let Some(cycle) = find_cycle(graph) {
        if iterations >= max_iterations {
            return Err(GraphError::CycleEliminationFailed {
                iterations,
                remaining_edges: graph.edge_count(),
            });
        }
        iterations += 1;

        let Some(victim) = lightest_edge(graph, &cycle) else {
            break;
        };
        let endpoints = graph.graph.edge_endpoints(victim);
        let Some(edge) = graph.remove_edge(victim) else {
            break;
        };
        let (source, target) = endpoints
            .map(|(s, t)| (graph.label(s).to_string(), graph.label(t).to_string()))
            .unwrap_or_default();

        debug!(
            "Cycle of length {} broken at {} -> {} (weight {})",
            cycle.len(),
            source,
            target,
            edge.effective_weight()
        );
        removed.push(RemovedEdge {
            source,
            target,
            kind: edge.kind,
            weight: edge.weight,
        });
    }

    if !removed.is_empty() {
        warn!("Removed {} edges to make the graph acyclic", removed.len());
    }
    Ok(removed)
}

/// First edge of the cycle with the minimum effective weight.
fn lightest_edge(graph: &CodeGraph, cycle: &[EdgeIndex]) -> Option<EdgeIndex> {
    let mut best: Option<(EdgeIndex, f64)> = None;
    for &edge in cycle {
        let Some(data) = graph.graph.edge_weight(edge) else {
            continue;
        };
        let weight = data.effective_weight();
        match best {
            Some((_, w)) if weight >= w => {}
            _ => best = Some((edge, weight)),
        }
    }
    best.map(|(edge, _)| edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;
    use crate::graph::NodeKind;

    fn link(graph: &mut CodeGraph, from: &str, to: &str, weight: Option<f64>) {
        let edge = match weight {
            Some(w) => Edge::weighted(EdgeKind::DependsOn, w),
            None => Edge::new(EdgeKind::DependsOn),
        };
        graph.connect((from, NodeKind::Function), (to, NodeKind::Function), edge);
    }

    #[test]
    fn test_no_cycle_in_dag() {
        let mut graph = CodeGraph::new();
        link(&mut graph, "a", "b", None);
        link(&mut graph, "b", "c", None);
        link(&mut graph, "a", "c", None);

        assert!(find_cycle(&graph).is_none());
    }

    #[test]
    fn test_finds_triangle() {
        let mut graph = CodeGraph::new();
        link(&mut graph, "a", "b", None);
        link(&mut graph, "b", "c", None);
        link(&mut graph, "c", "a", None);

        let cycle = find_cycle(&graph).unwrap();
        assert_eq!(cycle.len(), 3);
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let mut graph = CodeGraph::new();
        link(&mut graph, "a", "a", None);

        assert_eq!(find_cycle(&graph).unwrap().len(), 1);

        let removed = eliminate_cycles(&mut graph, 10).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_removes_lightest_edge() {
        let mut graph = CodeGraph::new();
        link(&mut graph, "a", "b", Some(5.0));
        link(&mut graph, "b", "c", Some(2.0));
        link(&mut graph, "c", "a", Some(7.0));

        let removed = eliminate_cycles(&mut graph, 10).unwrap();

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].source, "b");
        assert_eq!(removed[0].target, "c");
        assert!(graph.is_acyclic());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_unweighted_edges_count_as_one() {
        let mut graph = CodeGraph::new();
        link(&mut graph, "a", "b", Some(3.0));
        link(&mut graph, "b", "a", None);

        let removed = eliminate_cycles(&mut graph, 10).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].source, "b");
        assert_eq!(removed[0].weight, None);
    }

    #[test]
    fn test_overlapping_cycles() {
        // a <-> b and b <-> c share node b.
        let mut graph = CodeGraph::new();
        link(&mut graph, "a", "b", Some(1.0));
        link(&mut graph, "b", "a", Some(4.0));
        link(&mut graph, "b", "c", Some(4.0));
        link(&mut graph, "c", "b", Some(2.0));

        let removed = eliminate_cycles(&mut graph, 10).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(graph.is_acyclic());
        assert!(graph.edge_between("b", "a").is_some());
        assert!(graph.edge_between("b", "c").is_some());
    }

    #[test]
    fn test_iteration_cap() {
        let mut graph = CodeGraph::new();
        link(&mut graph, "a", "b", None);
        link(&mut graph, "b", "a", None);
        link(&mut graph, "c", "d", None);
        link(&mut graph, "d", "c", None);

        let err = eliminate_cycles(&mut graph, 1).unwrap_err();
        assert!(matches!(
            err,
            GraphError::CycleEliminationFailed { iterations: 1, .. }
        ));
    }
}
