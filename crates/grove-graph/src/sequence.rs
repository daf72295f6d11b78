//! Execution order of source files.
//!
//! File nodes are picked out by label, the subgraph they induce is
//! topologically sorted, and the result is the order in which files should
//! be read or summarized.

use crate::error::{GraphError, Result};
use crate::graph::CodeGraph;
use grove_core::is_source_file_label;
use petgraph::algo::toposort;
use tracing::debug;

/// Orders the nodes whose label looks like a source file name.
pub fn sequence_files(graph: &CodeGraph) -> Result<Vec<String>> {
    sequence_files_matching(graph, is_source_file_label)
}

/// Orders the nodes accepted by `is_file`, using only edges between them.
///
/// # Errors
///
/// `EmptyExecutionOrder` when no node matches, `OrderingImpossible` when
/// the matching nodes form a cycle.
pub fn sequence_files_matching<F>(graph: &CodeGraph, is_file: F) -> Result<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    let files = graph.graph.filter_map(
        |_, node| is_file(node.label.as_str()).then_some(node.label.as_str()),
        |_, _| Some(()),
    );

    if files.node_count() == 0 {
        return Err(GraphError::EmptyExecutionOrder);
    }

    let order = toposort(&files, None).map_err(|cycle| GraphError::OrderingImpossible {
        node: files
            .node_weight(cycle.node_id())
            .map(|label| label.to_string())
            .unwrap_or_default(),
    })?;

    let sequence: Vec<String> = order
        .into_iter()
        .filter_map(|i| files.node_weight(i).map(|label| label.to_string()))
        .collect();
    debug!("Execution order over {} files", sequence.len());
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{Edge, EdgeKind};
    use crate::graph::NodeKind;

    fn file_edge(graph: &mut CodeGraph, from: &str, to: &str) {
        graph.connect(
            (from, NodeKind::File),
            (to, NodeKind::File),
            Edge::new(EdgeKind::FileDependency),
        );
    }

    fn position(order: &[String], label: &str) -> usize {
        order.iter().position(|l| l == label).unwrap()
    }

    #[test]
    fn test_order_is_linear_extension() {
        let mut graph = CodeGraph::new();
        file_edge(&mut graph, "config.py", "db.py");
        file_edge(&mut graph, "db.py", "app.py");
        file_edge(&mut graph, "config.py", "app.py");
        file_edge(&mut graph, "util.rs", "app.py");

        let order = sequence_files(&graph).unwrap();

        assert_eq!(order.len(), 4);
        for (from, to) in graph.edge_labels() {
            assert!(position(&order, &from) < position(&order, &to));
        }
    }

    #[test]
    fn test_ignores_non_file_nodes() {
        let mut graph = CodeGraph::new();
        graph.connect(
            ("main.py", NodeKind::File),
            ("run", NodeKind::Function),
            Edge::new(EdgeKind::Contains),
        );
        // The cycle through a non-file node does not count.
        graph.connect(
            ("run", NodeKind::Function),
            ("main.py", NodeKind::Function),
            Edge::new(EdgeKind::DependsOn),
        );
        graph.connect(
            ("README", NodeKind::File),
            ("main.py", NodeKind::File),
            Edge::new(EdgeKind::FileDependency),
        );

        assert_eq!(sequence_files(&graph).unwrap(), vec!["main.py"]);
    }

    #[test]
    fn test_selects_by_label_not_kind() {
        let mut graph = CodeGraph::new();
        graph.add_node("helpers.go", NodeKind::Function);
        assert_eq!(sequence_files(&graph).unwrap(), vec!["helpers.go"]);
    }

    #[test]
    fn test_no_files_is_empty_execution_order() {
        let mut graph = CodeGraph::new();
        graph.add_node("Parser", NodeKind::Class);
        assert_eq!(
            sequence_files(&graph).unwrap_err(),
            GraphError::EmptyExecutionOrder
        );
    }

    #[test]
    fn test_file_cycle_is_ordering_impossible() {
        let mut graph = CodeGraph::new();
        file_edge(&mut graph, "a.py", "b.py");
        file_edge(&mut graph, "b.py", "a.py");

        let err = sequence_files(&graph).unwrap_err();
        assert!(matches!(err, GraphError::OrderingImpossible { .. }));
    }

    #[test]
    fn test_custom_predicate() {
        let mut graph = CodeGraph::new();
        file_edge(&mut graph, "notes.md", "guide.md");
        graph.add_node("main.py", NodeKind::File);

        let order = sequence_files_matching(&graph, |label| label.ends_with(".md")).unwrap();
        assert_eq!(order, vec!["notes.md", "guide.md"]);
    }
}
