//! Rendering graphs for humans and other tools.
//!
//! DOT output for Graphviz, plus a JSON export of the component graph.
//! Renderers only produce bytes; callers decide where to write them.

use crate::builder::{ComponentGraph, ConstructionMode};
use crate::cycles::RemovedEdge;
use crate::edge::GraphEdge;
use crate::error::RenderError;
use crate::graph::{CodeGraph, GraphNode, GraphStats, NodeKind};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

pub const DEFAULT_TITLE: &str = "Component Graph: Repo Design and Relationships";

/// Turns a graph into a persisted representation.
pub trait Renderer {
    fn render(&self, graph: &CodeGraph) -> Result<Vec<u8>, RenderError>;
}

/// Graphviz DOT renderer. Node fill color follows the node kind.
#[derive(Debug, Clone)]
pub struct DotRenderer {
    title: String,
    show_weights: bool,
}

impl Default for DotRenderer {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            show_weights: true,
        }
    }
}

impl DotRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Whether weighted edges get a label with their weight.
    pub fn with_weights(mut self, show: bool) -> Self {
        self.show_weights = show;
        self
    }

    /// Renders to a DOT string.
    pub fn render_string(&self, graph: &CodeGraph) -> Result<String, RenderError> {
        let mut out = String::new();
        writeln!(out, "digraph component_graph {{")?;
        writeln!(out, "  label=\"{}\";", escape(&self.title))?;
        writeln!(out, "  labelloc=t;")?;
        writeln!(out, "  node [style=filled, fontname=\"Helvetica\"];")?;

        for (i, node) in graph.nodes().enumerate() {
            writeln!(
                out,
                "  n{} [label=\"{}\", shape={}, fillcolor={}];",
                i,
                escape(&node.label),
                shape(node.kind),
                color(node.kind)
            )?;
        }

        for edge in graph.graph.edge_indices() {
            let Some((source, target)) = graph.graph.edge_endpoints(edge) else {
                continue;
            };
            let weight = graph.graph.edge_weight(edge).and_then(|e| e.weight);
            match weight {
                Some(w) if self.show_weights => writeln!(
                    out,
                    "  n{} -> n{} [label=\"{}\"];",
                    source.index(),
                    target.index(),
                    format_weight(w)
                )?,
                _ => writeln!(out, "  n{} -> n{};", source.index(), target.index())?,
            }
        }

        writeln!(out, "}}")?;
        Ok(out)
    }
}

impl Renderer for DotRenderer {
    fn render(&self, graph: &CodeGraph) -> Result<Vec<u8>, RenderError> {
        self.render_string(graph).map(String::into_bytes)
    }
}

/// Renders ordered `(name, text)` blocks as a left-to-right chain.
pub fn render_block_diagram(blocks: &[(String, String)]) -> Result<String, RenderError> {
    let mut out = String::new();
    writeln!(out, "digraph block_diagram {{")?;
    writeln!(out, "  rankdir=LR;")?;
    writeln!(
        out,
        "  node [shape=box, style=filled, fillcolor=lightblue, fontname=\"Helvetica\"];"
    )?;

    for (i, (name, text)) in blocks.iter().enumerate() {
        writeln!(
            out,
            "  b{} [label=\"{}\\n\\n{}\"];",
            i,
            escape(name),
            escape(text)
        )?;
    }
    for i in 1..blocks.len() {
        writeln!(out, "  b{} -> b{};", i - 1, i)?;
    }

    writeln!(out, "}}")?;
    Ok(out)
}

/// Serializable snapshot of a component graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub mode: Option<ConstructionMode>,
    pub stats: GraphStats,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub removed_edges: Vec<RemovedEdge>,
}

impl GraphExport {
    pub fn from_graph(graph: &CodeGraph) -> Self {
        Self {
            mode: None,
            stats: graph.stats(),
            nodes: graph.nodes().cloned().collect(),
            edges: graph.export_edges(),
            removed_edges: Vec::new(),
        }
    }

    pub fn from_component(component: &ComponentGraph) -> Self {
        Self {
            mode: Some(component.mode),
            removed_edges: component.removed_edges.clone(),
            ..Self::from_graph(&component.graph)
        }
    }

    pub fn to_json(&self) -> Result<String, RenderError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn color(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Function => "skyblue",
        NodeKind::Class => "lightgreen",
        NodeKind::File => "lightgray",
        NodeKind::Embedding => "white",
    }
}

fn shape(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Class => "box",
        NodeKind::File => "folder",
        NodeKind::Function | NodeKind::Embedding => "ellipse",
    }
}

fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{}", weight as i64)
    } else {
        format!("{:.3}", weight)
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_component_graph;
    use crate::edge::{Edge, EdgeKind};
    use grove_core::Entity;

    fn sample() -> CodeGraph {
        let mut graph = CodeGraph::new();
        graph.connect(
            ("App", NodeKind::Class),
            ("run", NodeKind::Function),
            Edge::weighted(EdgeKind::DependsOn, 2.0),
        );
        graph.connect(
            ("app.py", NodeKind::File),
            ("App", NodeKind::Class),
            Edge::new(EdgeKind::Contains),
        );
        graph
    }

    #[test]
    fn test_dot_colors_and_title() {
        let dot = DotRenderer::new().render_string(&sample()).unwrap();

        assert!(dot.starts_with("digraph component_graph {"));
        assert!(dot.contains(DEFAULT_TITLE));
        assert!(dot.contains("n0 [label=\"App\", shape=box, fillcolor=lightgreen];"));
        assert!(dot.contains("fillcolor=skyblue"));
        assert!(dot.contains("fillcolor=lightgray"));
        assert!(dot.contains("n0 -> n1 [label=\"2\"];"));
        assert!(dot.contains("n2 -> n0;"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_dot_without_weights() {
        let dot = DotRenderer::new()
            .with_weights(false)
            .with_title("Deps")
            .render_string(&sample())
            .unwrap();
        assert!(dot.contains("n0 -> n1;"));
        assert!(dot.contains("label=\"Deps\""));
    }

    #[test]
    fn test_labels_are_escaped() {
        let mut graph = CodeGraph::new();
        graph.add_node("say \"hi\"", NodeKind::Function);
        let bytes = DotRenderer::new().render(&graph).unwrap();
        let dot = String::from_utf8(bytes).unwrap();
        assert!(dot.contains("say \\\"hi\\\""));
    }

    #[test]
    fn test_block_diagram_chains_blocks() {
        let blocks = vec![
            ("config.py".to_string(), "Loads settings.".to_string()),
            ("app.py".to_string(), "Runs the app.".to_string()),
        ];
        let dot = render_block_diagram(&blocks).unwrap();

        assert!(dot.contains("rankdir=LR;"));
        assert!(dot.contains("fillcolor=lightblue"));
        assert!(dot.contains("b0 [label=\"config.py\\n\\nLoads settings.\"];"));
        assert!(dot.contains("b0 -> b1;"));
        assert!(!dot.contains("b1 -> b2"));
    }

    #[test]
    fn test_json_export_includes_removed_edges() {
        let functions = vec![
            Entity::function("one.py", "f", ""),
            Entity::function("one.py", "g", ""),
            Entity::function("two.py", "g", ""),
            Entity::function("two.py", "f", ""),
        ];
        let component = build_component_graph(&functions, &[]).unwrap();

        let export = GraphExport::from_component(&component);
        assert_eq!(export.mode, Some(ConstructionMode::FunctionSequence));
        assert_eq!(export.removed_edges.len(), 1);
        assert_eq!(export.edges.len(), 1);

        let json = export.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "function_sequence");
        assert_eq!(value["stats"]["node_count"], 2);
        assert_eq!(value["nodes"][0]["kind"], "function");
    }
}
