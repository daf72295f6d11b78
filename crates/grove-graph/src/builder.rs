//! Component graph builder.
//!
//! Turns extracted functions and classes into an acyclic directed graph.
//! Construction happens in three steps:
//! 1. Pick a construction mode from the number of distinct classes and
//!    functions
//! 2. Add nodes and edges for that mode (optionally with a file layer)
//! 3. Break every directed cycle by dropping its lightest edge

use crate::cycles::{eliminate_cycles, RemovedEdge};
use crate::edge::{Edge, EdgeKind};
use crate::error::{GraphError, Result};
use crate::graph::{CodeGraph, NodeKind};
use grove_core::Entity;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// Decides whether a function depends on a class, and how strongly.
///
/// Returns 0 for "no dependency". Swap this out to replace the textual
/// heuristic with real reference resolution without touching graph
/// construction.
pub trait DependencyInference: Send + Sync {
    fn infers_dependency(&self, class_name: &str, function_source: &str) -> usize;
}

/// Counts literal occurrences of the class name in the function source.
///
/// Purely textual: a class called `Data` matches `DataFrame` and any
/// comment that mentions it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringInference;

impl DependencyInference for SubstringInference {
    fn infers_dependency(&self, class_name: &str, function_source: &str) -> usize {
        if class_name.is_empty() {
            return 0;
        }
        function_source.matches(class_name).count()
    }
}

/// How the graph is shaped, chosen from the entity counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionMode {
    /// More than one class: classes point at the functions that mention them,
    /// weighted by mention count.
    ClassCentric,
    /// At most one class and more than one function: functions of each file
    /// are chained in extraction order.
    FunctionSequence,
    /// At most one class and at most one function: everything becomes a node,
    /// mentions become unweighted edges.
    Mixed,
}

impl ConstructionMode {
    /// Selects the mode from distinct class and function counts.
    pub fn select(class_count: usize, function_count: usize) -> Self {
        match (class_count, function_count) {
            (c, _) if c > 1 => Self::ClassCentric,
            (_, f) if f > 1 => Self::FunctionSequence,
            _ => Self::Mixed,
        }
    }
}

impl fmt::Display for ConstructionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassCentric => write!(f, "class-centric"),
            Self::FunctionSequence => write!(f, "function-sequence"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

/// A finished, acyclic component graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentGraph {
    pub graph: CodeGraph,
    /// The mode the graph was built in.
    pub mode: ConstructionMode,
    /// Edges dropped during cycle elimination, in removal order.
    pub removed_edges: Vec<RemovedEdge>,
}

/// Builds component graphs from extracted entities.
///
/// Holds no state between builds, so one builder can serve many requests.
pub struct ComponentGraphBuilder {
    inference: Box<dyn DependencyInference>,
    file_layer: bool,
    cycle_cap: Option<usize>,
}

impl Default for ComponentGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentGraphBuilder {
    /// Creates a builder with substring inference and no file layer.
    pub fn new() -> Self {
        Self {
            inference: Box::new(SubstringInference),
            file_layer: false,
            cycle_cap: None,
        }
    }

    /// Replaces the dependency inference strategy.
    pub fn with_inference(mut self, inference: impl DependencyInference + 'static) -> Self {
        self.inference = Box::new(inference);
        self
    }

    /// Adds file nodes, `contains` edges and lifted file-to-file edges.
    pub fn with_file_layer(mut self, enabled: bool) -> Self {
        self.file_layer = enabled;
        self
    }

    /// Overrides the cycle elimination iteration cap (defaults to one more
    /// than the edge count before elimination).
    pub fn with_cycle_cap(mut self, cap: usize) -> Self {
        self.cycle_cap = Some(cap);
        self
    }

    /// Builds the graph.
    ///
    /// # Errors
    ///
    /// `InsufficientData` when both lists are empty, and
    /// `CycleEliminationFailed` if the iteration cap is hit.
    pub fn build(&self, functions: &[Entity], classes: &[Entity]) -> Result<ComponentGraph> {
        if functions.is_empty() && classes.is_empty() {
            return Err(GraphError::InsufficientData(
                "no functions or classes were extracted".into(),
            ));
        }

        let class_names = distinct_names(classes);
        let function_names = distinct_names(functions);
        let mode = ConstructionMode::select(class_names.len(), function_names.len());
        debug!(
            "{} distinct classes, {} distinct functions: {} mode",
            class_names.len(),
            function_names.len(),
            mode
        );

        let mut graph = CodeGraph::new();
        match mode {
            ConstructionMode::ClassCentric => {
                self.add_class_edges(&mut graph, &class_names, functions, true)
            }
            ConstructionMode::FunctionSequence => add_sequence_edges(&mut graph, functions),
            ConstructionMode::Mixed => {
                for name in &class_names {
                    graph.add_node(name, NodeKind::Class);
                }
                for name in &function_names {
                    graph.add_node(name, NodeKind::Function);
                }
                self.add_class_edges(&mut graph, &class_names, functions, false)
            }
        }

        if self.file_layer {
            add_file_layer(&mut graph, functions, classes);
        }

        let cap = self.cycle_cap.unwrap_or_else(|| graph.edge_count() + 1);
        let removed_edges = eliminate_cycles(&mut graph, cap)?;

        info!(
            "Built {} component graph: {} nodes, {} edges ({} removed to break cycles)",
            mode,
            graph.node_count(),
            graph.edge_count(),
            removed_edges.len()
        );

        Ok(ComponentGraph {
            graph,
            mode,
            removed_edges,
        })
    }

    /// Adds `class -> function` edges wherever inference finds a dependency.
    fn add_class_edges(
        &self,
        graph: &mut CodeGraph,
        class_names: &[&str],
        functions: &[Entity],
        weighted: bool,
    ) {
        for name in class_names {
            graph.add_node(name, NodeKind::Class);
        }

        for function in functions {
            for class in class_names {
                let count = self.inference.infers_dependency(class, &function.source);
                if count == 0 {
                    continue;
                }
                let edge = if weighted {
                    Edge::weighted(EdgeKind::DependsOn, count as f64)
                } else {
                    Edge::new(EdgeKind::DependsOn)
                };
                graph.connect(
                    (*class, NodeKind::Class),
                    (function.name.as_str(), NodeKind::Function),
                    edge,
                );
            }
        }
    }
}

/// Builds a component graph with the default builder.
pub fn build_component_graph(functions: &[Entity], classes: &[Entity]) -> Result<ComponentGraph> {
    ComponentGraphBuilder::new().build(functions, classes)
}

/// Chains each file's functions in extraction order.
fn add_sequence_edges(graph: &mut CodeGraph, functions: &[Entity]) {
    for function in functions {
        graph.add_node(&function.name, NodeKind::Function);
    }

    for (_, names) in group_by_file(functions) {
        for pair in names.windows(2) {
            let from = graph.add_node(pair[0], NodeKind::Function);
            let to = graph.add_node(pair[1], NodeKind::Function);
            graph.add_edge(from, to, Edge::new(EdgeKind::Sequence));
        }
    }
}

/// Adds file nodes, `file -> entity` edges, and `file -> file` edges for
/// every entity edge that crosses files.
fn add_file_layer(graph: &mut CodeGraph, functions: &[Entity], classes: &[Entity]) {
    // An entity name defined in several files belongs to all of them.
    let mut files_of: HashMap<&str, Vec<&str>> = HashMap::new();
    for entity in functions.iter().chain(classes) {
        let files = files_of.entry(entity.name.as_str()).or_default();
        if !files.contains(&entity.file.as_str()) {
            files.push(entity.file.as_str());
        }
    }

    let mut lifted: Vec<((String, String), f64)> = Vec::new();
    let mut lifted_index: HashMap<(String, String), usize> = HashMap::new();
    for edge in graph.graph.edge_references() {
        let source = graph.label(edge.source());
        let target = graph.label(edge.target());
        let (Some(from_files), Some(to_files)) = (files_of.get(source), files_of.get(target))
        else {
            continue;
        };
        for from in from_files {
            for to in to_files {
                if from == to {
                    continue;
                }
                let key = (from.to_string(), to.to_string());
                let weight = edge.weight().effective_weight();
                match lifted_index.get(&key) {
                    Some(&i) => lifted[i].1 += weight,
                    None => {
                        lifted_index.insert(key.clone(), lifted.len());
                        lifted.push((key, weight));
                    }
                }
            }
        }
    }

    for entity in classes.iter().chain(functions) {
        graph.connect(
            (entity.file.as_str(), NodeKind::File),
            (entity.name.as_str(), NodeKind::from(entity.kind)),
            Edge::new(EdgeKind::Contains),
        );
    }

    for ((from, to), weight) in lifted {
        graph.connect(
            (from.as_str(), NodeKind::File),
            (to.as_str(), NodeKind::File),
            Edge::weighted(EdgeKind::FileDependency, weight),
        );
    }
}

/// Distinct entity names in first-seen order.
fn distinct_names(entities: &[Entity]) -> Vec<&str> {
    let mut seen = HashSet::new();
    entities
        .iter()
        .map(|e| e.name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}

/// Function names grouped by file, both in first-seen order.
fn group_by_file(functions: &[Entity]) -> Vec<(&str, Vec<&str>)> {
    let mut groups: Vec<(&str, Vec<&str>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for function in functions {
        let i = *index.entry(function.file.as_str()).or_insert_with(|| {
            groups.push((function.file.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[i].1.push(function.name.as_str());
    }
    groups
}
