//! Analysis pipelines.
//!
//! Each pipeline runs a sequence of stages over an [`AnalysisSession`].
//! A failing stage is recorded in the report and only the stages that
//! depend on it are skipped, so callers always get whatever succeeded.

use crate::embed::{embed_files, Embedder};
use crate::error::{AnalysisError, Result};
use crate::session::{AnalysisSession, ParseFailure};
use crate::source::Omission;
use crate::summary::{generate_sequential_summary, SequentialSummary, Summarizer};
use grove_graph::{
    build_neighbor_graph_with, try_rank_nodes, CodeGraph, ComponentGraph, ComponentGraphBuilder,
    GraphExport, RankedNode, Renderer,
};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Parse,
    Build,
    Rank,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Parse => write!(f, "parse"),
            Stage::Build => write!(f, "build"),
            Stage::Rank => write!(f, "rank"),
            Stage::Render => write!(f, "render"),
        }
    }
}

/// A recorded, non-fatal failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: Stage,
    /// The file the failure is about, for per-file stages.
    pub subject: Option<String>,
    pub message: String,
}

impl StageFailure {
    fn new(stage: Stage, message: impl fmt::Display) -> Self {
        Self {
            stage,
            subject: None,
            message: message.to_string(),
        }
    }
}

impl From<ParseFailure> for StageFailure {
    fn from(failure: ParseFailure) -> Self {
        Self {
            stage: Stage::Parse,
            subject: Some(failure.file),
            message: failure.error,
        }
    }
}

/// Everything one `analyze` run produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub files_scanned: usize,
    pub source_files: usize,
    pub functions: usize,
    pub classes: usize,
    /// Non-source files found during traversal.
    pub metadata_files: Vec<String>,
    /// Files the source could not deliver.
    pub omissions: Vec<Omission>,
    /// Serialized as a [`GraphExport`] under `graph`.
    #[serde(rename = "graph", serialize_with = "serialize_component")]
    pub component: Option<ComponentGraph>,
    pub ranking: Vec<RankedNode>,
    /// Renderer output for the component graph.
    #[serde(skip)]
    pub rendered: Option<Vec<u8>>,
    pub failures: Vec<StageFailure>,
    pub duration_ms: u64,
}

impl AnalysisReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures_in(&self, stage: Stage) -> impl Iterator<Item = &StageFailure> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }
}

fn serialize_component<S: Serializer>(
    component: &Option<ComponentGraph>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    component
        .as_ref()
        .map(GraphExport::from_component)
        .serialize(serializer)
}

/// Extracts, builds, ranks and renders.
///
/// Parse failures are per file. A build failure skips ranking and rendering.
pub fn analyze(session: &mut AnalysisSession, renderer: &dyn Renderer) -> AnalysisReport {
    let start = Instant::now();
    let inventory = session.inventory();
    let config = session.config().clone();

    let mut failures: Vec<StageFailure> = inventory
        .parse_failures
        .iter()
        .cloned()
        .map(StageFailure::from)
        .collect();

    let component = match ComponentGraphBuilder::new()
        .with_file_layer(config.graph.file_layer)
        .build(&inventory.functions, &inventory.classes)
    {
        Ok(component) => Some(component),
        Err(e) => {
            warn!("Component graph unavailable: {}", e);
            failures.push(StageFailure::new(Stage::Build, e));
            None
        }
    };

    let mut ranking = Vec::new();
    let mut rendered = None;
    if let Some(component) = &component {
        match try_rank_nodes(&component.graph, config.ranking.top_n) {
            Ok(ranked) => ranking = ranked,
            Err(e) => {
                warn!("Ranking unavailable: {}", e);
                failures.push(StageFailure::new(Stage::Rank, e));
            }
        }
        match renderer.render(&component.graph) {
            Ok(bytes) => rendered = Some(bytes),
            Err(e) => {
                warn!("Rendering failed: {}", e);
                failures.push(StageFailure::new(Stage::Render, e));
            }
        }
    }

    let report = AnalysisReport {
        files_scanned: session.files().len(),
        source_files: session.source_files().len(),
        functions: inventory.functions.len(),
        classes: inventory.classes.len(),
        metadata_files: session.metadata_files().into_iter().map(String::from).collect(),
        omissions: session.omissions().to_vec(),
        component,
        ranking,
        rendered,
        failures,
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Analyzed {} in {}ms ({} failures)",
        session.source_name(),
        report.duration_ms,
        report.failures.len()
    );
    report
}

/// Builds the component graph as configured.
pub fn build_configured_graph(session: &mut AnalysisSession) -> Result<ComponentGraph> {
    let file_layer = session.config().graph.file_layer;
    let inventory = session.inventory();
    Ok(ComponentGraphBuilder::new()
        .with_file_layer(file_layer)
        .build(&inventory.functions, &inventory.classes)?)
}

/// The `top_n` most central components. Unlike [`analyze`], a ranking
/// failure is returned instead of recorded.
pub fn rank_components(session: &mut AnalysisSession, top_n: usize) -> Result<Vec<RankedNode>> {
    let component = build_configured_graph(session)?;
    Ok(try_rank_nodes(&component.graph, top_n)?)
}

/// Builds the component graph and writes its JSON export to `target`.
pub fn export_graph(session: &mut AnalysisSession, target: &Path) -> Result<GraphExport> {
    let component = build_configured_graph(session)?;
    let export = GraphExport::from_component(&component);
    write_output(target, export.to_json()?.as_bytes())?;
    Ok(export)
}

/// Writes rendered output, creating parent directories as needed.
pub fn write_output(target: &Path, bytes: &[u8]) -> Result<()> {
    let output_error = |source| AnalysisError::Output {
        path: target.to_path_buf(),
        source,
    };
    if let Some(dir) = target.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(output_error)?;
        }
    }
    fs::write(target, bytes).map_err(output_error)?;
    debug!("Wrote {} bytes to {}", bytes.len(), target.display());
    Ok(())
}

/// Builds the component graph with the file layer forced on. Used when the
/// caller needs file nodes (sequencing, summaries).
pub fn build_file_graph(session: &mut AnalysisSession) -> Result<ComponentGraph> {
    let inventory = session.inventory();
    Ok(ComponentGraphBuilder::new()
        .with_file_layer(true)
        .build(&inventory.functions, &inventory.classes)?)
}

/// Topological execution order of the repository's source files.
pub fn execution_order(session: &mut AnalysisSession) -> Result<Vec<String>> {
    let component = build_file_graph(session)?;
    Ok(grove_graph::sequence_files(&component.graph)?)
}

/// Sequential file summaries and block diagram.
pub fn summarize(
    session: &mut AnalysisSession,
    summarizer: &dyn Summarizer,
) -> Result<SequentialSummary> {
    let inventory = session.inventory();
    let component = ComponentGraphBuilder::new()
        .with_file_layer(true)
        .build(&inventory.functions, &inventory.classes)?;
    generate_sequential_summary(&component.graph, &inventory.functions, summarizer)
}

/// k-NN graph over the embeddings of every source file.
pub fn file_neighbors(session: &AnalysisSession, embedder: &dyn Embedder) -> Result<CodeGraph> {
    let embeddings = embed_files(session.source_contents(), embedder)?;
    build_neighbor_graph_with(&embeddings, &session.config().neighbors).map_err(AnalysisError::from)
}
