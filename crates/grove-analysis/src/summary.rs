//! Sequential file summaries.
//!
//! Orders the files of a component graph, summarizes each file from its
//! functions, and draws the summaries as a left-to-right block diagram in
//! execution order.

use crate::error::{AnalysisError, SummaryError};
use grove_core::Entity;
use grove_graph::{render_block_diagram, sequence_files, CodeGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

/// Produces a natural-language summary of one file.
pub trait Summarizer {
    fn summarize_file(&self, file_name: &str, functions: &[Entity]) -> Result<String, SummaryError>;
}

/// Offline summarizer: lists the file's functions with their line spans and
/// the first line of each docstring or doc comment it finds.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineSummarizer;

impl Summarizer for OutlineSummarizer {
    fn summarize_file(&self, file_name: &str, functions: &[Entity]) -> Result<String, SummaryError> {
        if functions.is_empty() {
            return Err(SummaryError::NothingToSummarize(file_name.to_string()));
        }

        let mut lines = vec![format!(
            "{} defines {} function{}.",
            file_name,
            functions.len(),
            if functions.len() == 1 { "" } else { "s" }
        )];
        for function in functions {
            let mut line = format!("- {}", function.name);
            if function.line_start > 0 {
                line.push_str(&format!(
                    " (lines {}-{})",
                    function.line_start, function.line_end
                ));
            }
            if let Some(doc) = first_doc_line(&function.source) {
                line.push_str(": ");
                line.push_str(&doc);
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }
}

/// First line of a Python docstring or a `///` / `//` / `#` comment near
/// the top of a definition.
fn first_doc_line(source: &str) -> Option<String> {
    for line in source.lines().skip(1).take(3) {
        let trimmed = line.trim();
        let text = trimmed
            .strip_prefix("\"\"\"")
            .or_else(|| trimmed.strip_prefix("'''"))
            .or_else(|| trimmed.strip_prefix("///"))
            .or_else(|| trimmed.strip_prefix("//"))
            .or_else(|| trimmed.strip_prefix('#'));
        if let Some(text) = text {
            let text = text.trim_end_matches("\"\"\"").trim_end_matches("'''").trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// The prompt an LLM-backed summarizer sends for one file.
pub fn build_summary_prompt(file_name: &str, functions: &[Entity]) -> String {
    let function_texts = functions
        .iter()
        .map(|f| format!("Function: {}\n```\n{}\n```", f.name, f.source))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are an expert in source code analysis.\n\
         Summarize the following file with its key functions concisely:\n\n\
         **File Name**: {}\n\
         **Functions**:\n\
         {}\n\n\
         Provide a structured summary explaining the overall purpose of this file, \
         its key components, and any important parameters with values.",
        file_name, function_texts
    )
}

/// Result of a sequential summary run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequentialSummary {
    /// Topological order of the file nodes.
    pub execution_order: Vec<String>,
    /// `(file, summary)` in order of first appearance in the function list.
    pub file_summaries: Vec<(String, String)>,
    /// Files the summarizer failed on, with the reason.
    pub failures: Vec<(String, String)>,
    /// DOT source of the block diagram.
    pub diagram: String,
}

impl SequentialSummary {
    pub fn summary_for(&self, file: &str) -> Option<&str> {
        self.file_summaries
            .iter()
            .find(|(name, _)| name == file)
            .map(|(_, summary)| summary.as_str())
    }
}

/// Sequences the graph's files, summarizes each file's functions, and
/// renders the block diagram.
///
/// # Errors
///
/// Fails when the files cannot be ordered (`EmptyExecutionOrder`,
/// `OrderingImpossible`). A summarizer failure on one file only drops that
/// file from the diagram.
pub fn generate_sequential_summary(
    graph: &CodeGraph,
    functions: &[Entity],
    summarizer: &dyn Summarizer,
) -> Result<SequentialSummary, AnalysisError> {
    let execution_order = sequence_files(graph)?;
    info!("Execution order: {}", execution_order.join(" -> "));

    let mut by_file: Vec<(&str, Vec<Entity>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for function in functions {
        let i = *index.entry(function.file.as_str()).or_insert_with(|| {
            by_file.push((function.file.as_str(), Vec::new()));
            by_file.len() - 1
        });
        by_file[i].1.push(function.clone());
    }

    let mut summary = SequentialSummary {
        execution_order,
        ..Default::default()
    };
    for (file, file_functions) in &by_file {
        info!("Summarizing file: {}", file);
        match summarizer.summarize_file(file, file_functions) {
            Ok(text) => summary.file_summaries.push((file.to_string(), text)),
            Err(e) => {
                warn!("No summary for {}: {}", file, e);
                summary.failures.push((file.to_string(), e.to_string()));
            }
        }
    }

    let blocks: Vec<(String, String)> = summary
        .execution_order
        .iter()
        .filter_map(|file| {
            summary
                .summary_for(file)
                .map(|text| (file.clone(), text.to_string()))
        })
        .collect();
    summary.diagram = render_block_diagram(&blocks)?;

    Ok(summary)
}
