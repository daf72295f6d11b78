//! Grove Analysis - from a repository to graphs, rankings and summaries
//!
//! This crate wires extraction and graph algorithms into request-scoped
//! pipelines:
//!
//! 1. A [`RepositorySource`] fetches the file tree
//! 2. An [`AnalysisSession`] caches contents and extraction results
//! 3. Pipelines build, rank, render, sequence, embed and summarize
//!
//! Failures inside a pipeline are contained: [`analyze`] returns an
//! [`AnalysisReport`] with whatever succeeded plus the recorded failures.
//!
//! # Example
//!
//! ```no_run
//! use grove_analysis::{analyze, AnalysisSession, GroveConfig, LocalDirectory};
//! use grove_graph::DotRenderer;
//! use std::path::Path;
//!
//! let root = Path::new(".");
//! let config = GroveConfig::load(root).unwrap();
//! let source = LocalDirectory::new(root).with_ignore(config.ignore.clone());
//! let mut session = AnalysisSession::open(&source, config).unwrap();
//!
//! let report = analyze(&mut session, &DotRenderer::new());
//! println!("{} failures", report.failures.len());
//! ```

mod config;
mod embed;
mod error;
mod pipeline;
mod session;
mod source;
pub mod summary;

pub use config::{
    EmbeddingConfig, GraphConfig, GroveConfig, OutputConfig, RankingConfig, CONFIG_FILE,
    GROVE_DIR,
};
pub use embed::{embed_files, Embedder, HashingEmbedder};
pub use error::{
    AnalysisError, ConfigError, EmbedError, Result, SourceError, SummaryError,
};
pub use pipeline::{
    analyze, build_configured_graph, build_file_graph, execution_order, export_graph,
    file_neighbors, rank_components, summarize, write_output, AnalysisReport, Stage,
    StageFailure,
};
pub use session::{AnalysisSession, Inventory, ParseFailure};
pub use source::{
    is_allowed_upload, LocalDirectory, Omission, RepositorySource, RepositoryTree, SingleFile,
    TreeEntry, UPLOAD_EXTENSIONS,
};
pub use summary::{
    build_summary_prompt, generate_sequential_summary, OutlineSummarizer, SequentialSummary,
    Summarizer,
};
