//! Error types for repository analysis.

use grove_core::ParseError;
use grove_graph::{GraphError, RankingError, RenderError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout grove-analysis.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Failures while fetching a repository tree.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("repository root not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Upload with an extension outside the allowed set.
    #[error("file type not allowed: {0}")]
    UnsupportedUpload(String),

    /// The walk failed somewhere no single entry can be blamed for.
    #[error("directory walk failed: {0}")]
    Walk(String),

    /// A file was requested that the session never fetched.
    #[error("{0} is not part of this session")]
    NotInSession(String),
}

impl SourceError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures while embedding text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbedError {
    #[error("embedding dimension must be positive, got {0}")]
    InvalidDimensions(usize),

    #[error("embedding backend failed: {0}")]
    Backend(String),
}

/// Failures while summarizing a file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SummaryError {
    #[error("no functions to summarize in {0}")]
    NothingToSummarize(String),

    #[error("summarizer backend failed: {0}")]
    Backend(String),
}

/// Failures while loading or saving `.grove/config.json`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to access config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Any failure surfaced by the analysis layer.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Ranking(#[from] RankingError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Summary(#[from] SummaryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
