//! Project configuration stored at `<root>/.grove/config.json`.
//!
//! Every field has a default, so a partial file (or no file at all) is
//! valid configuration.

use crate::error::ConfigError;
use grove_core::SOURCE_EXTENSIONS;
use grove_graph::NeighborConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the per-project directory holding config and outputs.
pub const GROVE_DIR: &str = ".grove";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroveConfig {
    /// Extensions (without the dot) treated as source files.
    pub extensions: Vec<String>,
    /// Directory names skipped while walking the repository.
    pub ignore: Vec<String>,
    pub neighbors: NeighborConfig,
    pub ranking: RankingConfig,
    pub graph: GraphConfig,
    pub embedding: EmbeddingConfig,
    pub output: OutputConfig,
}

impl Default for GroveConfig {
    fn default() -> Self {
        Self {
            extensions: SOURCE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ignore: ["node_modules", "target", "dist", "__pycache__", ".git", GROVE_DIR]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            neighbors: NeighborConfig::default(),
            ranking: RankingConfig::default(),
            graph: GraphConfig::default(),
            embedding: EmbeddingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub top_n: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { top_n: 10 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Add file nodes and file-to-file edges to component graphs.
    pub file_layer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dimensions: 256 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory, relative to the project root.
    pub dir: String,
    pub graph_file: String,
    pub diagram_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: GROVE_DIR.to_string(),
            graph_file: "component_graph.dot".to_string(),
            diagram_file: "block_diagram.dot".to_string(),
        }
    }
}

impl GroveConfig {
    /// Path of the config file for a project root.
    pub fn path(root: &Path) -> PathBuf {
        root.join(GROVE_DIR).join(CONFIG_FILE)
    }

    /// Loads the project config, falling back to defaults when the file
    /// does not exist.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = Self::path(root);
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Writes the config, creating `.grove/` if needed. Returns the path written.
    pub fn save(&self, root: &Path) -> Result<PathBuf, ConfigError> {
        let path = Self::path(root);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Absolute output directory for a project root.
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.output.dir)
    }

    /// True when the file name has one of the configured source extensions.
    pub fn is_source_file(&self, file_name: &str) -> bool {
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }
}
