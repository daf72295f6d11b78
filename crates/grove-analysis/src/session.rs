//! Per-request analysis state.
//!
//! An `AnalysisSession` owns everything one analysis needs: the fetched
//! file contents and the extraction results, both keyed by file name.
//! Nothing is shared between sessions; dropping the session drops the caches.

use crate::config::GroveConfig;
use crate::error::{AnalysisError, SourceError};
use crate::source::{Omission, RepositorySource};
use grove_core::{Entity, EntityExtractor, FileExtraction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// A file whose entities could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseFailure {
    pub file: String,
    pub error: String,
}

/// Every entity of the repository, in file order then extraction order.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub functions: Vec<Entity>,
    pub classes: Vec<Entity>,
    pub parse_failures: Vec<ParseFailure>,
}

impl Inventory {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.classes.is_empty()
    }
}

pub struct AnalysisSession {
    config: GroveConfig,
    source_name: String,
    /// File names in tree order.
    files: Vec<String>,
    contents: HashMap<String, String>,
    extractions: HashMap<String, FileExtraction>,
    omissions: Vec<Omission>,
    extractor: EntityExtractor,
}

impl AnalysisSession {
    /// Fetches the source tree and caches every file's content.
    pub fn open(source: &dyn RepositorySource, config: GroveConfig) -> Result<Self, SourceError> {
        let tree = source.fetch_tree()?;
        let mut files = Vec::new();
        let mut contents = HashMap::new();
        for (name, content) in tree.files() {
            if contents.insert(name.to_string(), content.to_string()).is_none() {
                files.push(name.to_string());
            }
        }

        info!(
            "Opened {}: {} files ({} omitted)",
            source.describe(),
            files.len(),
            tree.omissions.len()
        );

        Ok(Self {
            config,
            source_name: source.describe(),
            files,
            contents,
            extractions: HashMap::new(),
            omissions: tree.omissions,
            extractor: EntityExtractor::new(),
        })
    }

    pub fn config(&self) -> &GroveConfig {
        &self.config
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// All file names in tree order.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Cached content of a file.
    pub fn content(&self, file: &str) -> Option<&str> {
        self.contents.get(file).map(String::as_str)
    }

    /// Files with a configured source extension.
    pub fn source_files(&self) -> Vec<&str> {
        self.files
            .iter()
            .map(String::as_str)
            .filter(|f| self.config.is_source_file(f))
            .collect()
    }

    /// Everything that is not a source file (docs, manifests, data).
    pub fn metadata_files(&self) -> Vec<&str> {
        self.files
            .iter()
            .map(String::as_str)
            .filter(|f| !self.config.is_source_file(f))
            .collect()
    }

    /// `(name, content)` of every source file, in tree order.
    pub fn source_contents(&self) -> Vec<(&str, &str)> {
        self.source_files()
            .into_iter()
            .filter_map(|f| self.content(f).map(|c| (f, c)))
            .collect()
    }

    pub fn omissions(&self) -> &[Omission] {
        &self.omissions
    }

    /// Extracts a file's entities, reusing an earlier result if there is one.
    ///
    /// Fails with `SourceError::NotInSession` for files the source never
    /// delivered and with `AnalysisError::Parse` when extraction fails.
    pub fn extraction(&mut self, file: &str) -> Result<&FileExtraction, AnalysisError> {
        if !self.extractions.contains_key(file) {
            let content = self
                .contents
                .get(file)
                .ok_or_else(|| SourceError::NotInSession(file.into()))?;
            let extraction = self.extractor.extract(file, content)?;
            debug!(
                "{}: {} functions, {} classes",
                file,
                extraction.functions.len(),
                extraction.classes.len()
            );
            self.extractions.insert(file.to_string(), extraction);
        }
        self.extractions
            .get(file)
            .ok_or_else(|| SourceError::NotInSession(file.into()).into())
    }

    /// Extracts every source file. Parse failures are logged and recorded;
    /// the remaining files still contribute their entities.
    pub fn inventory(&mut self) -> Inventory {
        let mut inventory = Inventory::default();
        let files: Vec<String> = self.source_files().into_iter().map(String::from).collect();

        for file in files {
            match self.extraction(&file) {
                Ok(extraction) => {
                    inventory.functions.extend(extraction.functions.iter().cloned());
                    inventory.classes.extend(extraction.classes.iter().cloned());
                }
                Err(e) => {
                    warn!("Skipping {}: {}", file, e);
                    inventory.parse_failures.push(ParseFailure {
                        file: file.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Extracted {} functions and {} classes ({} files failed)",
            inventory.functions.len(),
            inventory.classes.len(),
            inventory.parse_failures.len()
        );
        inventory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{LocalDirectory, SingleFile};
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("models.py"),
            "class User:\n    def greet(self):\n        return 'hi'\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("views.py"),
            "def show():\n    return User().greet()\n",
        )
        .unwrap();
        fs::write(dir.path().join("broken.py"), "def broken(:\n").unwrap();
        fs::write(dir.path().join("README.md"), "# demo\n").unwrap();
        dir
    }

    #[test]
    fn test_open_classifies_files() {
        let dir = fixture();
        let session =
            AnalysisSession::open(&LocalDirectory::new(dir.path()), GroveConfig::default())
                .unwrap();

        assert_eq!(session.files().len(), 4);
        assert_eq!(
            session.source_files(),
            vec!["broken.py", "models.py", "views.py"]
        );
        assert_eq!(session.metadata_files(), vec!["README.md"]);
        assert!(session.content("views.py").unwrap().contains("def show"));
    }

    #[test]
    fn test_inventory_contains_parse_failures() {
        let dir = fixture();
        let mut session =
            AnalysisSession::open(&LocalDirectory::new(dir.path()), GroveConfig::default())
                .unwrap();

        let inventory = session.inventory();

        let functions: Vec<&str> = inventory.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(functions, vec!["User.greet", "show"]);
        assert_eq!(inventory.classes.len(), 1);
        assert_eq!(inventory.parse_failures.len(), 1);
        assert_eq!(inventory.parse_failures[0].file, "broken.py");
    }

    #[test]
    fn test_extraction_is_cached() {
        let dir = fixture();
        let mut session =
            AnalysisSession::open(&LocalDirectory::new(dir.path()), GroveConfig::default())
                .unwrap();

        let first = session.extraction("models.py").unwrap().clone();
        fs::remove_file(dir.path().join("models.py")).unwrap();
        let second = session.extraction("models.py").unwrap();

        assert_eq!(first.classes.len(), second.classes.len());
        assert_eq!(session.extractions.len(), 1);
    }

    #[test]
    fn test_text_upload_has_no_entities() {
        let upload = SingleFile::new("notes.txt", "def not_code(): pass").unwrap();
        let mut session = AnalysisSession::open(&upload, GroveConfig::default()).unwrap();

        let inventory = session.inventory();
        assert!(inventory.is_empty());
        assert!(inventory.parse_failures.is_empty());
        assert_eq!(session.metadata_files(), vec!["notes.txt"]);
    }

    #[test]
    fn test_unknown_file_is_not_in_session() {
        let dir = fixture();
        let mut session =
            AnalysisSession::open(&LocalDirectory::new(dir.path()), GroveConfig::default())
                .unwrap();

        let err = session.extraction("missing.py").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Source(SourceError::NotInSession(ref name)) if name == "missing.py"
        ));
        assert!(err.to_string().contains("not part of this session"));
    }

    #[test]
    fn test_broken_file_is_parse_error() {
        let dir = fixture();
        let mut session =
            AnalysisSession::open(&LocalDirectory::new(dir.path()), GroveConfig::default())
                .unwrap();

        let err = session.extraction("broken.py").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Parse(grove_core::ParseError::Syntax { .. })
        ));
    }
}
