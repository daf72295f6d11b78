//! Repository sources.
//!
//! A source produces an ordered tree of files and directories. File names
//! are paths relative to the repository root with `/` separators; those
//! names become the `file` of every extracted entity and the labels of
//! file nodes.

use crate::error::SourceError;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files larger than this are skipped and recorded as omissions.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Extensions accepted by [`SingleFile`] uploads.
pub const UPLOAD_EXTENSIONS: &[&str] = &["py", "txt", "md"];

/// One entry of a fetched tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeEntry {
    File { name: String, content: String },
    Directory { name: String },
}

impl TreeEntry {
    pub fn name(&self) -> &str {
        match self {
            TreeEntry::File { name, .. } | TreeEntry::Directory { name } => name,
        }
    }
}

/// A file that could not be fetched. Traversal carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Omission {
    pub name: String,
    pub reason: String,
}

/// Ordered repository contents plus the files that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryTree {
    pub entries: Vec<TreeEntry>,
    pub omissions: Vec<Omission>,
}

impl RepositoryTree {
    /// `(name, content)` of every file, in tree order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|entry| match entry {
            TreeEntry::File { name, content } => Some((name.as_str(), content.as_str())),
            TreeEntry::Directory { .. } => None,
        })
    }

    pub fn file_count(&self) -> usize {
        self.files().count()
    }
}

/// Anything that can produce a repository tree.
pub trait RepositorySource {
    /// Fetches the whole tree. Per-file failures land in
    /// [`RepositoryTree::omissions`]; only failures that prevent traversal
    /// altogether are errors.
    fn fetch_tree(&self) -> Result<RepositoryTree, SourceError>;

    /// Human-readable name for logs and reports.
    fn describe(&self) -> String;
}

/// A directory on the local filesystem.
///
/// Honors `.gitignore`, skips hidden entries and any directory whose name
/// is in the ignore list. Entries are sorted by name for stable output.
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    root: PathBuf,
    ignore: Vec<String>,
    max_file_size: u64,
}

impl LocalDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    /// Directory names to skip anywhere in the tree.
    pub fn with_ignore(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignore = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative_name(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Turns a walk error into an omission for the entry it names. Errors
    /// without a path below the root abort the walk.
    fn walk_omission(&self, err: &ignore::Error) -> Result<Omission, SourceError> {
        match error_path(err) {
            Some(path) if path != self.root.as_path() => Ok(Omission {
                name: self.relative_name(path),
                reason: err.to_string(),
            }),
            _ => Err(SourceError::Walk(err.to_string())),
        }
    }
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Partial(errors) => errors.iter().find_map(error_path),
        _ => None,
    }
}

impl RepositorySource for LocalDirectory {
    fn fetch_tree(&self) -> Result<RepositoryTree, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::NotFound(self.root.clone()));
        }

        let ignore = self.ignore.clone();
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                !(is_dir && ignore.iter().any(|name| entry.file_name() == name.as_str()))
            })
            .build();

        let mut tree = RepositoryTree::default();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    let omission = self.walk_omission(&e)?;
                    warn!("Skipping unreadable entry {}: {}", omission.name, e);
                    tree.omissions.push(omission);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let name = self.relative_name(entry.path());
            let Some(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                tree.entries.push(TreeEntry::Directory { name });
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            match read_file(entry.path(), self.max_file_size) {
                Ok(content) => tree.entries.push(TreeEntry::File { name, content }),
                Err(reason) => {
                    debug!("Omitting {}: {}", name, reason);
                    tree.omissions.push(Omission { name, reason });
                }
            }
        }

        debug!(
            "Fetched {} files from {} ({} omitted)",
            tree.file_count(),
            self.root.display(),
            tree.omissions.len()
        );
        Ok(tree)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

fn read_file(path: &Path, max_size: u64) -> Result<String, String> {
    let size = fs::metadata(path).map_err(|e| e.to_string())?.len();
    if size > max_size {
        return Err(format!("{} bytes exceeds the {} byte limit", size, max_size));
    }
    fs::read_to_string(path).map_err(|e| e.to_string())
}

/// A single uploaded file.
#[derive(Debug, Clone)]
pub struct SingleFile {
    name: String,
    content: String,
}

impl SingleFile {
    /// Accepts an upload if its extension is one of [`UPLOAD_EXTENSIONS`].
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Result<Self, SourceError> {
        let name = name.into();
        if !is_allowed_upload(&name) {
            return Err(SourceError::UnsupportedUpload(name));
        }
        Ok(Self {
            name,
            content: content.into(),
        })
    }

    /// Reads an upload from disk. The file name (not the full path) names it.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let content = fs::read_to_string(path).map_err(|e| SourceError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::new(name, content)
    }
}

impl RepositorySource for SingleFile {
    fn fetch_tree(&self) -> Result<RepositoryTree, SourceError> {
        Ok(RepositoryTree {
            entries: vec![TreeEntry::File {
                name: self.name.clone(),
                content: self.content.clone(),
            }],
            omissions: Vec::new(),
        })
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// True for upload names with an allowed extension.
pub fn is_allowed_upload(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            UPLOAD_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tempfile::TempDir;

    fn write(root: &Path, name: &str, content: &str) {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_local_directory_walks_in_name_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.py", "def b(): pass\n");
        write(dir.path(), "a.py", "def a(): pass\n");
        write(dir.path(), "pkg/c.py", "def c(): pass\n");
        write(dir.path(), "README.md", "# readme\n");

        let tree = LocalDirectory::new(dir.path()).fetch_tree().unwrap();
        let names: Vec<&str> = tree.entries.iter().map(|e| e.name()).collect();

        assert_eq!(names, vec!["README.md", "a.py", "b.py", "pkg", "pkg/c.py"]);
        assert!(matches!(tree.entries[3], TreeEntry::Directory { .. }));
        assert_eq!(tree.file_count(), 4);
        assert!(tree.omissions.is_empty());
    }

    #[test]
    fn test_ignored_directories_are_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.py", "x = 1\n");
        write(dir.path(), "node_modules/lib.js", "function f() {}\n");
        write(dir.path(), "__pycache__/app.py", "junk\n");

        let tree = LocalDirectory::new(dir.path())
            .with_ignore(["node_modules", "__pycache__"])
            .fetch_tree()
            .unwrap();

        let files: Vec<&str> = tree.files().map(|(name, _)| name).collect();
        assert_eq!(files, vec!["app.py"]);
    }

    #[test]
    fn test_unreadable_files_become_omissions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "ok.py", "x = 1\n");
        fs::write(dir.path().join("blob.bin"), [0xff, 0xfe, 0x00, 0x81]).unwrap();
        write(dir.path(), "huge.py", &"x = 1\n".repeat(100));

        let tree = LocalDirectory::new(dir.path())
            .with_max_file_size(64)
            .fetch_tree()
            .unwrap();

        let files: Vec<&str> = tree.files().map(|(name, _)| name).collect();
        assert_eq!(files, vec!["ok.py"]);
        let omitted: Vec<&str> = tree.omissions.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(omitted, vec!["blob.bin", "huge.py"]);
    }

    #[test]
    fn test_walk_errors_name_their_entry() {
        let dir = TempDir::new().unwrap();
        let source = LocalDirectory::new(dir.path());

        let denied = ignore::Error::WithDepth {
            depth: 2,
            err: Box::new(ignore::Error::WithPath {
                path: dir.path().join("pkg").join("secret"),
                err: Box::new(ignore::Error::Io(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "denied",
                ))),
            }),
        };
        let omission = source.walk_omission(&denied).unwrap();
        assert_eq!(omission.name, "pkg/secret");
        assert!(omission.reason.contains("denied"));

        let pathless = ignore::Error::Io(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(matches!(
            source.walk_omission(&pathless),
            Err(SourceError::Walk(_))
        ));
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let err = LocalDirectory::new(dir.path().join("nope"))
            .fetch_tree()
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn test_single_file_upload_filter() {
        assert!(SingleFile::new("app.py", "x = 1").is_ok());
        assert!(SingleFile::new("notes.TXT", "hi").is_ok());
        assert!(SingleFile::new("guide.md", "# hi").is_ok());

        let err = SingleFile::new("main.rs", "fn main() {}").unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedUpload(name) if name == "main.rs"));
        assert!(SingleFile::new("Makefile", "all:").is_err());
    }

    #[test]
    fn test_single_file_tree() {
        let tree = SingleFile::new("app.py", "def run(): pass")
            .unwrap()
            .fetch_tree()
            .unwrap();
        assert_eq!(tree.files().collect::<Vec<_>>(), vec![("app.py", "def run(): pass")]);
    }

    #[test]
    fn test_single_file_from_path() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "tool.py", "def tool(): pass\n");

        let upload = SingleFile::from_path(&dir.path().join("tool.py")).unwrap();
        assert_eq!(upload.describe(), "tool.py");
    }
}
