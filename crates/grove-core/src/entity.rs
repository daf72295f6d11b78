//! Entity model.
//!
//! An entity is a function or class pulled out of a source file together
//! with its full source text. Entities are what the graph builder consumes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of code element an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A function or method.
    Function,
    /// A class-like type (class, struct, enum, trait, interface).
    Class,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Function => write!(f, "function"),
            EntityKind::Class => write!(f, "class"),
        }
    }
}

/// A function or class extracted from a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Name qualified by the enclosing class scope, e.g. `UserService.validate`.
    pub name: String,
    /// Function or class.
    pub kind: EntityKind,
    /// Name of the file that defines the entity.
    pub file: String,
    /// Full source text of the definition.
    pub source: String,
    /// Starting line (1-indexed).
    pub line_start: u32,
    /// Ending line (1-indexed).
    pub line_end: u32,
}

impl Entity {
    /// Creates an entity without line information.
    pub fn new(
        kind: EntityKind,
        file: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            file: file.into(),
            source: source.into(),
            line_start: 0,
            line_end: 0,
        }
    }

    /// Shorthand for a function entity.
    pub fn function(
        file: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self::new(EntityKind::Function, file, name, source)
    }

    /// Shorthand for a class entity.
    pub fn class(
        file: impl Into<String>,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self::new(EntityKind::Class, file, name, source)
    }

    /// Sets the line range.
    pub fn with_lines(mut self, start: u32, end: u32) -> Self {
        self.line_start = start;
        self.line_end = end;
        self
    }
}

/// Entities extracted from a single file, in extraction order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileExtraction {
    /// File name the entities belong to.
    pub file: String,
    /// Functions and methods.
    pub functions: Vec<Entity>,
    /// Classes and class-like types.
    pub classes: Vec<Entity>,
}

impl FileExtraction {
    /// Creates an empty extraction for a file.
    pub fn empty(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            functions: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Total number of entities.
    pub fn len(&self) -> usize {
        self.functions.len() + self.classes.len()
    }

    /// True when the file defines no functions or classes.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.classes.is_empty()
    }
}
