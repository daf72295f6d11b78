//! Error types for entity extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout grove-core.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Everything that can go wrong while turning a source file into entities.
///
/// All of these are contained per file: a batch keeps going when one
/// file fails to parse.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The file is empty or only whitespace.
    #[error("{0} is empty")]
    EmptySource(PathBuf),

    /// The syntax tree contains error or missing nodes.
    #[error("syntax error in {file} at line {line}")]
    Syntax { file: PathBuf, line: u32 },

    /// No grammar is registered for the file extension.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(PathBuf),

    /// Tree-sitter itself failed (language version mismatch, no tree).
    #[error("parser error: {0}")]
    ParserError(String),
}
