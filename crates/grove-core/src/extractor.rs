//! EntityExtractor - turns source text into functions and classes.
//!
//! The extractor walks the tree-sitter syntax tree breadth-first, so
//! top-level definitions come before the methods nested inside them.
//! That order is the "extraction order" the function-sequence graph
//! mode chains entities by.
//!
//! Functions defined inside a class-like scope are qualified with the
//! innermost scope name (`UserService.validate`). Class names are kept
//! unqualified since the graph builder matches them against source text.

use crate::entity::{Entity, EntityKind, FileExtraction};
use crate::error::{ParseError, Result};
use crate::language::SupportedLanguage;
use std::collections::VecDeque;
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

/// Syntax-tree entity extractor.
///
/// Holds one tree-sitter parser and re-targets it per file, so a single
/// extractor can be reused across a whole repository.
pub struct EntityExtractor {
    parser: Parser,
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Extracts entities from in-memory source. The language is chosen from
    /// the file name's extension.
    ///
    /// # Errors
    ///
    /// Fails with `EmptySource` for empty or whitespace-only text and with
    /// `Syntax` when tree-sitter had to recover from errors. A well-formed
    /// file without definitions yields an empty extraction, not an error.
    pub fn extract(&mut self, file_name: &str, source: &str) -> Result<FileExtraction> {
        let language = SupportedLanguage::from_path(file_name)
            .ok_or_else(|| ParseError::UnsupportedLanguage(file_name.into()))?;
        self.extract_as(language, file_name, source)
    }

    /// Extracts entities using an explicit language.
    pub fn extract_as(
        &mut self,
        language: SupportedLanguage,
        file_name: &str,
        source: &str,
    ) -> Result<FileExtraction> {
        if source.trim().is_empty() {
            return Err(ParseError::EmptySource(file_name.into()));
        }

        self.parser
            .set_language(&language.grammar())
            .map_err(|e| ParseError::ParserError(format!("Failed to set language: {}", e)))?;

        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ParseError::ParserError("Tree-sitter returned no tree".into()))?;

        if let Some(line) = first_error_line(&tree) {
            return Err(ParseError::Syntax {
                file: file_name.into(),
                line,
            });
        }

        let extraction = collect_entities(&tree, source, file_name, language);
        debug!(
            "Extracted {} functions and {} classes from {}",
            extraction.functions.len(),
            extraction.classes.len(),
            file_name
        );
        Ok(extraction)
    }
}

/// Breadth-first walk collecting definitions with their class scope.
fn collect_entities(
    tree: &Tree,
    source: &str,
    file_name: &str,
    language: SupportedLanguage,
) -> FileExtraction {
    let mut extraction = FileExtraction::empty(file_name);
    let mut queue: VecDeque<(Node, Option<String>)> = VecDeque::new();
    queue.push_back((tree.root_node(), None));

    while let Some((node, scope)) = queue.pop_front() {
        if let Some(kind) = language.classify(&node) {
            if let Some(name) = language.definition_name(&node, source) {
                let owner = language
                    .receiver_owner(&node, source)
                    .or_else(|| scope.clone());
                let entity = build_entity(&node, source, file_name, kind, &name, owner);
                match kind {
                    EntityKind::Function => extraction.functions.push(entity),
                    EntityKind::Class => extraction.classes.push(entity),
                }
            }
        }

        let child_scope = language.scope_name(&node, source).or(scope);
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i) {
                queue.push_back((child, child_scope.clone()));
            }
        }
    }

    extraction
}

fn build_entity(
    node: &Node,
    source: &str,
    file_name: &str,
    kind: EntityKind,
    name: &str,
    owner: Option<String>,
) -> Entity {
    let qualified = match (kind, owner) {
        (EntityKind::Function, Some(owner)) => format!("{}.{}", owner, name),
        _ => name.to_string(),
    };
    let text = node.utf8_text(source.as_bytes()).unwrap_or("");

    Entity::new(kind, file_name, qualified, text).with_lines(
        node.start_position().row as u32 + 1,
        node.end_position().row as u32 + 1,
    )
}

/// Line (1-indexed) of the first error or missing node, if any.
fn first_error_line(tree: &Tree) -> Option<u32> {
    let root = tree.root_node();
    if !root.has_error() {
        return None;
    }

    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row as u32 + 1);
        }
        // Push in reverse so the leftmost child is visited first.
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                if child.has_error() || child.is_missing() {
                    stack.push(child);
                }
            }
        }
    }

    Some(root.start_position().row as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_python_functions_and_classes() {
        let mut extractor = EntityExtractor::new();

        let source = r#"
def greet(name):
    return f"Hello, {name}!"

class UserService:
    def validate(self, user):
        return True

    def save(self, user):
        return self.validate(user)
"#;

        let result = extractor.extract("service.py", source).unwrap();

        assert_eq!(names(&result.classes), vec!["UserService"]);
        assert_eq!(
            names(&result.functions),
            vec!["greet", "UserService.validate", "UserService.save"]
        );
        assert!(result.functions.iter().all(|f| f.file == "service.py"));
        assert!(result.functions[0].source.starts_with("def greet"));
    }

    #[test]
    fn test_breadth_first_order() {
        let mut extractor = EntityExtractor::new();

        // The method is nested one level deeper than `late`, so it comes after it.
        let source = r#"
class Early:
    def method(self):
        pass

def late():
    pass
"#;

        let result = extractor.extract("order.py", source).unwrap();
        assert_eq!(names(&result.functions), vec!["late", "Early.method"]);
    }

    #[test]
    fn test_line_numbers() {
        let mut extractor = EntityExtractor::new();
        let source = "def a():\n    pass\n\n\ndef b():\n    return 1\n";

        let result = extractor.extract("lines.py", source).unwrap();
        assert_eq!(result.functions[0].line_start, 1);
        assert_eq!(result.functions[0].line_end, 2);
        assert_eq!(result.functions[1].line_start, 5);
    }

    #[test]
    fn test_empty_source_is_error() {
        let mut extractor = EntityExtractor::new();

        let err = extractor.extract("empty.py", "   \n\t").unwrap_err();
        assert!(matches!(err, ParseError::EmptySource(_)));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let mut extractor = EntityExtractor::new();

        let err = extractor
            .extract("broken.py", "def broken(:\n    return (\n")
            .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_no_entities_is_not_an_error() {
        let mut extractor = EntityExtractor::new();

        let result = extractor.extract("consts.py", "VALUE = 42\nNAME = 'x'\n").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let mut extractor = EntityExtractor::new();

        let err = extractor.extract("notes.md", "# Title").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedLanguage(_)));
    }

    #[test]
    fn test_rust_impl_methods_are_qualified() {
        let mut extractor = EntityExtractor::new();

        let source = r#"
pub struct User {
    name: String,
}

impl User {
    fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

fn main() {}
"#;

        let result = extractor.extract("user.rs", source).unwrap();
        assert_eq!(names(&result.classes), vec!["User"]);
        assert!(names(&result.functions).contains(&"User.new"));
        assert!(names(&result.functions).contains(&"main"));
    }

    #[test]
    fn test_typescript_class_methods() {
        let mut extractor = EntityExtractor::new();

        let source = r#"
function greet(name: string): string {
    return `Hello, ${name}!`;
}

export class UserService {
    validate(user: User): boolean {
        return true;
    }
}

interface User {
    name: string;
}
"#;

        let result = extractor.extract("service.ts", source).unwrap();
        assert!(names(&result.functions).contains(&"greet"));
        assert!(names(&result.functions).contains(&"UserService.validate"));
        assert!(names(&result.classes).contains(&"UserService"));
        assert!(names(&result.classes).contains(&"User"));
    }

    #[test]
    fn test_go_methods_use_receiver() {
        let mut extractor = EntityExtractor::new();

        let source = r#"
package main

type Server struct {
    port int
}

func (s *Server) Start() error {
    return nil
}

func main() {}
"#;

        let result = extractor.extract("server.go", source).unwrap();
        assert_eq!(names(&result.classes), vec!["Server"]);
        assert!(names(&result.functions).contains(&"Server.Start"));
        assert!(names(&result.functions).contains(&"main"));
    }

    #[test]
    fn test_jsx_component_extracts() {
        let mut extractor = EntityExtractor::new();

        let source = r#"
function App() {
  return <div className="x">hi</div>;
}

class Header extends React.Component {
  render() {
    return <h1>{this.props.title}</h1>;
  }
}
"#;

        let result = extractor.extract("App.jsx", source).unwrap();
        assert!(names(&result.functions).contains(&"App"));
        assert!(names(&result.functions).contains(&"Header.render"));
        assert_eq!(names(&result.classes), vec!["Header"]);
    }

    #[test]
    fn test_plain_js_with_jsx_extracts() {
        let mut extractor = EntityExtractor::new();

        let source = "export default function App() {\n  return <main>ok</main>;\n}\n";
        let result = extractor.extract("App.js", source).unwrap();
        assert_eq!(names(&result.functions), vec!["App"]);
    }
}
