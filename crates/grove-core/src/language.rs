//! Supported languages and the node kinds that matter for each of them.

use crate::entity::EntityKind;
use std::path::Path;
use tree_sitter::{Language, Node};

/// A language Grove can extract entities from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedLanguage {
    Python,
    Rust,
    TypeScript,
    Tsx,
    JavaScript,
    Go,
    Java,
}

/// Every supported extension, in a stable order.
pub const SOURCE_EXTENSIONS: &[&str] = &["py", "rs", "ts", "tsx", "js", "jsx", "go", "java"];

impl SupportedLanguage {
    /// Detects the language from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" => Some(Self::Python),
            "rs" => Some(Self::Rust),
            "ts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "go" => Some(Self::Go),
            "java" => Some(Self::Java),
            _ => None,
        }
    }

    /// Detects the language from a path or file name.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// The tree-sitter grammar. JavaScript goes through the TSX grammar so
    /// that JSX elements parse.
    pub fn grammar(&self) -> Language {
        match self {
            Self::Python => tree_sitter_python::language(),
            Self::Rust => tree_sitter_rust::language(),
            Self::TypeScript => tree_sitter_typescript::language_typescript(),
            Self::Tsx | Self::JavaScript => tree_sitter_typescript::language_tsx(),
            Self::Go => tree_sitter_go::language(),
            Self::Java => tree_sitter_java::language(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Rust => "rust",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
            Self::Go => "go",
            Self::Java => "java",
        }
    }

    /// Node kinds that define a function or method.
    fn function_kinds(&self) -> &'static [&'static str] {
        match self {
            Self::Python => &["function_definition"],
            Self::Rust => &["function_item"],
            Self::TypeScript | Self::Tsx | Self::JavaScript => &[
                "function_declaration",
                "generator_function_declaration",
                "method_definition",
            ],
            Self::Go => &["function_declaration", "method_declaration"],
            Self::Java => &["method_declaration", "constructor_declaration"],
        }
    }

    /// Node kinds that define a class-like type.
    fn class_kinds(&self) -> &'static [&'static str] {
        match self {
            Self::Python => &["class_definition"],
            Self::Rust => &["struct_item", "enum_item", "trait_item"],
            Self::TypeScript | Self::Tsx | Self::JavaScript => &[
                "class_declaration",
                "abstract_class_declaration",
                "interface_declaration",
            ],
            Self::Go => &["type_spec"],
            Self::Java => &[
                "class_declaration",
                "interface_declaration",
                "enum_declaration",
                "record_declaration",
            ],
        }
    }

    /// Classifies a syntax node as an entity definition, if it is one.
    pub fn classify(&self, node: &Node) -> Option<EntityKind> {
        let kind = node.kind();
        if self.function_kinds().contains(&kind) {
            return Some(EntityKind::Function);
        }
        if self.class_kinds().contains(&kind) {
            // Go type specs are only class-like for structs and interfaces.
            if *self == Self::Go {
                let ty = node.child_by_field_name("type")?;
                return matches!(ty.kind(), "struct_type" | "interface_type")
                    .then_some(EntityKind::Class);
            }
            return Some(EntityKind::Class);
        }
        None
    }

    /// The declared name of a definition node.
    pub fn definition_name(&self, node: &Node, source: &str) -> Option<String> {
        let name = node.child_by_field_name("name")?;
        name.utf8_text(source.as_bytes()).ok().map(str::to_string)
    }

    /// The class scope a node opens for the definitions nested inside it.
    ///
    /// Class-like definitions open a scope named after themselves; Rust
    /// `impl` blocks open one named after the implemented type.
    pub fn scope_name(&self, node: &Node, source: &str) -> Option<String> {
        if *self == Self::Rust && node.kind() == "impl_item" {
            let ty = node.child_by_field_name("type")?;
            let text = ty.utf8_text(source.as_bytes()).ok()?;
            return Some(strip_generics(text).to_string());
        }
        match self.classify(node) {
            Some(EntityKind::Class) => self.definition_name(node, source),
            _ => None,
        }
    }

    /// The owner of a Go method, taken from its receiver type.
    pub fn receiver_owner(&self, node: &Node, source: &str) -> Option<String> {
        if *self != Self::Go || node.kind() != "method_declaration" {
            return None;
        }
        let receiver = node.child_by_field_name("receiver")?;
        let ident = find_descendant(&receiver, "type_identifier")?;
        ident.utf8_text(source.as_bytes()).ok().map(str::to_string)
    }
}

/// True when a label looks like a source file name Grove understands.
pub fn is_source_file_label(label: &str) -> bool {
    SupportedLanguage::from_path(label).is_some()
}

fn strip_generics(text: &str) -> &str {
    text.split('<').next().unwrap_or(text).trim()
}

fn find_descendant<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    if node.kind() == kind {
        return Some(*node);
    }
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            if let Some(found) = find_descendant(&child, kind) {
                return Some(found);
            }
        }
    }
    None
}
