//! Source-tree facade over tree-sitter.
//!
//! `SourceTree` owns a source string and its parse tree and answers
//! structural questions: which types are declared, which methods a type
//! has, which type contains a given method. Rendering returns the exact
//! source text; mutation happens by byte-range splicing in
//! [`crate::replace`], which re-parses the spliced result.

use std::ops::Range;

use tree_sitter::{Node, Tree};

use crate::signature::{first_method_node, signature_from_node, wrap_in_holder, MethodSignature};
use crate::{CoreError, JavaParser, Result};

// ============================================================================
// Declarations
// ============================================================================

/// Kind of a type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
}

/// A class or interface declaration located in a [`SourceTree`]
#[derive(Debug, Clone)]
pub struct TypeDecl {
    /// Simple type name
    pub name: String,
    pub kind: TypeKind,
    /// Whether the declaration carries the `public` modifier
    pub is_public: bool,
    /// Byte range of the whole declaration
    pub range: Range<usize>,
}

/// A method declaration located in a [`SourceTree`]
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Parsed signature (name, return type, typed parameters, modifiers)
    pub signature: MethodSignature,
    /// Public either by modifier or implicitly as an interface member
    pub is_public: bool,
    /// Byte range of the whole declaration
    pub range: Range<usize>,
    /// Byte range of the body block; `None` for abstract declarations
    pub body_range: Option<Range<usize>>,
}

// ============================================================================
// SourceTree
// ============================================================================

/// An owned source file with its parse tree.
pub struct SourceTree {
    source: String,
    tree: Tree,
}

impl SourceTree {
    /// Parse source text into a tree.
    ///
    /// # Errors
    /// Returns `CoreError::Parse` when the text has syntax errors;
    /// tree-sitter tolerates them, but every downstream operation here
    /// requires a clean parse.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let mut parser = JavaParser::new()?;
        let tree = parser.parse(&source)?;
        if tree.root_node().has_error() {
            return Err(CoreError::Parse(
                "source contains syntax errors".to_string(),
            ));
        }
        Ok(Self { source, tree })
    }

    /// The source text backing this tree.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the tree back to text. The tree never drifts from its
    /// source (mutations splice and re-parse), so this is exact.
    pub fn render(&self) -> &str {
        &self.source
    }

    /// Slice the source at a declaration's byte range.
    pub fn text_of(&self, range: &Range<usize>) -> &str {
        &self.source[range.clone()]
    }

    /// Declared package name; empty for the default package.
    pub fn package_name(&self) -> String {
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.kind() != "package_declaration" {
                continue;
            }
            let mut inner = child.walk();
            for part in child.named_children(&mut inner) {
                if matches!(part.kind(), "identifier" | "scoped_identifier") {
                    if let Ok(text) = part.utf8_text(self.source.as_bytes()) {
                        return text.to_string();
                    }
                }
            }
        }
        String::new()
    }

    /// Top-level type declarations, in source order.
    pub fn types(&self) -> Vec<TypeDecl> {
        let root = self.tree.root_node();
        let mut cursor = root.walk();
        root.children(&mut cursor)
            .filter_map(|node| self.type_decl_from_node(node))
            .collect()
    }

    /// Every type declaration in the file (nested included), in source order.
    pub fn all_types(&self) -> Vec<TypeDecl> {
        self.type_nodes()
            .into_iter()
            .filter_map(|node| self.type_decl_from_node(node))
            .collect()
    }

    /// Methods declared directly in a type's body, in source order.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the declaration is no longer
    /// present (stale `TypeDecl` from another tree).
    pub fn methods_of(&self, ty: &TypeDecl) -> Result<Vec<MethodDecl>> {
        let node = self
            .type_nodes()
            .into_iter()
            .find(|n| n.byte_range() == ty.range)
            .ok_or_else(|| CoreError::NotFound(format!("type declaration {}", ty.name)))?;
        let body = node
            .child_by_field_name("body")
            .ok_or_else(|| CoreError::NotFound(format!("body of type {}", ty.name)))?;

        let mut methods = Vec::new();
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.kind() != "method_declaration" {
                continue;
            }
            let signature = signature_from_node(member, &self.source)?;
            // Interface members without an access modifier are public.
            let is_public = signature.modifiers.iter().any(|m| m == "public")
                || (ty.kind == TypeKind::Interface
                    && !signature
                        .modifiers
                        .iter()
                        .any(|m| m == "private" || m == "protected"));
            let body_range = member
                .child_by_field_name("body")
                .map(|b| b.byte_range());
            methods.push(MethodDecl {
                signature,
                is_public,
                range: member.byte_range(),
                body_range,
            });
        }
        Ok(methods)
    }

    /// First class or interface declaration (in source order) containing a
    /// method with the given simple name.
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` when no type declares such a method.
    pub fn type_with_method(&self, method_name: &str) -> Result<TypeDecl> {
        for ty in self.all_types() {
            let methods = self.methods_of(&ty)?;
            if methods.iter().any(|m| m.signature.name == method_name) {
                return Ok(ty);
            }
        }
        Err(CoreError::NotFound(format!(
            "no class declaring a method named {method_name}"
        )))
    }

    // ------------------------------------------------------------------
    // Node helpers
    // ------------------------------------------------------------------

    /// All class/interface declaration nodes, in source order.
    fn type_nodes(&self) -> Vec<Node<'_>> {
        let mut found = Vec::new();
        let mut stack = vec![self.tree.root_node()];
        while let Some(node) = stack.pop() {
            if matches!(node.kind(), "class_declaration" | "interface_declaration") {
                found.push(node);
            }
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                stack.push(child);
            }
        }
        found.sort_by_key(Node::start_byte);
        found
    }

    fn type_decl_from_node(&self, node: Node<'_>) -> Option<TypeDecl> {
        let kind = match node.kind() {
            "class_declaration" => TypeKind::Class,
            "interface_declaration" => TypeKind::Interface,
            _ => return None,
        };
        let name = node
            .child_by_field_name("name")?
            .utf8_text(self.source.as_bytes())
            .ok()?
            .to_string();
        let is_public = node
            .children(&mut node.walk())
            .find(|c| c.kind() == "modifiers")
            .map(|mods| {
                let mut cursor = mods.walk();
                let has_public = mods.children(&mut cursor).any(|m| m.kind() == "public");
                has_public
            })
            .unwrap_or(false);
        Some(TypeDecl {
            name,
            kind,
            is_public,
            range: node.byte_range(),
        })
    }
}

// ============================================================================
// Free-form parsing
// ============================================================================

/// Parse a free-form text blob and return the canonical text of the first
/// method declaration in it.
///
/// # Errors
/// Returns `CoreError::Parse` when the blob has syntax errors or contains
/// no method declaration.
pub fn parse_method(text: &str) -> Result<String> {
    let wrapped = wrap_in_holder(text);
    let mut parser = JavaParser::new()?;
    let tree = parser.parse(&wrapped)?;
    if tree.root_node().has_error() {
        return Err(CoreError::Parse(
            "method text contains syntax errors".to_string(),
        ));
    }
    let node = first_method_node(tree.root_node())
        .ok_or_else(|| CoreError::Parse("no method declaration found in text".to_string()))?;
    Ok(wrapped[node.byte_range()].to_string())
}

/// Parse a block statement (`{ ... }`) and return its canonical text.
///
/// # Errors
/// Returns `CoreError::Parse` when the text is not a valid block.
pub fn parse_block(text: &str) -> Result<String> {
    let wrapped = format!("class __AsheHolder {{\nvoid __ashe() {text}\n}}");
    let mut parser = JavaParser::new()?;
    let tree = parser.parse(&wrapped)?;
    if tree.root_node().has_error() {
        return Err(CoreError::Parse("text is not a valid block".to_string()));
    }
    let method = first_method_node(tree.root_node())
        .ok_or_else(|| CoreError::Parse("text is not a valid block".to_string()))?;
    let body = method
        .child_by_field_name("body")
        .ok_or_else(|| CoreError::Parse("text is not a valid block".to_string()))?;
    Ok(wrapped[body.byte_range()].to_string())
}

// ============================================================================
// Tests
// ============================================================================
