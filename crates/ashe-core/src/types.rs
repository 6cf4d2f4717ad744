//! Core type definitions for ashe-core.
//!
//! All library functions return `Result<T, CoreError>`; no panics in
//! library code (enforced by clippy lints).

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for source-analysis operations
#[derive(Debug, Error)]
pub enum CoreError {
    /// The Java parser rejected the input text
    #[error("failed to parse Java source: {0}")]
    Parse(String),

    /// The Java grammar failed to load into the tree-sitter runtime
    #[error("tree-sitter language error: {0}")]
    TreeSitter(#[from] tree_sitter::LanguageError),

    /// A canonical method reference did not match the expected grammar
    #[error("invalid method reference: {0}")]
    InvalidReference(String),

    /// A requested class or method is not present in the source
    #[error("not found: {0}")]
    NotFound(String),

    /// A node byte range did not fall on UTF-8 boundaries
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Result type alias used throughout the library
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================================================
// Parser
// ============================================================================

/// Wrapper around a tree-sitter parser bound to the Java grammar.
///
/// The grammar is the newest stable `tree-sitter-java` release, which
/// covers current-generation Java syntax (records, sealed types, switch
/// expressions). Parsing is purely syntactic; no name resolution or type
/// checking happens here.
pub struct JavaParser {
    inner: tree_sitter::Parser,
}

impl JavaParser {
    /// Create a parser for Java source.
    ///
    /// # Errors
    /// Returns `CoreError::TreeSitter` if the grammar fails to load.
    pub fn new() -> Result<Self> {
        let mut inner = tree_sitter::Parser::new();
        inner.set_language(&tree_sitter_java::LANGUAGE.into())?;
        Ok(Self { inner })
    }

    /// Parse source text into a tree-sitter tree.
    ///
    /// tree-sitter is error-tolerant, so syntactically broken input still
    /// yields a tree; callers that need a clean parse check
    /// `root_node().has_error()` (see [`crate::SourceTree::parse`]).
    ///
    /// # Errors
    /// Returns `CoreError::Parse` if the parser produces no tree at all.
    pub fn parse(&mut self, source: &str) -> Result<tree_sitter::Tree> {
        self.inner
            .parse(source, None)
            .ok_or_else(|| CoreError::Parse("parser produced no tree".to_string()))
    }
}

// ============================================================================
// Type Tests
// ============================================================================
