//! ASHE Core - Source analysis for the method-refinement pipeline
//!
//! # Overview
//!
//! `ashe-core` answers the structural questions the refinement pipeline
//! asks about Java source: what a file declares, what a method's
//! signature is, which class owns a method, and how to substitute one
//! method for another. It also owns the canonical method-reference
//! grammar (`pkg.Class#name(Type, Type)`) and the extraction of usable
//! patches from LLM replies.
//!
//! # Architecture
//!
//! **This is a LIBRARY with NO I/O.**
//! - Accepts `&str` (source code), not file paths
//! - Returns `Result<T, CoreError>`, never panics
//! - Mutation is locate-and-substitute: a single byte-range splice
//!   followed by a re-parse, so everything outside the target is
//!   byte-identical
//!
//! The CLI crate handles file reads, atomic write-back, and subprocesses.
//!
//! # Example
//!
//! ```no_run
//! use ashe_core::{replace_method_in_source, MethodReference};
//!
//! let reference = MethodReference::parse("com.example.Foo#bar(int)")?;
//! let patched = replace_method_in_source(
//!     "public class Foo { public int bar(int a) { return a / 0; } }",
//!     &reference.class_name,
//!     "public int bar(int a) { return a; }",
//! )?;
//! assert!(patched.is_some());
//! # Ok::<(), ashe_core::CoreError>(())
//! ```

pub use ast::{parse_block, parse_method, MethodDecl, SourceTree, TypeDecl, TypeKind};
pub use extract::{extract_code_block, strip_comments};
pub use reference::{
    is_valid_reference, is_valid_source_path, normalize, parse_method_name,
    split_top_level_params, MethodReference,
};
pub use replace::{carry_method, replace_method_in_source};
pub use signature::{MethodParam, MethodSignature};
pub use types::{CoreError, JavaParser, Result};

mod ast;
mod extract;
mod reference;
mod replace;
mod signature;
mod types;

/// Get library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
