//! Canonical method references.
//!
//! A reference has the form `pkg.Class#name(Type1, Type2)`. The parameter
//! list is part of the identity and is always present; a parameterless
//! method is written `pkg.Class#name()`. Parameter types may carry generic
//! arguments (`Map<String, List<Integer>>`), so splitting is depth-aware
//! on angle brackets rather than a plain comma split.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::{CoreError, Result};

/// Repository-relative source path: `([A-Za-z_0-9]+/)*[A-Za-z_0-9]+.java`
#[allow(clippy::unwrap_used)] // pattern is a literal, cannot fail
static SOURCE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_0-9]+/)*[A-Za-z_0-9]+\.java$").unwrap());

/// Canonical reference: `[A-Za-z_0-9]+(\.[A-Za-z_0-9]+)*#[A-Za-z_0-9]+\([^)]*\)`
#[allow(clippy::unwrap_used)] // pattern is a literal, cannot fail
static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_0-9]+(\.[A-Za-z_0-9]+)*#[A-Za-z_0-9]+\([^)]*\)$").unwrap()
});

// ============================================================================
// MethodReference
// ============================================================================

/// Identity of one target method.
///
/// Identity is defined by package, class, method name, and the ordered
/// parameter *types*. Parameter names are never part of identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodReference {
    /// Dotted package path; empty for the default package
    pub package: String,
    /// Simple class name
    pub class_name: String,
    /// Simple method name
    pub method_name: String,
    /// Ordered parameter type names, generics included
    pub param_types: Vec<String>,
}

impl MethodReference {
    /// Parse a canonical reference string.
    ///
    /// # Errors
    /// Returns `CoreError::InvalidReference` when the `#`/`(`/`)` structure
    /// is missing or the qualifier has no class segment.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        let (qualifier, rest) = reference
            .split_once('#')
            .ok_or_else(|| CoreError::InvalidReference(reference.to_string()))?;
        let (method_name, params) = rest
            .split_once('(')
            .ok_or_else(|| CoreError::InvalidReference(reference.to_string()))?;
        let params = params
            .strip_suffix(')')
            .ok_or_else(|| CoreError::InvalidReference(reference.to_string()))?;

        if qualifier.is_empty() || method_name.is_empty() {
            return Err(CoreError::InvalidReference(reference.to_string()));
        }

        let (package, class_name) = match qualifier.rsplit_once('.') {
            Some((pkg, class)) => (pkg.to_string(), class.to_string()),
            None => (String::new(), qualifier.to_string()),
        };
        if class_name.is_empty() {
            return Err(CoreError::InvalidReference(reference.to_string()));
        }

        Ok(Self {
            package,
            class_name,
            method_name: method_name.to_string(),
            param_types: split_top_level_params(params),
        })
    }

    /// Qualified class name (`pkg.Class`, or `Class` in the default package).
    pub fn qualified_class(&self) -> String {
        if self.package.is_empty() {
            self.class_name.clone()
        } else {
            format!("{}.{}", self.package, self.class_name)
        }
    }
}

impl fmt::Display for MethodReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}({})",
            self.qualified_class(),
            self.method_name,
            self.param_types.join(", ")
        )
    }
}

// ============================================================================
// Free Functions
// ============================================================================

/// Extract the method-name substring between `#` and the first `(`.
///
/// # Errors
/// Returns `CoreError::InvalidReference` if either delimiter is missing.
pub fn parse_method_name(reference: &str) -> Result<&str> {
    let rest = reference
        .split_once('#')
        .map(|(_, rest)| rest)
        .ok_or_else(|| CoreError::InvalidReference(reference.to_string()))?;
    rest.split_once('(')
        .map(|(name, _)| name)
        .ok_or_else(|| CoreError::InvalidReference(reference.to_string()))
}

/// Insert a single space after every comma not already followed by
/// whitespace. Idempotent.
pub fn normalize(reference: &str) -> String {
    let mut out = String::with_capacity(reference.len() + 8);
    let mut chars = reference.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == ',' {
            match chars.peek() {
                Some(next) if !next.is_whitespace() => out.push(' '),
                _ => {}
            }
        }
    }
    out
}

/// Validate a repository-relative source path.
pub fn is_valid_source_path(path: &str) -> bool {
    SOURCE_PATH_RE.is_match(path)
}

/// Validate a canonical method reference string.
pub fn is_valid_reference(reference: &str) -> bool {
    REFERENCE_RE.is_match(reference)
}

/// Split a parameter-list string on top-level commas only.
///
/// A comma inside matching angle brackets never delimits, so
/// `Map<String, Integer>, int` yields exactly two terms. An empty or
/// blank input yields no terms (the zero-parameter case must not produce
/// a single empty term).
pub fn split_top_level_params(params: &str) -> Vec<String> {
    if params.trim().is_empty() {
        return Vec::new();
    }

    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();

    for c in params.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                terms.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    terms.push(current.trim().to_string());
    terms
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Unwrapping is acceptable in tests
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_simple_reference() {
        let r = MethodReference::parse("com.example.Foo#bar(int, String)").unwrap();
        assert_eq!(r.package, "com.example");
        assert_eq!(r.class_name, "Foo");
        assert_eq!(r.method_name, "bar");
        assert_eq!(r.param_types, vec!["int", "String"]);
    }

    #[test]
    fn test_parse_parameterless() {
        let r = MethodReference::parse("c.Foo#bar()").unwrap();
        assert!(r.param_types.is_empty());
        assert_eq!(r.to_string(), "c.Foo#bar()");
    }

    #[test]
    fn test_parse_default_package() {
        let r = MethodReference::parse("Foo#bar(long)").unwrap();
        assert_eq!(r.package, "");
        assert_eq!(r.qualified_class(), "Foo");
    }

    #[test]
    fn test_parse_generic_params() {
        let r = MethodReference::parse("p.C#m(Map<String, Integer>, List<int[]>)").unwrap();
        assert_eq!(r.param_types, vec!["Map<String, Integer>", "List<int[]>"]);
    }

    #[test]
    fn test_parse_missing_hash_fails() {
        assert!(MethodReference::parse("c.Foo.bar()").is_err());
        assert!(matches!(
            MethodReference::parse("c.Foo.bar()"),
            Err(CoreError::InvalidReference(_))
        ));
    }

    #[test]
    fn test_parse_method_name_substring() {
        assert_eq!(parse_method_name("c.Foo#bar(int)").unwrap(), "bar");
        assert!(parse_method_name("c.Foo.bar(int)").is_err());
        assert!(parse_method_name("c.Foo#bar").is_err());
    }

    #[test]
    fn test_normalize_inserts_spaces() {
        assert_eq!(normalize("m(int,long,String)"), "m(int, long, String)");
        assert_eq!(normalize("m(int, long)"), "m(int, long)");
        assert_eq!(normalize("a,\tb"), "a,\tb");
    }

    #[test]
    fn test_normalize_trailing_comma() {
        assert_eq!(normalize("a,"), "a,");
    }

    #[test]
    fn test_validators() {
        assert!(is_valid_source_path("src/com/example/Foo.java"));
        assert!(is_valid_source_path("Foo.java"));
        assert!(!is_valid_source_path("/abs/Foo.java"));
        assert!(!is_valid_source_path("Foo.txt"));

        assert!(is_valid_reference("com.example.Foo#bar(int, String)"));
        assert!(is_valid_reference("Foo#bar()"));
        assert!(!is_valid_reference("com.example.Foo.bar()"));
        assert!(!is_valid_reference("Foo#bar"));
    }

    #[test]
    fn test_split_zero_params() {
        assert!(split_top_level_params("").is_empty());
        assert!(split_top_level_params("   ").is_empty());
    }

    #[test]
    fn test_split_nested_generics() {
        assert_eq!(
            split_top_level_params("Map<String, List<Integer>>, int"),
            vec!["Map<String, List<Integer>>", "int"]
        );
        assert_eq!(
            split_top_level_params("Function<Map<A, B>, C>"),
            vec!["Function<Map<A, B>, C>"]
        );
    }

    // ------------------------------------------------------------------
    // Property tests
    // ------------------------------------------------------------------

    /// Strategy producing a balanced type term with optional generic nesting.
    fn type_term(depth: u32) -> BoxedStrategy<String> {
        let ident = "[A-Z][a-z]{1,6}";
        if depth == 0 {
            ident.prop_map(|s| s).boxed()
        } else {
            let inner = prop::collection::vec(type_term(depth - 1), 1..3)
                .prop_map(|args| args.join(", "));
            (ident.prop_map(|s| s), prop::option::of(inner))
                .prop_map(|(name, args)| match args {
                    Some(args) => format!("{name}<{args}>"),
                    None => name,
                })
                .boxed()
        }
    }

    proptest! {
        /// Splitting the joined terms returns exactly the terms, in order.
        #[test]
        fn prop_split_roundtrip(terms in prop::collection::vec(type_term(2), 0..5)) {
            let joined = terms.join(", ");
            prop_assert_eq!(split_top_level_params(&joined), terms);
        }

        /// `normalize` is idempotent on arbitrary strings.
        #[test]
        fn prop_normalize_idempotent(s in ".{0,80}") {
            let once = normalize(&s);
            prop_assert_eq!(normalize(&once), once);
        }

        /// Round-trip: formatting then re-parsing preserves the name, and
        /// normalize is a fixpoint on the canonical form.
        #[test]
        fn prop_reference_roundtrip(
            pkg in "[a-z]{1,5}(\\.[a-z]{1,5}){0,2}",
            class in "[A-Z][a-z]{1,6}",
            method in "[a-z]{1,8}",
            params in prop::collection::vec(type_term(1), 0..4),
        ) {
            let formatted = format!("{pkg}.{class}#{method}({})", params.join(", "));
            let parsed = MethodReference::parse(&formatted).unwrap();
            prop_assert_eq!(parse_method_name(&formatted).unwrap(), parsed.method_name.as_str());
            prop_assert_eq!(&normalize(&formatted), &formatted);
            prop_assert_eq!(parsed.to_string(), formatted);
        }
    }
}
