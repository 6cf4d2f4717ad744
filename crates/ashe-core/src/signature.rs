//! Method signatures parsed from free-form method text.
//!
//! A signature captures the shape of a declaration: modifiers, return
//! type, name, and the typed parameter list. Matching between signatures
//! follows override-equivalence (same name, arity, and in-order parameter
//! types) extended with a return-type comparison.

use tree_sitter::Node;

use crate::{CoreError, JavaParser, Result};

// ============================================================================
// Types
// ============================================================================

/// One declared parameter: type text plus the (identity-irrelevant) name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParam {
    /// Normalized type text (`Map<String, Integer>`, `int[]`, `String...`)
    pub ty: String,
    /// Parameter name as declared; never used for matching
    pub name: String,
}

/// Parsed shape of a method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Whether the declaration carried any modifier keywords
    pub has_modifiers: bool,
    /// Modifier keywords in declaration order (annotations excluded)
    pub modifiers: Vec<String>,
    /// Normalized return-type text; empty only for malformed input
    pub return_type: String,
    /// Simple method name
    pub name: String,
    /// Ordered parameter list
    pub params: Vec<MethodParam>,
}

impl MethodSignature {
    /// Parse the first method declaration found in a free-form text blob.
    ///
    /// The blob is parsed as the body of a synthetic holder class, so any
    /// text that is valid as a class member works here.
    ///
    /// # Errors
    /// Returns `CoreError::Parse` when the text has syntax errors or
    /// contains no method declaration.
    pub fn parse(method_text: &str) -> Result<Self> {
        let wrapped = wrap_in_holder(method_text);
        let mut parser = JavaParser::new()?;
        let tree = parser.parse(&wrapped)?;
        if tree.root_node().has_error() {
            return Err(CoreError::Parse(
                "method text contains syntax errors".to_string(),
            ));
        }
        let node = first_method_node(tree.root_node()).ok_or_else(|| {
            CoreError::Parse("no method declaration found in text".to_string())
        })?;
        signature_from_node(node, &wrapped)
    }

    /// Override-equivalent match, extended with a return-type check.
    ///
    /// Two signatures match when the simple names are equal, the parameter
    /// counts are equal, the parameter types are equal in order, and the
    /// return types are equal. The return-type comparison goes beyond the
    /// language's override-equivalence rule on purpose: it tells apart
    /// regenerated methods that differ only in return type.
    ///
    /// The parameter lists are vectors, so a parameterless method can only
    /// match another parameterless method; there is no way for an empty
    /// string to collide with a one-element list.
    pub fn override_equivalent(&self, other: &Self) -> bool {
        self.name == other.name
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.ty == b.ty)
            && self.return_type == other.return_type
    }
}

// ============================================================================
// Node Extraction
// ============================================================================

/// Wrap a member-level blob so the Java grammar accepts it.
pub(crate) fn wrap_in_holder(text: &str) -> String {
    format!("class __AsheHolder {{\n{text}\n}}")
}

/// First `method_declaration` node anywhere under `root`, in source order.
pub(crate) fn first_method_node(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    let mut found: Option<Node<'_>> = None;
    while let Some(node) = stack.pop() {
        if node.kind() == "method_declaration" {
            match found {
                Some(prev) if prev.start_byte() <= node.start_byte() => {}
                _ => found = Some(node),
            }
            continue;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    found
}

/// Build a [`MethodSignature`] from a `method_declaration` node.
pub(crate) fn signature_from_node(node: Node<'_>, source: &str) -> Result<MethodSignature> {
    let bytes = source.as_bytes();

    let mut modifiers = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "modifiers" {
            continue;
        }
        let mut inner = child.walk();
        for keyword in child.children(&mut inner) {
            match keyword.kind() {
                "marker_annotation" | "annotation" => {}
                _ => modifiers.push(keyword.utf8_text(bytes)?.to_string()),
            }
        }
    }

    let return_type = match node.child_by_field_name("type") {
        Some(ty) => normalize_type(ty.utf8_text(bytes)?),
        None => String::new(),
    };

    let name = node
        .child_by_field_name("name")
        .ok_or_else(|| CoreError::Parse("method declaration without a name".to_string()))?
        .utf8_text(bytes)?
        .to_string();

    let params = match node.child_by_field_name("parameters") {
        Some(list) => params_from_node(list, source)?,
        None => Vec::new(),
    };

    Ok(MethodSignature {
        has_modifiers: !modifiers.is_empty(),
        modifiers,
        return_type,
        name,
        params,
    })
}

/// Extract the typed parameter list from a `formal_parameters` node.
fn params_from_node(list: Node<'_>, source: &str) -> Result<Vec<MethodParam>> {
    let bytes = source.as_bytes();
    let mut params = Vec::new();
    let mut cursor = list.walk();
    for child in list.named_children(&mut cursor) {
        match child.kind() {
            "formal_parameter" => {
                let mut ty = match child.child_by_field_name("type") {
                    Some(ty) => ty.utf8_text(bytes)?.to_string(),
                    None => continue,
                };
                // C-style trailing dimensions (`int a[]`) belong to the type.
                if let Some(dims) = child.child_by_field_name("dimensions") {
                    ty.push_str(dims.utf8_text(bytes)?);
                }
                let name = match child.child_by_field_name("name") {
                    Some(name) => name.utf8_text(bytes)?.to_string(),
                    None => String::new(),
                };
                params.push(MethodParam {
                    ty: normalize_type(&ty),
                    name,
                });
            }
            "spread_parameter" => {
                // `String... args`: the element type plus a tight `...`.
                let mut ty = String::new();
                let mut name = String::new();
                let mut parts = child.walk();
                for part in child.children(&mut parts) {
                    match part.kind() {
                        "modifiers" | "..." => {}
                        "variable_declarator" => {
                            if let Some(n) = part.child_by_field_name("name") {
                                name = n.utf8_text(bytes)?.to_string();
                            }
                        }
                        _ if ty.is_empty() => {
                            ty = part.utf8_text(bytes)?.to_string();
                        }
                        _ => {}
                    }
                }
                ty.push_str("...");
                params.push(MethodParam {
                    ty: normalize_type(&ty),
                    name,
                });
            }
            _ => {}
        }
    }
    Ok(params)
}

/// Canonical form for type text: whitespace runs collapse to one space,
/// commas are followed by exactly one space, and brackets bind tightly.
pub(crate) fn normalize_type(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            let tight = matches!(c, '<' | '>' | ',' | '[' | ']' | '.')
                || matches!(out.chars().last(), Some('<' | ',' | ' ') | None);
            if !tight {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(c);
        if c == ',' {
            out.push(' ');
        }
    }
    out
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
    fn test_parse_plain_method() {
        let sig = MethodSignature::parse("public int bar(int a, String b) { return a; }").unwrap();
        assert!(sig.has_modifiers);
        assert_eq!(sig.modifiers, vec!["public"]);
        assert_eq!(sig.return_type, "int");
        assert_eq!(sig.name, "bar");
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.params[0].ty, "int");
        assert_eq!(sig.params[0].name, "a");
        assert_eq!(sig.params[1].ty, "String");
    }

    #[test]
    fn test_parse_without_modifiers() {
        let sig = MethodSignature::parse("void run() {}").unwrap();
        assert!(!sig.has_modifiers);
        assert!(sig.modifiers.is_empty());
        assert_eq!(sig.return_type, "void");
        assert!(sig.params.is_empty());
    }

    #[test]
    fn test_parse_generic_param_types() {
        let sig =
            MethodSignature::parse("Map<String,Integer> get(Map<String , List<Integer>> m) {}")
                .unwrap();
        assert_eq!(sig.return_type, "Map<String, Integer>");
        assert_eq!(sig.params[0].ty, "Map<String, List<Integer>>");
    }

    #[test]
    fn test_parse_annotations_excluded_from_modifiers() {
        let sig =
            MethodSignature::parse("@Override public final void go() {}").unwrap();
        assert_eq!(sig.modifiers, vec!["public", "final"]);
    }

    #[test]
    fn test_parse_varargs() {
        let sig = MethodSignature::parse("static void log(String... parts) {}").unwrap();
        assert_eq!(sig.params[0].ty, "String...");
        assert_eq!(sig.params[0].name, "parts");
    }

    #[test]
    fn test_parse_rejects_non_method() {
        assert!(MethodSignature::parse("int field = 3;").is_err());
        assert!(MethodSignature::parse("public int bar(int a {").is_err());
    }

    #[test]
    fn test_match_same_shape() {
        let a = MethodSignature::parse("public int bar(int a) { return a; }").unwrap();
        let b = MethodSignature::parse("private int bar(int other) { return 0; }").unwrap();
        // Modifiers and parameter names are not part of identity.
        assert!(a.override_equivalent(&b));
    }

    #[test]
    fn test_match_rejects_return_type_difference() {
        let a = MethodSignature::parse("int bar(int a) { return a; }").unwrap();
        let b = MethodSignature::parse("long bar(int a) { return a; }").unwrap();
        assert!(!a.override_equivalent(&b));
    }

    #[test]
    fn test_match_zero_params_only_matches_zero() {
        let none = MethodSignature::parse("void bar() {}").unwrap();
        let one = MethodSignature::parse("void bar(String s) {}").unwrap();
        assert!(!none.override_equivalent(&one));
        assert!(none.override_equivalent(&none.clone()));
    }

    #[test]
    fn test_match_order_sensitive() {
        let a = MethodSignature::parse("void bar(int a, String b) {}").unwrap();
        let b = MethodSignature::parse("void bar(String b, int a) {}").unwrap();
        assert!(!a.override_equivalent(&b));
    }

    proptest! {
        /// Matching is symmetric for arbitrary signature pairs.
        #[test]
        fn prop_match_symmetry(
            name_a in "[a-z]{1,6}", name_b in "[a-z]{1,6}",
            ret_a in "(int|long|void|String)", ret_b in "(int|long|void|String)",
            tys_a in prop::collection::vec("(int|byte|String|Map<K, V>)", 0..3),
            tys_b in prop::collection::vec("(int|byte|String|Map<K, V>)", 0..3),
        ) {
            let make = |name: &str, ret: &str, tys: &[String]| MethodSignature {
                has_modifiers: false,
                modifiers: Vec::new(),
                return_type: ret.to_string(),
                name: name.to_string(),
                params: tys
                    .iter()
                    .enumerate()
                    .map(|(i, ty)| MethodParam { ty: ty.clone(), name: format!("p{i}") })
                    .collect(),
            };
            let a = make(&name_a, &ret_a, &tys_a);
            let b = make(&name_b, &ret_b, &tys_b);
            prop_assert_eq!(a.override_equivalent(&b), b.override_equivalent(&a));
        }
    }
}
