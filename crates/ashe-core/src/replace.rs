//! Locate-and-substitute method replacement.
//!
//! Replacement is a single byte-range splice: everything outside the
//! matched method declaration is copied through untouched, which is what
//! guarantees locality (no other method, class, or comment changes).

use crate::ast::{parse_method, SourceTree};
use crate::signature::MethodSignature;
use crate::Result;

/// Replace at most one method in the named class.
///
/// The replacement's signature is parsed from `new_method` and matched
/// against the class's methods with
/// [`MethodSignature::override_equivalent`]; the first match in source
/// order is replaced wholesale (signature and body). Returns `Ok(None)`
/// when the class is missing or no method matches — the input is then
/// left untouched by the caller.
///
/// # Errors
/// Returns `CoreError::Parse` when either the source or the replacement
/// text does not parse.
pub fn replace_method_in_source(
    source: &str,
    class_name: &str,
    new_method: &str,
) -> Result<Option<String>> {
    let new_text = parse_method(new_method)?;
    let new_sig = MethodSignature::parse(new_method)?;

    let tree = SourceTree::parse(source)?;
    let Some(ty) = tree.all_types().into_iter().find(|t| t.name == class_name) else {
        return Ok(None);
    };

    let methods = tree.methods_of(&ty)?;
    let Some(target) = methods
        .iter()
        .find(|m| m.signature.override_equivalent(&new_sig))
    else {
        return Ok(None);
    };

    let mut out = String::with_capacity(source.len() + new_text.len());
    out.push_str(&source[..target.range.start]);
    out.push_str(&new_text);
    out.push_str(&source[target.range.end..]);
    Ok(Some(out))
}

/// Carry one method from a checked (cleaned) source into a target source.
///
/// Finds the first class in `checked_source` declaring `method_name`,
/// takes the first such method's full text, and substitutes the
/// override-equivalent method in the same-named class of `target_source`.
/// Returns `Ok(None)` when the method or its class cannot be found on
/// either side.
///
/// # Errors
/// Returns `CoreError::Parse` when either source does not parse.
pub fn carry_method(
    checked_source: &str,
    target_source: &str,
    method_name: &str,
) -> Result<Option<String>> {
    let checked = SourceTree::parse(checked_source)?;
    let ty = match checked.type_with_method(method_name) {
        Ok(ty) => ty,
        Err(crate::CoreError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    let methods = checked.methods_of(&ty)?;
    let Some(method) = methods.iter().find(|m| m.signature.name == method_name) else {
        return Ok(None);
    };
    let method_text = checked.text_of(&method.range).to_string();
    replace_method_in_source(target_source, &ty.name, &method_text)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Unwrapping is acceptable in tests
mod tests {
    use super::*;

    const SOURCE: &str = r#"package c;

public class Foo {
    public int bar(int a) {
        return a / 0;
    }

    public int bar(long a) {
        return 1;
    }

    private void untouched() {}
}

class Other {
    public int bar(int a) {
        return 7;
    }
}
"#;

    #[test]
    fn test_replace_matching_overload_only() {
        let out = replace_method_in_source(
            SOURCE,
            "Foo",
            "public int bar(int x) {\n        return 0;\n    }",
        )
        .unwrap()
        .unwrap();

        // The int overload was replaced; parameter name differences don't matter.
        assert!(out.contains("return 0;"));
        assert!(!out.contains("return a / 0;"));
        // The long overload and the private method are byte-identical.
        assert!(out.contains("public int bar(long a) {\n        return 1;\n    }"));
        assert!(out.contains("private void untouched() {}"));
        // The same-signature method in the other class is untouched.
        assert!(out.contains("return 7;"));
    }

    #[test]
    fn test_replace_locality_outside_target() {
        let replacement = "public int bar(int x) { return 0; }";
        let out = replace_method_in_source(SOURCE, "Foo", replacement)
            .unwrap()
            .unwrap();

        // Everything before and after the replaced range is copied through.
        let start = SOURCE.find("public int bar(int a)").unwrap();
        assert_eq!(&out[..start], &SOURCE[..start]);
        let tail = "class Other";
        assert_eq!(
            out[out.find(tail).unwrap()..],
            SOURCE[SOURCE.find(tail).unwrap()..]
        );
    }

    #[test]
    fn test_replace_no_match_returns_none() {
        // Different return type: the extended matching rule rejects it.
        let out =
            replace_method_in_source(SOURCE, "Foo", "public long bar(int a) { return 0; }")
                .unwrap();
        assert!(out.is_none());

        // Unknown class.
        let out =
            replace_method_in_source(SOURCE, "Missing", "public int bar(int a) { return 0; }")
                .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_replace_zero_param_never_matches_nonzero() {
        let out = replace_method_in_source(SOURCE, "Foo", "public int bar() { return 0; }")
            .unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_replace_rejects_broken_patch() {
        assert!(replace_method_in_source(SOURCE, "Foo", "public int bar(int a {").is_err());
    }

    #[test]
    fn test_replaced_output_reparses() {
        let out = replace_method_in_source(SOURCE, "Foo", "public int bar(int a) { return 2; }")
            .unwrap()
            .unwrap();
        let tree = SourceTree::parse(out).unwrap();
        assert_eq!(tree.types().len(), 2);
    }

    #[test]
    fn test_carry_method_between_sources() {
        let checked = r#"package c;

public class Foo {
    public int bar(int a) {
        return Math.max(a, 0);
    }
}
"#;
        let out = carry_method(checked, SOURCE, "bar").unwrap().unwrap();
        assert!(out.contains("return Math.max(a, 0);"));
        assert!(!out.contains("return a / 0;"));
        // Untouched siblings survive.
        assert!(out.contains("return 1;"));
        assert!(out.contains("return 7;"));
    }

    #[test]
    fn test_carry_method_missing_method() {
        let checked = "public class Foo { void nothing() {} }";
        assert!(carry_method(checked, SOURCE, "absent").unwrap().is_none());
    }
}
