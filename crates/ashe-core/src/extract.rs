//! Fenced-code extraction from LLM replies.
//!
//! A usable patch is the interior of the first triple-backtick fence that
//! carries a language tag. Comments are stripped from the extracted code
//! so that commentary the model leaves inside the patch cannot drift into
//! the refined source.

use std::sync::LazyLock;

use regex::Regex;

/// ```` ```lang\n ... ``` ```` — first fence with a language tag
#[allow(clippy::unwrap_used)] // pattern is a literal, cannot fail
static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]+[ \t]*\r?\n(.*?)```").unwrap());

/// Extract the first tagged fenced code block from a reply, trimmed and
/// with comments removed. Returns the empty string when no such block
/// exists — callers treat that as "no usable patch".
pub fn extract_code_block(reply: &str) -> String {
    match CODE_FENCE_RE.captures(reply) {
        Some(caps) => strip_comments(&caps[1]).trim().to_string(),
        None => String::new(),
    }
}

/// Remove `// ...` line comments and `/* ... */` block comments (across
/// lines). String and character literals are respected, so a `//` inside
/// a string stays put. Line comments keep their terminating newline.
pub fn strip_comments(code: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        LineComment,
        BlockComment,
        Str,
        Chr,
    }

    let mut out = String::with_capacity(code.len());
    let mut state = State::Code;
    let mut chars = code.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Code => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::BlockComment;
                }
                '"' => {
                    out.push(c);
                    state = State::Str;
                }
                '\'' => {
                    out.push(c);
                    state = State::Chr;
                }
                _ => out.push(c),
            },
            State::LineComment => {
                if c == '\n' {
                    out.push(c);
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Code;
                }
            }
            State::Str => {
                out.push(c);
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    }
                    '"' => state = State::Code,
                    _ => {}
                }
            }
            State::Chr => {
                out.push(c);
                match c {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    }
                    '\'' => state = State::Code,
                    _ => {}
                }
            }
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

    #[test]
    fn test_extract_tagged_fence() {
        let reply = "Here is the fix:\n```java\npublic int bar(){return 0;}\n```\nDone.";
        assert_eq!(extract_code_block(reply), "public int bar(){return 0;}");
    }

    #[test]
    fn test_extract_first_of_many() {
        let reply = "```java\nfirst();\n```\n```java\nsecond();\n```";
        assert_eq!(extract_code_block(reply), "first();");
    }

    #[test]
    fn test_extract_requires_language_tag() {
        let reply = "```\nnot tagged\n```";
        assert_eq!(extract_code_block(reply), "");
    }

    #[test]
    fn test_extract_plain_text_is_empty() {
        assert_eq!(extract_code_block("no code here at all"), "");
    }

    #[test]
    fn test_strip_line_comments_keep_newline() {
        let code = "int a = 1; // set a\nint b = 2;";
        assert_eq!(strip_comments(code), "int a = 1; \nint b = 2;");
    }

    #[test]
    fn test_strip_block_comment_across_lines() {
        let code = "int a;/* one\ntwo\nthree */int b;";
        assert_eq!(strip_comments(code), "int a;int b;");
    }

    #[test]
    fn test_strip_preserves_strings() {
        let code = "String url = \"http://x\"; // trailing\n";
        assert_eq!(strip_comments(code), "String url = \"http://x\"; \n");
    }

    #[test]
    fn test_strip_preserves_escaped_quote() {
        let code = "String s = \"a\\\"b // not a comment\";";
        assert_eq!(strip_comments(code), code);
    }

    #[test]
    fn test_extract_strips_comments_inside_block() {
        let reply = "```java\n// explanation\npublic void go() { /* noop */ }\n```";
        assert_eq!(extract_code_block(reply), "public void go() {  }");
    }
}
