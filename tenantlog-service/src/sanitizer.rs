//! Cleans caller-supplied free text before it reaches a log namespace.

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest value stored, counted in characters.
pub const MAX_FIELD_CHARS: usize = 1000;

/// Removed as a literal substring, not as a character class.
const BLOCKED_SEQUENCE: &str = "[;&|`$]";

const STRIPPED_LITERALS: [&str; 3] = ["<script>", "</script>", "<.*?>"];

static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(/)?[a-z][^>]*?>").expect("tag pattern is valid"));

/// Sanitizes an optional field; `None` passes through untouched.
pub fn sanitize(input: Option<&str>) -> Option<String> {
    input.map(sanitize_text)
}

/// Sanitizes a present value.
pub fn sanitize_text(input: &str) -> String {
    let trimmed = input.trim();
    let mut cleaned = TAG_PATTERN.replace_all(trimmed, "").into_owned();

    cleaned = cleaned.replace('\'', "''");
    cleaned = cleaned.replace(BLOCKED_SEQUENCE, "");
    for literal in STRIPPED_LITERALS {
        cleaned = cleaned.replace(literal, "");
    }

    truncate_chars(cleaned, MAX_FIELD_CHARS)
}

fn truncate_chars(mut value: String, limit: usize) -> String {
    if let Some((byte_idx, _)) = value.char_indices().nth(limit) {
        value.truncate(byte_idx);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_passes_through() {
        assert_eq!(sanitize(None), None);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(sanitize(Some("  hello \n")), Some("hello".to_string()));
    }

    #[test]
    fn removes_script_tags() {
        assert_eq!(sanitize_text("<script>alert(1)</script>"), "alert(1)");
        assert_eq!(sanitize_text("<SCRIPT src=x>boom</Script>"), "boom");
    }

    #[test]
    fn strips_tags_with_attributes() {
        assert_eq!(
            sanitize_text(r#"<a href="http://x">click</a> <br/>"#),
            "click "
        );
    }

    #[test]
    fn strips_tags_regardless_of_case() {
        assert_eq!(sanitize_text("<B>bold</B> <Div class=x>text</DIV>"), "bold text");
    }

    #[test]
    fn keeps_comparisons_that_are_not_tags() {
        assert_eq!(sanitize_text("a < b and c > d"), "a < b and c > d");
        assert_eq!(sanitize_text("1<2"), "1<2");
    }

    #[test]
    fn doubles_single_quotes() {
        assert_eq!(sanitize_text("it's"), "it''s");
    }

    #[test]
    fn blocked_sequence_is_removed_only_as_a_whole() {
        assert_eq!(sanitize_text("a[;&|`$]b"), "ab");
        assert_eq!(sanitize_text("rm -rf; echo $HOME | cat"), "rm -rf; echo $HOME | cat");
    }

    #[test]
    fn strips_regex_literal() {
        assert_eq!(sanitize_text("x<.*?>y"), "xy");
    }

    #[test]
    fn truncates_to_limit() {
        let long = "a".repeat(MAX_FIELD_CHARS + 250);
        assert_eq!(sanitize_text(&long).chars().count(), MAX_FIELD_CHARS);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let long = "é".repeat(MAX_FIELD_CHARS + 1);
        let cleaned = sanitize_text(&long);
        assert_eq!(cleaned.chars().count(), MAX_FIELD_CHARS);
        assert!(cleaned.chars().all(|c| c == 'é'));
    }

    #[test]
    fn quote_doubling_happens_before_truncation() {
        let input = "'".repeat(MAX_FIELD_CHARS);
        assert_eq!(sanitize_text(&input), "'".repeat(MAX_FIELD_CHARS));
    }
}
