//! Named text predicates used by the scorers and the analyzer
//!
//! Each function is a plain lexical check over the raw article text. None of
//! them understand the content; they approximate "did the article follow the
//! house checklist".

use once_cell::sync::Lazy;
use regex::Regex;

/// Pre-compiled patterns shared by the predicates
pub struct Patterns;

impl Patterns {
    /// A complete fenced code block, capturing its body
    pub fn code_block() -> &'static Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?s)```\w*\n(.*?)\n```").expect("Valid code block regex")
        });
        &PATTERN
    }

    /// A fence line: opening fences with or without a language tag, and
    /// closing fences followed by a newline
    pub fn fence_line() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"```\w*\n").expect("Valid fence line regex"));
        &PATTERN
    }

    /// Markdown heading of level 1 to 3
    pub fn heading() -> &'static Regex {
        static PATTERN: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"(?m)^#{1,3}\s+(.+)$").expect("Valid heading regex"));
        &PATTERN
    }
}

/// Bodies of all fenced code blocks, in document order
pub fn code_blocks(text: &str) -> Vec<&str> {
    Patterns::code_block()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Number of fence lines (opening and closing)
pub fn count_fence_lines(text: &str) -> usize {
    Patterns::fence_line().find_iter(text).count()
}

/// Number of level 1–3 headings
pub fn count_headings(text: &str) -> usize {
    Patterns::heading().find_iter(text).count()
}

/// Blank-line separated paragraphs longer than `max_chars` that are not code
pub fn count_long_paragraphs(text: &str, max_chars: usize) -> usize {
    text.split("\n\n")
        .filter(|p| !p.starts_with("```") && p.chars().count() > max_chars)
        .count()
}

/// Number of blank-line separators
pub fn count_blank_lines(text: &str) -> usize {
    text.matches("\n\n").count()
}

/// Bullet and numbered list items (`- `, `* `, `1. ` at line start)
pub fn count_list_markers(text: &str) -> usize {
    ["\n- ", "\n* ", "\n1. "]
        .iter()
        .map(|marker| text.matches(marker).count())
        .sum()
}

/// True when any marker occurs as a substring
pub fn contains_any<S: AsRef<str>>(text: &str, markers: &[S]) -> bool {
    markers.iter().any(|m| text.contains(m.as_ref()))
}

/// Number of distinct terms present in `text`
pub fn count_terms_present<S: AsRef<str>>(text: &str, terms: &[S], ignore_case: bool) -> usize {
    if ignore_case {
        let haystack = text.to_lowercase();
        terms
            .iter()
            .filter(|t| haystack.contains(&t.as_ref().to_lowercase()))
            .count()
    } else {
        terms.iter().filter(|t| text.contains(t.as_ref())).count()
    }
}

/// Total non-overlapping occurrences of all markers
pub fn count_occurrences<S: AsRef<str>>(text: &str, markers: &[S]) -> usize {
    markers
        .iter()
        .filter(|m| !m.as_ref().is_empty())
        .map(|m| text.matches(m.as_ref()).count())
        .sum()
}

/// Characters that are not whitespace
pub fn non_whitespace_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// A code block shows error handling when it mentions any marker.
/// Markers are matched case-insensitively.
pub fn has_error_handling<S: AsRef<str>>(code: &str, markers: &[S]) -> bool {
    count_terms_present(code, markers, true) > 0
}

/// A code block is commented when it contains `marker` somewhere other than
/// as its very first character (a leading shebang or heading-like line does
/// not count on its own).
pub fn has_inline_comment(code: &str, marker: &str) -> bool {
    code.contains(marker) && !code.trim().starts_with(marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# Title\n\nIntro\n\n```python\ndef main():\n    pass  # noop\n```\n\n```\nplain\n```\n";

    #[test]
    fn test_code_blocks() {
        let blocks = code_blocks(SAMPLE);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("def main"));
        assert_eq!(blocks[1], "plain");
    }

    #[test]
    fn test_unclosed_fence_is_not_a_block() {
        assert!(code_blocks("```rust\nfn main() {}\n").is_empty());
    }

    #[test]
    fn test_fence_lines_count_both_ends() {
        // opening with tag, closing + newline, opening bare, closing + newline
        assert_eq!(count_fence_lines(SAMPLE), 4);
    }

    #[test]
    fn test_headings() {
        let text = "# One\n## Two\n### Three\n#### Four\n#NoSpace\n";
        assert_eq!(count_headings(text), 3);
    }

    #[test]
    fn test_long_paragraphs_skip_code() {
        let long = "あ".repeat(501);
        let code = format!("```\n{}\n```", "x".repeat(600));
        let text = format!("{long}\n\n{code}\n\n{long}\n\nshort");
        assert_eq!(count_long_paragraphs(&text, 500), 2);
    }

    #[test]
    fn test_long_paragraph_counts_chars_not_bytes() {
        // 200 three-byte characters is 600 bytes but only 200 chars
        assert_eq!(count_long_paragraphs(&"漢".repeat(200), 500), 0);
    }

    #[test]
    fn test_list_markers() {
        let text = "intro\n- a\n- b\n* c\n1. d\n2. e\n";
        assert_eq!(count_list_markers(text), 4);
    }

    #[test]
    fn test_terms_case_handling() {
        let terms = ["API", "async", "cache"];
        assert_eq!(count_terms_present("api and Cache", &terms, true), 2);
        assert_eq!(count_terms_present("api and Cache", &terms, false), 0);
    }

    #[test]
    fn test_occurrences_sum_all_markers() {
        let markers = ["詳しく", "深く"];
        assert_eq!(count_occurrences("詳しく見る。詳しく、深く。", &markers), 3);
    }

    #[test]
    fn test_non_whitespace() {
        assert_eq!(non_whitespace_chars(" a b\n\tc　"), 3);
    }

    #[test]
    fn test_inline_comment() {
        assert!(has_inline_comment("x = 1  # set x", "#"));
        assert!(!has_inline_comment("# only a header comment", "#"));
        assert!(!has_inline_comment("x = 1", "#"));
    }

    #[test]
    fn test_error_handling_markers() {
        let markers = ["try:", "except", "error"];
        assert!(has_error_handling("try:\n    run()\nexcept ValueError:", &markers));
        assert!(has_error_handling("raise RuntimeError('x')", &markers));
        assert!(!has_error_handling("print('ok')", &markers));
    }
}
