//! Character-safe string helpers

/// Keep at most `max_chars` characters, appending `...` when anything was cut.
///
/// Counts `char`s rather than bytes, so Japanese text never splits inside a
/// multi-byte character.
///
/// ```
/// use scrivener_core::utils::string::truncate_at_char_boundary;
///
/// assert_eq!(truncate_at_char_boundary("hello world", 5), "hello...");
/// assert_eq!(truncate_at_char_boundary("短い文", 10), "短い文");
/// assert_eq!(truncate_at_char_boundary("とても長い文章です", 4), "とても長...");
/// ```
pub fn truncate_at_char_boundary(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}
