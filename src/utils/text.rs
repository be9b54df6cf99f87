// src/utils/text.rs

//! Text preprocessing helpers.

use unicode_segmentation::UnicodeSegmentation;

/// Collapse all whitespace runs into single spaces and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string to at most `max` grapheme clusters, appending an
/// ellipsis when content was cut.
pub fn truncate_graphemes(s: &str, max: usize) -> String {
    let mut graphemes = s.grapheme_indices(true);
    match graphemes.nth(max) {
        Some((byte_index, _)) => format!("{}...", &s[..byte_index]),
        None => s.to_string(),
    }
}
