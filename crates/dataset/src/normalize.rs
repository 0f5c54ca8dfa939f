use unicode_segmentation::UnicodeSegmentation;

/// Lower-cases and collapses runs of whitespace.
pub fn normalize_term(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Length in user-perceived characters.
pub fn visible_len(input: &str) -> usize {
    input.trim().graphemes(true).count()
}
