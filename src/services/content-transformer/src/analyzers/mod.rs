//! Local text heuristics
//!
//! Every analyzer is a pure function over the text blob: no I/O, no shared
//! state, and the same input always yields the same report.

pub mod analytics;
pub mod language;
pub mod legal;
pub mod mindmap;
pub mod preview;
pub mod study_notes;

use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Whitespace-separated tokens
pub(crate) fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Pieces between runs of `.`, `!` or `?`, keeping only non-blank ones
pub(crate) fn sentences(text: &str) -> Vec<&str> {
    SENTENCE_BREAK
        .split(text)
        .filter(|piece| !piece.trim().is_empty())
        .collect()
}

/// Trimmed non-blank lines
pub(crate) fn content_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Character-safe truncation that appends `...` when the text was cut
pub(crate) fn ellipsize(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", mindloom_shared::truncate_chars(text, max_chars))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentences_drop_blank_pieces() {
        assert_eq!(sentences("One. Two!! Three?"), vec!["One", " Two", " Three"]);
        assert!(sentences("...").is_empty());
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("abcdef", 3), "abc...");
        assert_eq!(ellipsize("abc", 3), "abc");
    }
}
