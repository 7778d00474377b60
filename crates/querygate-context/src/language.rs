// SPDX-FileCopyrightText: 2026 Querygate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic language detection for Latin-script Hindi/English mixes.

use std::sync::LazyLock;

use querygate_core::Language;
use regex::Regex;

/// Common Hindi words written in Latin script.
pub const HINGLISH_MARKERS: &[&str] = &[
    "mein", "ke", "ki", "ka", "hai", "hain", "dikhao", "batao", "kya", "kaise", "kahan", "kab",
    "kitna", "kitne", "aur", "ya", "se", "tak", "par", "liye", "sath", "wala", "wale", "wali",
    "chahiye", "karo", "karna", "abhi", "phir", "jab", "tab", "yahan", "wahan", "iska", "uska",
    "mere", "tere", "apna",
];

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{})\b", HINGLISH_MARKERS.join("|")))
        .expect("marker pattern is valid")
});

/// Hinglish when any marker appears as a whole word, English otherwise.
pub fn detect_language(text: &str) -> Language {
    if MARKER.is_match(text) {
        Language::Hinglish
    } else {
        Language::English
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_hinglish() {
        assert_eq!(
            detect_language("Delhi ke customers dikhao"),
            Language::Hinglish
        );
        assert_eq!(
            detect_language("Pichle mahine KITNE orders aaye?"),
            Language::Hinglish
        );
    }

    #[test]
    fn english_by_default() {
        assert_eq!(
            detect_language("Show the top customers by revenue"),
            Language::English
        );
        assert_eq!(detect_language(""), Language::English);
    }

    #[test]
    fn markers_match_whole_words_only() {
        // "kab" inside "kebab", "se" inside "users", "par" inside "parts".
        assert_eq!(detect_language("list kebab users and parts"), Language::English);
    }
}
