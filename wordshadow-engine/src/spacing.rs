//! Language-dependent spacing and punctuation rules.
//!
//! Decides which code points separate words, which ones join them
//! (apostrophes, hyphens), which end a sentence, and which are normally
//! written after a space (opening brackets). Also hosts the URL heuristic
//! used to suppress automatic spaces.

use serde::{Deserialize, Serialize};

/// Spacing and punctuation rules for the active language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpacingAndPunctuations {
    /// Characters that end a word
    pub word_separators: String,
    /// Characters that may appear inside a word but not start one ("'", "-")
    pub word_connectors: String,
    /// Characters that end a sentence
    pub sentence_terminators: String,
    /// Separators that are conventionally written after a space ("(", "[")
    pub usually_preceded_by_space: String,
    /// Whether the language separates words with spaces
    pub language_has_spaces: bool,
}

impl Default for SpacingAndPunctuations {
    fn default() -> Self {
        Self {
            word_separators: " \n\t.,;:!?()[]{}\"&/".to_string(),
            word_connectors: "'-".to_string(),
            sentence_terminators: ".?!".to_string(),
            usually_preceded_by_space: "([{&".to_string(),
            language_has_spaces: true,
        }
    }
}

impl SpacingAndPunctuations {
    pub fn is_word_separator(&self, c: char) -> bool {
        self.word_separators.contains(c)
    }

    pub fn is_word_connector(&self, c: char) -> bool {
        self.word_connectors.contains(c)
    }

    pub fn is_sentence_terminator(&self, c: char) -> bool {
        self.sentence_terminators.contains(c)
    }

    pub fn is_usually_preceded_by_space(&self, c: char) -> bool {
        self.usually_preceded_by_space.contains(c)
    }

    /// Whether a word starting with `c` should get the automatic space
    /// owed by a previous pick.
    pub fn accepts_phantom_space_before(&self, c: char) -> bool {
        !self.is_word_separator(c) || self.is_usually_preceded_by_space(c)
    }
}

/// Whether the last whitespace-delimited run of `text` looks like a URL.
///
/// The run looks like a URL if it starts with "www" and contains a period,
/// contains "//", starts with a single slash, or contains both a period
/// and a slash.
pub fn looks_like_url(text: &str) -> bool {
    let mut w_count = 0;
    let mut slash_count = 0;
    let mut has_slash = false;
    let mut has_period = false;

    for c in text.chars().rev() {
        if c.is_whitespace() {
            break;
        }
        if c == '.' {
            has_period = true;
        }
        if c == '/' {
            has_slash = true;
            slash_count += 1;
            if slash_count == 2 {
                return true;
            }
        } else {
            slash_count = 0;
        }
        if c == 'w' {
            w_count += 1;
        } else {
            w_count = 0;
        }
    }

    if text.is_empty() {
        return false;
    }
    if w_count >= 3 && has_period {
        return true;
    }
    // The run starts with a single slash
    if slash_count == 1 {
        return true;
    }
    has_period && has_slash
}
