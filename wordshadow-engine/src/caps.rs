//! Capitalization modes and sentence-start detection.

use serde::{Deserialize, Serialize};

use crate::spacing::SpacingAndPunctuations;

/// Capitalization state in effect when a word started being composed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapsMode {
    #[default]
    Off,
    /// Shift pressed by the user for one character
    ManualShifted,
    /// Caps lock set by the user
    ManualShiftLocked,
    /// Shift applied automatically at a sentence start
    AutoShifted,
    /// Caps lock applied automatically (all-caps fields)
    AutoShiftLocked,
}

impl CapsMode {
    pub fn is_auto(self) -> bool {
        matches!(self, CapsMode::AutoShifted | CapsMode::AutoShiftLocked)
    }

    pub fn is_shifted(self) -> bool {
        self != CapsMode::Off
    }

    pub fn is_locked(self) -> bool {
        matches!(self, CapsMode::ManualShiftLocked | CapsMode::AutoShiftLocked)
    }
}

const CLOSING_PUNCTUATION: &[char] = &['"', '\'', ')', ']', '}', '\u{201d}', '\u{2019}'];

/// Whether a word typed after `text` starts a new sentence.
///
/// `has_space_before` pretends a space follows `text`, for the case where a
/// phantom space will be materialized before the next word.
pub fn is_sentence_start(text: &str, spacing: &SpacingAndPunctuations, has_space_before: bool) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let mut end = chars.len();

    let ends_with_space = end > 0 && chars[end - 1].is_whitespace();
    if !ends_with_space && !has_space_before {
        return end == 0;
    }

    while end > 0 && chars[end - 1].is_whitespace() {
        if chars[end - 1] == '\n' {
            return true;
        }
        end -= 1;
    }
    if end == 0 {
        return true;
    }

    while end > 0 && CLOSING_PUNCTUATION.contains(&chars[end - 1]) {
        end -= 1;
    }
    if end == 0 {
        return false;
    }

    let terminator = chars[end - 1];
    if !spacing.is_sentence_terminator(terminator) {
        return false;
    }
    if terminator != '.' {
        return true;
    }

    // A period inside the same word means an abbreviation such as "e.g."
    let word_start = chars[..end - 1]
        .iter()
        .rposition(|c| c.is_whitespace())
        .map_or(0, |p| p + 1);
    !chars[word_start..end - 1].contains(&'.')
}
