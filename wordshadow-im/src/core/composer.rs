//! Word composer
//!
//! Holds the word being typed, its key coordinates and the capitalization
//! in effect, and turns it into a [`LastComposedWord`] on commit.

use serde::Serialize;
use wordshadow_engine::text::{is_mostly_caps, normalize_nfc};
use wordshadow_engine::{CapsMode, Coordinate, NgramContext};

use super::state::CommitType;

/// The word being composed.
#[derive(Debug, Default)]
pub struct WordComposer {
    typed: Vec<char>,
    coordinates: Vec<Coordinate>,
    is_batch_mode: bool,
    caps_mode: CapsMode,
    combining_spec: Option<String>,
}

impl WordComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the current word and switch combining rules.
    ///
    /// With a combining spec set, composed words are NFC-normalized so that
    /// dead-key sequences reach the dictionary as precomposed letters.
    pub fn restart_combining(&mut self, combining_spec: Option<&str>) {
        self.combining_spec = combining_spec.map(str::to_string);
        self.reset();
    }

    /// Replace the composed word. `coordinates` must have one entry per code point.
    pub fn set_composing_word(&mut self, code_points: &[char], coordinates: Vec<Coordinate>) {
        if self.combining_spec.is_some() {
            let word: String = code_points.iter().collect();
            let normalized: Vec<char> = normalize_nfc(&word).chars().collect();
            if normalized.len() != code_points.len() {
                self.coordinates = vec![Coordinate::NONE; normalized.len()];
                self.typed = normalized;
                return;
            }
        }
        self.typed = code_points.to_vec();
        self.coordinates = coordinates;
    }

    pub fn reset(&mut self) {
        self.typed.clear();
        self.coordinates.clear();
        self.is_batch_mode = false;
        self.caps_mode = CapsMode::Off;
    }

    pub fn is_composing_word(&self) -> bool {
        !self.typed.is_empty()
    }

    pub fn typed_word(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn code_points(&self) -> &[char] {
        &self.typed
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn is_batch_mode(&self) -> bool {
        self.is_batch_mode
    }

    pub fn set_batch_mode(&mut self, batch_mode: bool) {
        self.is_batch_mode = batch_mode;
    }

    /// Record the capitalization mode used for the next lookup.
    pub fn advise_caps_mode(&mut self, mode: CapsMode) {
        self.caps_mode = mode;
    }

    pub fn caps_mode(&self) -> CapsMode {
        self.caps_mode
    }

    pub fn was_auto_capitalized(&self) -> bool {
        self.caps_mode.is_auto()
    }

    pub fn is_mostly_caps(&self) -> bool {
        is_mostly_caps(&self.typed_word())
    }

    /// Turn the current state into a committed word and reset.
    pub fn commit_word(
        &mut self,
        commit_type: CommitType,
        committed_word: &str,
        separator: Option<char>,
        ngram_context: NgramContext,
    ) -> LastComposedWord {
        let last = LastComposedWord {
            committed_word: committed_word.to_string(),
            typed_word: self.typed_word(),
            commit_type,
            separator,
            ngram_context,
            active: true,
        };
        self.reset();
        last
    }
}

/// The most recent commit, kept for undo and learning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastComposedWord {
    pub committed_word: String,
    pub typed_word: String,
    pub commit_type: CommitType,
    pub separator: Option<char>,
    pub ngram_context: NgramContext,
    active: bool,
}

impl LastComposedWord {
    /// Mark the commit as no longer revertible.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn can_revert(&self) -> bool {
        self.active
    }
}

/// Tracks whether the word just committed can be re-cased in place.
///
/// Disabled at the start of each input; re-armed at the cursor after the
/// engine's own commit, and only valid while the expected selection stays
/// where it was armed.
#[derive(Debug, Default)]
pub struct RecapitalizeStatus {
    anchor: Option<(usize, usize)>,
}

impl RecapitalizeStatus {
    pub fn disable(&mut self) {
        self.anchor = None;
    }

    pub fn start(&mut self, selection_start: usize, selection_end: usize) {
        self.anchor = Some((selection_start, selection_end));
    }

    pub fn is_started(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn is_set_at(&self, selection_start: usize, selection_end: usize) -> bool {
        self.anchor == Some((selection_start, selection_end))
    }
}
