//! Composition session
//!
//! One logical input episode over one editor. The session owns the text
//! cache and the word composer, decides where automatic spaces go, feeds
//! picked words to the user history and asks the suggestion source for
//! candidates. It is not thread-safe by itself: the dispatcher moves it onto
//! a single worker thread and runs every operation there.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use wordshadow_engine::text::{is_first_char_upper, is_mostly_caps};
use wordshadow_engine::{
    CapsMode, Coordinate, KeyCoordinates, NgramContext, SessionKind, SuggestedWords,
    SuggestionQuerySource, SuggestionRequest, UserHistoryStore, is_sentence_start, now_unix,
};

use super::composer::{LastComposedWord, RecapitalizeStatus, WordComposer};
use super::connection::EditorConnection;
use super::keycode::{KeyEvent, Keysym};
use super::shadow::{ShadowConfig, ShadowSnapshot, TextCursorShadow};
use super::state::{CommitType, SpaceState};
use crate::config::Settings;


/// Why a suggestion lookup produced nothing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("suggestion source did not answer within {0:?}")]
    Timeout(Duration),
    #[error("suggestion source dropped the callback without answering")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Counters kept over the lifetime of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub queries: u64,
    pub picks: u64,
    pub timeouts: u64,
    /// Words still being composed when the input was started over or finished
    pub unfinished_words: u64,
}

/// Immutable copy of the observable session state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub shadow: ShadowSnapshot,
    pub typed_word: String,
    pub space_state: SpaceState,
    pub last_composed_word: Option<LastComposedWord>,
    /// The last pick can still be re-cased in place
    pub recapitalize_active: bool,
    pub stats: SessionStats,
}

/// The collaborators a session queries and learns into.
#[derive(Clone)]
pub struct SessionServices {
    pub source: Arc<dyn SuggestionQuerySource>,
    pub history: Arc<dyn UserHistoryStore>,
    pub key_coordinates: Option<Arc<dyn KeyCoordinates>>,
}

pub struct CompositionSession {
    shadow: TextCursorShadow,
    composer: WordComposer,
    space_state: SpaceState,
    last_composed_word: Option<LastComposedWord>,
    recapitalize: RecapitalizeStatus,
    services: SessionServices,
    settings: Settings,
    next_sequence_number: u64,
    stats: SessionStats,
}

impl CompositionSession {
    pub fn new(
        connection: Box<dyn EditorConnection>,
        services: SessionServices,
        settings: Settings,
    ) -> Self {
        let shadow = TextCursorShadow::new(connection, ShadowConfig::from(&settings.connection));
        Self {
            shadow,
            composer: WordComposer::new(),
            space_state: SpaceState::None,
            last_composed_word: None,
            recapitalize: RecapitalizeStatus::default(),
            services,
            settings,
            next_sequence_number: 1,
            stats: SessionStats::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn space_state(&self) -> SpaceState {
        self.space_state
    }

    pub fn shadow(&self) -> &TextCursorShadow {
        &self.shadow
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Begin a new input episode on the editor.
    pub fn start_input(&mut self, combining_spec: Option<&str>) {
        self.shadow.on_start_input();
        self.record_unfinished_word("input restarted");
        // The editor keeps no composing region the cache has forgotten
        if !self.shadow.composing().is_empty() {
            self.shadow.finish_composing_text();
        }
        self.composer.restart_combining(combining_spec);
        self.reset_composing_state();
        self.space_state = SpaceState::None;
        self.recapitalize.disable();

        self.shadow.reset();
        if !self.shadow.reload() {
            warn!("editor not readable at start of input, cache starts empty");
        }
        debug!(?combining_spec, "input started");
    }

    /// End the input episode, leaving any composing text in the editor.
    pub fn finish_input(&mut self) {
        if !self.shadow.composing().is_empty() {
            self.shadow.finish_composing_text();
        }
        self.record_unfinished_word("input finished");
        self.reset_composing_state();
    }

    /// Release the suggestion source.
    pub fn close(&mut self) {
        self.services.source.close();
    }

    fn reset_composing_state(&mut self) {
        self.composer.reset();
        self.last_composed_word = None;
    }

    fn record_unfinished_word(&mut self, reason: &str) {
        if self.composer.is_composing_word() {
            self.stats.unfinished_words += 1;
            debug!(word = %self.composer.typed_word(), reason, "word left unfinished");
        }
    }

    // ------------------------------------------------------------------
    // Typing
    // ------------------------------------------------------------------

    /// Suggestions for `word`, the whole word typed so far. An empty word
    /// asks for next-word predictions.
    pub fn query_typing(&mut self, word: &str) -> Result<Vec<String>> {
        let code_points: Vec<char> = word.chars().collect();
        let coordinates = self.coordinates_for(&code_points);
        self.composer.set_composing_word(&code_points, coordinates);

        // Decided before the word shows up as composing text
        let typed = self.composer.typed_word();
        let caps_mode = self.caps_mode_for(&typed);
        self.composer.advise_caps_mode(caps_mode);

        if self.settings.input.mirror_composing {
            self.mirror_composing_word();
        }

        self.stats.queries += 1;
        let suggestions = self.lookup()?;
        Ok(filter_candidates(suggestions))
    }

    fn coordinates_for(&self, code_points: &[char]) -> Vec<Coordinate> {
        code_points
            .iter()
            .map(|&c| {
                self.services
                    .key_coordinates
                    .as_ref()
                    .and_then(|keys| keys.coordinate_of(c))
                    .unwrap_or(Coordinate::NONE)
            })
            .collect()
    }

    /// Show the composed word in the editor as composing text.
    ///
    /// An owed space is only previewed inside the composing region; the
    /// phantom state is left for the pick to settle.
    fn mirror_composing_word(&mut self) {
        let typed = self.composer.typed_word();
        if typed.is_empty() && self.shadow.composing().is_empty() {
            return;
        }

        let owes_space = self.space_state.is_phantom()
            && typed
                .chars()
                .next()
                .is_some_and(|first| self.automatic_space_allowed(first));
        let preview = if owes_space {
            format!(" {}", typed)
        } else {
            typed
        };
        self.shadow.set_composing_text(&preview, 1);
    }

    /// Capitalization in effect for a word typed at the cursor.
    fn caps_mode_for(&mut self, typed: &str) -> CapsMode {
        let has_space_before = self.space_state.is_phantom();
        let auto_cap = self.settings.input.auto_cap;

        if typed.is_empty() {
            if auto_cap && self.shadow.cursor_caps_mode(&self.settings.spacing, has_space_before) {
                return CapsMode::AutoShifted;
            }
            return CapsMode::Off;
        }
        if typed.chars().count() > 1 && is_mostly_caps(typed) {
            return CapsMode::ManualShiftLocked;
        }
        if !is_first_char_upper(typed) {
            return CapsMode::Off;
        }
        let at_sentence_start = self.shadow.composing().is_empty()
            && is_sentence_start(
                self.shadow.committed_before_composing(),
                &self.settings.spacing,
                has_space_before,
            );
        if auto_cap && at_sentence_start {
            CapsMode::AutoShifted
        } else {
            CapsMode::ManualShifted
        }
    }

    // ------------------------------------------------------------------
    // Picking
    // ------------------------------------------------------------------

    /// Commit `word` as picked from the suggestions and return the
    /// predictions that follow it. An empty word does nothing.
    pub fn pick_word(&mut self, word: &str) -> Result<Vec<String>> {
        let Some(first) = word.chars().next() else {
            debug!("empty pick ignored");
            return Ok(Vec::new());
        };

        if !self.composer.is_composing_word() {
            let caps_mode = self.caps_mode_for(word);
            self.composer.advise_caps_mode(caps_mode);
        }

        self.shadow.begin_batch_edit();
        if self.space_state.is_phantom()
            && !self.composer.is_batch_mode()
            && self.automatic_space_allowed(first)
        {
            // The real space goes before the word, not inside a mirrored preview
            if !self.shadow.composing().is_empty() {
                self.shadow.set_composing_text("", 1);
            }
            self.insert_automatic_space();
        }

        let ngram = self.ngram_context_for_commit();
        self.shadow.commit_text(word, 1);
        self.learn(word, &ngram);

        if let Some(previous) = self.last_composed_word.as_mut() {
            previous.deactivate();
        }
        let mut last = self
            .composer
            .commit_word(CommitType::ManualPick, word, None, ngram);
        last.deactivate();
        self.last_composed_word = Some(last);
        self.space_state = SpaceState::Phantom;
        self.shadow.end_batch_edit();

        match (
            self.shadow.expected_selection_start(),
            self.shadow.expected_selection_end(),
        ) {
            (Some(start), Some(end)) => self.recapitalize.start(start, end),
            _ => self.recapitalize.disable(),
        }
        self.stats.picks += 1;
        debug!(word, "picked");

        self.shadow.reload();
        self.query_typing("")
    }

    fn ngram_context_for_commit(&mut self) -> NgramContext {
        // The word being replaced sits in the cache while it is composing
        let nth = if self.shadow.composing().is_empty() { 1 } else { 2 };
        self.shadow
            .ngram_context_from_nth_previous_word(&self.settings.spacing, nth)
    }

    fn learn(&mut self, word: &str, ngram: &NgramContext) {
        if !self.settings.input.auto_correction {
            return;
        }
        if self.shadow.is_connection_slow() {
            debug!(word, "slow connection, not learning");
            return;
        }
        let was_auto_capitalized =
            self.composer.was_auto_capitalized() && !self.composer.is_mostly_caps();
        self.services.history.add(
            word,
            was_auto_capitalized,
            ngram,
            now_unix(),
            self.settings.input.block_offensive,
        );
    }

    /// Whether an owed space should be materialized before a word starting with `first`.
    fn automatic_space_allowed(&self, first: char) -> bool {
        self.settings.spacing.accepts_phantom_space_before(first)
            && self.settings.input.insert_spaces_automatically
            && self.settings.spacing.language_has_spaces
            && !self.shadow.text_before_cursor_looks_like_url()
    }

    fn insert_automatic_space(&mut self) {
        self.shadow.send_key_event(&KeyEvent::press(Keysym::SPACE));
        self.shadow.send_key_event(&KeyEvent::release(Keysym::SPACE));
    }

    // ------------------------------------------------------------------
    // Suggestion lookup
    // ------------------------------------------------------------------

    fn lookup(&mut self) -> Result<SuggestedWords> {
        let sequence_number = self.next_sequence_number;
        self.next_sequence_number += 1;

        let ngram = if self.composer.is_composing_word() {
            self.ngram_context_for_commit()
        } else {
            self.shadow
                .ngram_context_from_nth_previous_word(&self.settings.spacing, 1)
        };
        let session_kind = if self.composer.is_batch_mode() {
            SessionKind::Gesture
        } else {
            SessionKind::Typing
        };
        let request = SuggestionRequest {
            typed: self.composer.code_points().to_vec(),
            coordinates: self.composer.coordinates().to_vec(),
            ngram,
            caps_mode: self.composer.caps_mode(),
            session_kind,
            sequence_number,
            block_offensive: self.settings.input.block_offensive,
        };

        let wait = self.settings.pipeline.callback_wait();
        let (tx, rx) = mpsc::sync_channel(1);
        self.services.source.get_suggestions(
            request,
            Box::new(move |words: SuggestedWords| {
                if tx.try_send(words).is_err() {
                    debug!(sequence_number, "suggestions arrived after the lookup was abandoned");
                }
            }),
        );

        match rx.recv_timeout(wait) {
            Ok(words) if words.sequence_number == sequence_number => Ok(words),
            Ok(words) => {
                debug!(
                    expected = sequence_number,
                    received = words.sequence_number,
                    "discarding stale suggestions"
                );
                Ok(SuggestedWords::empty(sequence_number))
            }
            Err(RecvTimeoutError::Timeout) => {
                self.stats.timeouts += 1;
                Err(SessionError::Timeout(wait))
            }
            Err(RecvTimeoutError::Disconnected) => Err(SessionError::Disconnected),
        }
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    pub fn snapshot(&self) -> SessionSnapshot {
        let shadow = self.shadow.snapshot();
        let recapitalize_active = match (shadow.expected_selection_start, shadow.expected_selection_end) {
            (Some(start), Some(end)) => self.recapitalize.is_set_at(start, end),
            _ => false,
        };
        SessionSnapshot {
            shadow,
            typed_word: self.composer.typed_word(),
            space_state: self.space_state,
            last_composed_word: self.last_composed_word.clone(),
            recapitalize_active,
            stats: self.stats,
        }
    }
}

/// Candidates that contain a space are never offered.
fn filter_candidates(suggestions: SuggestedWords) -> Vec<String> {
    suggestions
        .words
        .into_iter()
        .map(|w| w.word)
        .filter(|word| !word.contains(' '))
        .collect()
}
