//! Suggestion query contract.
//!
//! A [`SuggestionQuerySource`] receives a [`SuggestionRequest`] and answers
//! through a single-shot callback, possibly from another thread.
//! [`LexiconSuggest`] is the in-process implementation backed by a
//! [`Lexicon`](crate::lexicon::Lexicon) and optional user history.

mod rank;
mod worker;

use serde::Serialize;

use crate::caps::CapsMode;
use crate::ngram::NgramContext;

pub use rank::rank_suggestions;
pub use worker::LexiconSuggest;

/// Marker for a code point without keyboard geometry.
pub const NOT_A_COORDINATE: i32 = -1;

/// Where a suggestion lookup originates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    #[default]
    Typing,
    Gesture,
}

/// Key-center coordinates of a typed code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const NONE: Coordinate = Coordinate {
        x: NOT_A_COORDINATE,
        y: NOT_A_COORDINATE,
    };

    pub fn is_known(&self) -> bool {
        self.x != NOT_A_COORDINATE && self.y != NOT_A_COORDINATE
    }
}

/// Maps code points to key coordinates of the active layout.
pub trait KeyCoordinates: Send + Sync {
    fn coordinate_of(&self, c: char) -> Option<Coordinate>;
}

/// One suggestion lookup.
#[derive(Debug, Clone, Default)]
pub struct SuggestionRequest {
    /// Code points composed so far (empty after a commit, for next-word prediction)
    pub typed: Vec<char>,
    /// One coordinate per typed code point
    pub coordinates: Vec<Coordinate>,
    pub ngram: NgramContext,
    pub caps_mode: CapsMode,
    pub session_kind: SessionKind,
    pub sequence_number: u64,
    pub block_offensive: bool,
}

impl SuggestionRequest {
    pub fn typed_word(&self) -> String {
        self.typed.iter().collect()
    }
}

/// A ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedWord {
    pub word: String,
    pub score: f64,
}

/// The answer to one lookup, tagged with the request's sequence number.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuggestedWords {
    pub sequence_number: u64,
    pub words: Vec<SuggestedWord>,
}

impl SuggestedWords {
    pub fn empty(sequence_number: u64) -> Self {
        Self {
            sequence_number,
            words: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Candidate strings in ranked order.
    pub fn strings(&self) -> Vec<String> {
        self.words.iter().map(|w| w.word.clone()).collect()
    }
}

/// Receives the result of a lookup. Invoked exactly once.
pub type SuggestionCallback = Box<dyn FnOnce(SuggestedWords) + Send>;

/// A producer of ranked suggestions.
pub trait SuggestionQuerySource: Send + Sync {
    /// Start a lookup. `on_result` must be called exactly once, on any thread.
    fn get_suggestions(&self, request: SuggestionRequest, on_result: SuggestionCallback);

    /// Release dictionaries. Later lookups answer with no words.
    fn close(&self) {}
}
