//! Stub collaborators shared by the session and engine tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use wordshadow_engine::{
    Coordinate, KeyCoordinates, NgramContext, SuggestedWord, SuggestedWords, SuggestionCallback,
    SuggestionQuerySource, SuggestionRequest, UserHistoryStore,
};

/// Answers every lookup with a fixed word list, from another thread.
#[derive(Default)]
pub struct StubSource {
    words: Mutex<Vec<String>>,
    delay: Mutex<Duration>,
    requests: Mutex<Vec<SuggestionRequest>>,
    closed: AtomicBool,
}

impl StubSource {
    pub fn new(words: &[&str]) -> Arc<Self> {
        let source = Self::default();
        source.set_words(words);
        Arc::new(source)
    }

    pub fn set_words(&self, words: &[&str]) {
        *self.words.lock().unwrap() = words.iter().map(|w| w.to_string()).collect();
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn requests(&self) -> Vec<SuggestionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> SuggestionRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl SuggestionQuerySource for StubSource {
    fn get_suggestions(&self, request: SuggestionRequest, on_result: SuggestionCallback) {
        let words = SuggestedWords {
            sequence_number: request.sequence_number,
            words: self
                .words
                .lock()
                .unwrap()
                .iter()
                .enumerate()
                .map(|(i, w)| SuggestedWord {
                    word: w.clone(),
                    score: 100.0 - i as f64,
                })
                .collect(),
        };
        let delay = *self.delay.lock().unwrap();
        self.requests.lock().unwrap().push(request);
        thread::spawn(move || {
            thread::sleep(delay);
            on_result(words);
        });
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Keeps every callback and never calls it.
#[derive(Default)]
pub struct SilentSource {
    pending: Mutex<Vec<SuggestionCallback>>,
}

impl SuggestionQuerySource for SilentSource {
    fn get_suggestions(&self, _request: SuggestionRequest, on_result: SuggestionCallback) {
        self.pending.lock().unwrap().push(on_result);
    }
}

/// Drops every callback without calling it.
pub struct DroppingSource;

impl SuggestionQuerySource for DroppingSource {
    fn get_suggestions(&self, _request: SuggestionRequest, _on_result: SuggestionCallback) {}
}

/// Answers with a sequence number other than the one asked for.
pub struct StaleSource;

impl SuggestionQuerySource for StaleSource {
    fn get_suggestions(&self, request: SuggestionRequest, on_result: SuggestionCallback) {
        on_result(SuggestedWords {
            sequence_number: request.sequence_number + 100,
            words: vec![SuggestedWord {
                word: "stale".to_string(),
                score: 1.0,
            }],
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryWrite {
    pub word: String,
    pub was_auto_capitalized: bool,
    pub ngram: NgramContext,
    pub timestamp_secs: u64,
    pub block_offensive: bool,
}

#[derive(Default)]
pub struct RecordingHistory {
    writes: Mutex<Vec<HistoryWrite>>,
}

impl RecordingHistory {
    pub fn writes(&self) -> Vec<HistoryWrite> {
        self.writes.lock().unwrap().clone()
    }
}

impl UserHistoryStore for RecordingHistory {
    fn add(
        &self,
        word: &str,
        was_auto_capitalized: bool,
        ngram: &NgramContext,
        timestamp_secs: u64,
        block_offensive: bool,
    ) {
        self.writes.lock().unwrap().push(HistoryWrite {
            word: word.to_string(),
            was_auto_capitalized,
            ngram: ngram.clone(),
            timestamp_secs,
            block_offensive,
        });
    }
}

/// Lowercase ASCII letters on a single row, 10 units apart.
pub struct RowKeys;

impl KeyCoordinates for RowKeys {
    fn coordinate_of(&self, c: char) -> Option<Coordinate> {
        c.is_ascii_lowercase().then(|| Coordinate {
            x: (c as i32 - 'a' as i32) * 10,
            y: 0,
        })
    }
}
