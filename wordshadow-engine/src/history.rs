//! User history for remembering words the user picked.
//!
//! Records each picked word as a unigram and, when the previous word is
//! known, as a bigram keyed by that word. Later predictions boost both.
//! Kept in memory only; entries are evicted by score once the cache grows
//! past its limit.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::ngram::NgramContext;
use crate::text::{decapitalize_first, fold_case};

/// Key used for bigrams at the start of a sentence.
const BOS_KEY: &str = "<s>";

/// A single learned word.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub word: String,
    /// Number of times this word was picked in this context
    pub frequency: u32,
    /// Last pick time as Unix timestamp (seconds)
    pub last_access: u64,
}

/// In-memory user history.
#[derive(Debug)]
pub struct UserHistory {
    unigrams: HashMap<String, HistoryEntry>,
    /// Folded previous word -> words that followed it
    bigrams: HashMap<String, Vec<HistoryEntry>>,
    max_entries: usize,
}

impl UserHistory {
    /// Default maximum number of unigram plus bigram entries.
    pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

    pub fn new(max_entries: usize) -> Self {
        Self {
            unigrams: HashMap::new(),
            bigrams: HashMap::new(),
            max_entries,
        }
    }

    /// Record a picked word at `timestamp`. Empty words are ignored.
    pub fn record(&mut self, word: &str, ngram: &NgramContext, timestamp: u64) {
        if word.is_empty() {
            return;
        }

        bump(
            self.unigrams
                .entry(word.to_string())
                .or_insert_with(|| HistoryEntry {
                    word: word.to_string(),
                    frequency: 0,
                    last_access: timestamp,
                }),
            timestamp,
        );

        if let Some(key) = bigram_key(ngram) {
            let followers = self.bigrams.entry(key).or_default();
            match followers.iter_mut().find(|e| e.word == word) {
                Some(entry) => bump(entry, timestamp),
                None => followers.push(HistoryEntry {
                    word: word.to_string(),
                    frequency: 1,
                    last_access: timestamp,
                }),
            }
        }

        if self.entry_count() > self.max_entries {
            self.evict(timestamp);
        }
    }

    /// Words that followed the context's previous word, sorted by score descending.
    pub fn next_words(&self, ngram: &NgramContext, now: u64) -> Vec<(String, f64)> {
        let Some(followers) = bigram_key(ngram).and_then(|k| self.bigrams.get(&k)) else {
            return Vec::new();
        };
        let mut scored: Vec<(String, f64)> = followers
            .iter()
            .map(|e| (e.word.clone(), score(e, now)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }

    /// Learned words starting with `prefix` (case-insensitive), sorted by score descending.
    pub fn prefix_lookup(&self, prefix: &str, now: u64) -> Vec<(String, f64)> {
        let folded = fold_case(prefix);
        let mut results: Vec<(String, f64)> = self
            .unigrams
            .values()
            .filter(|e| fold_case(&e.word).starts_with(&folded))
            .map(|e| (e.word.clone(), score(e, now)))
            .collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        results
    }

    /// Unigram score of `word`, if it was ever learned.
    pub fn unigram_score(&self, word: &str, now: u64) -> Option<f64> {
        self.unigrams.get(word).map(|e| score(e, now))
    }

    pub fn frequency(&self, word: &str) -> u32 {
        self.unigrams.get(word).map_or(0, |e| e.frequency)
    }

    /// Total number of unigram and bigram entries.
    pub fn entry_count(&self) -> usize {
        self.unigrams.len() + self.bigrams.values().map(|v| v.len()).sum::<usize>()
    }

    /// Evict lowest-score entries until the total count is within `max_entries`.
    fn evict(&mut self, now: u64) {
        let total = self.entry_count();
        if total <= self.max_entries {
            return;
        }
        let mut to_remove = total - self.max_entries;

        // Bigrams are evicted before unigrams
        let mut bigram_scores: Vec<(String, String, f64)> = self
            .bigrams
            .iter()
            .flat_map(|(k, v)| v.iter().map(move |e| (k.clone(), e.word.clone(), score(e, now))))
            .collect();
        bigram_scores.sort_by(|a, b| a.2.total_cmp(&b.2));
        for (key, word, _) in bigram_scores {
            if to_remove == 0 {
                break;
            }
            if let Some(followers) = self.bigrams.get_mut(&key) {
                followers.retain(|e| e.word != word);
                if followers.is_empty() {
                    self.bigrams.remove(&key);
                }
                to_remove -= 1;
            }
        }

        if to_remove > 0 {
            let mut unigram_scores: Vec<(String, f64)> = self
                .unigrams
                .values()
                .map(|e| (e.word.clone(), score(e, now)))
                .collect();
            unigram_scores.sort_by(|a, b| a.1.total_cmp(&b.1));
            for (word, _) in unigram_scores.into_iter().take(to_remove) {
                self.unigrams.remove(&word);
            }
        }
        debug!(entries = self.entry_count(), "evicted user history entries");
    }
}

fn bump(entry: &mut HistoryEntry, timestamp: u64) {
    entry.frequency += 1;
    entry.last_access = entry.last_access.max(timestamp);
}

fn bigram_key(ngram: &NgramContext) -> Option<String> {
    if ngram.is_beginning_of_sentence() {
        return Some(BOS_KEY.to_string());
    }
    ngram.prev_word(0).map(fold_case)
}

/// Compute a word score: recency-weighted with frequency bonus.
///
/// Recent picks rank higher, with a logarithmic frequency term to reward
/// repeated use.
fn score(entry: &HistoryEntry, now: u64) -> f64 {
    let age_days = now.saturating_sub(entry.last_access) / 86400;
    let recency = 1.0 / (1.0 + age_days as f64);
    let freq = (entry.frequency as f64).ln_1p();
    recency * 10.0 + freq
}

/// Current time as Unix timestamp in seconds.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Long-term learning store written to after each manual pick.
///
/// Implementations must serialize concurrent writers themselves.
pub trait UserHistoryStore: Send + Sync {
    fn add(
        &self,
        word: &str,
        was_auto_capitalized: bool,
        ngram: &NgramContext,
        timestamp_secs: u64,
        block_offensive: bool,
    );
}

/// Thread-safe handle to a [`UserHistory`], shared between the pick path
/// (writer) and the suggestion source (reader).
#[derive(Debug, Clone)]
pub struct SharedHistory {
    inner: Arc<RwLock<UserHistory>>,
    blocklist: Arc<HashSet<String>>,
}

impl SharedHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(UserHistory::new(max_entries))),
            blocklist: Arc::new(HashSet::new()),
        }
    }

    /// Words that are never learned while offensive-word blocking is on.
    pub fn with_blocklist<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blocklist = Arc::new(words.into_iter().map(|w| fold_case(w.as_ref())).collect());
        self
    }

    /// Run `f` with read access to the history.
    pub fn read<R>(&self, f: impl FnOnce(&UserHistory) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}

impl UserHistoryStore for SharedHistory {
    fn add(
        &self,
        word: &str,
        was_auto_capitalized: bool,
        ngram: &NgramContext,
        timestamp_secs: u64,
        block_offensive: bool,
    ) {
        if block_offensive && self.blocklist.contains(&fold_case(word)) {
            debug!(word, "not learning blocked word");
            return;
        }
        // A capitalized sentence start should be learned as the plain word
        let learned = if was_auto_capitalized {
            decapitalize_first(word)
        } else {
            word.to_string()
        };
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.record(&learned, ngram, timestamp_secs);
    }
}
