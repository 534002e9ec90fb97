//! In-memory word list used for prefix prediction.
//!
//! Entries are kept sorted by their folded key (NFKC + lowercase) so a
//! prefix query is two binary searches and a scan of the matching range.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use crate::text::fold_case;

/// Errors that can occur while building a lexicon.
#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON parse error")]
    Json(#[from] serde_json::Error),

    #[error("invalid lexicon format: {0}")]
    Format(String),
}

type Result<T> = std::result::Result<T, LexiconError>;

/// A word with its unigram frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconEntry {
    /// Folded lookup key
    pub key: String,
    /// Surface form as it should be committed
    pub word: String,
    pub frequency: u32,
    pub possibly_offensive: bool,
}

/// A word list with frequencies, searchable by prefix.
#[derive(Debug, Default)]
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
}

// JSON deserialization type
#[derive(Deserialize)]
struct JsonEntry {
    word: String,
    frequency: u32,
    #[serde(default)]
    offensive: bool,
}

impl Lexicon {
    /// Build a Lexicon from `(word, frequency, possibly_offensive)` triples.
    ///
    /// Duplicate surfaces keep the highest frequency.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = (S, u32, bool)>,
        S: Into<String>,
    {
        let mut by_word: HashMap<String, LexiconEntry> = HashMap::new();
        for (word, frequency, possibly_offensive) in words {
            let word: String = word.into();
            if word.is_empty() {
                continue;
            }
            by_word
                .entry(word.clone())
                .and_modify(|e| {
                    e.frequency = e.frequency.max(frequency);
                    e.possibly_offensive |= possibly_offensive;
                })
                .or_insert_with(|| LexiconEntry {
                    key: fold_case(&word),
                    word,
                    frequency,
                    possibly_offensive,
                });
        }

        let mut entries: Vec<LexiconEntry> = by_word.into_values().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.word.cmp(&b.word)));
        Lexicon { entries }
    }

    /// Build a Lexicon from TSV text.
    ///
    /// The format is `word\tfrequency[\toffensive]` where the optional third
    /// column is `1` for possibly offensive words. Lines starting with `#`
    /// are comments; lines with a missing or unparsable frequency are skipped.
    pub fn from_tsv_str(content: &str) -> Self {
        let words = content.lines().filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 2 {
                return None;
            }
            let frequency: u32 = cols[1].trim().parse().ok()?;
            let offensive = cols.get(2).is_some_and(|c| c.trim() == "1");
            Some((cols[0].to_string(), frequency, offensive))
        });
        Self::from_words(words)
    }

    /// Build a Lexicon from a TSV file.
    pub fn build_from_tsv(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut content = String::new();
        BufReader::new(file).read_to_string(&mut content)?;
        Ok(Self::from_tsv_str(&content))
    }

    /// Build a Lexicon from a JSON file.
    ///
    /// The JSON format is an array of `{word, frequency, offensive?}`.
    pub fn build_from_json(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let json_entries: Vec<JsonEntry> = serde_json::from_reader(reader)?;
        Ok(Self::from_words(
            json_entries
                .into_iter()
                .map(|e| (e.word, e.frequency, e.offensive)),
        ))
    }

    /// Load a lexicon with auto-detection of format.
    ///
    /// Files whose first non-blank byte is `[` are parsed as JSON, anything
    /// else as TSV.
    pub fn load_auto(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let first = loop {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                break None;
            }
            if let Some(b) = buf.iter().find(|b| !b.is_ascii_whitespace()) {
                break Some(*b);
            }
            let len = buf.len();
            reader.consume(len);
        };

        match first {
            Some(b'[') => Self::build_from_json(path),
            Some(b'{') => Err(LexiconError::Format(
                "expected a JSON array of entries".to_string(),
            )),
            _ => Self::build_from_tsv(path),
        }
    }

    /// Words whose folded key starts with the folded `prefix`, by frequency descending.
    pub fn predict(&self, prefix: &str, limit: usize) -> Vec<&LexiconEntry> {
        let key = fold_case(prefix);
        let start = self.entries.partition_point(|e| e.key.as_str() < key.as_str());
        let mut matches: Vec<&LexiconEntry> = self.entries[start..]
            .iter()
            .take_while(|e| e.key.starts_with(&key))
            .collect();
        matches.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.word.cmp(&b.word)));
        matches.truncate(limit);
        matches
    }

    /// Exact-match lookup by surface.
    pub fn get(&self, word: &str) -> Option<&LexiconEntry> {
        let key = fold_case(word);
        let start = self.entries.partition_point(|e| e.key.as_str() < key.as_str());
        self.entries[start..]
            .iter()
            .take_while(|e| e.key == key)
            .find(|e| e.word == word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }

    pub fn frequency(&self, word: &str) -> Option<u32> {
        self.get(word).map(|e| e.frequency)
    }

    pub fn is_possibly_offensive(&self, word: &str) -> bool {
        self.get(word).is_some_and(|e| e.possibly_offensive)
    }

    /// All words flagged as possibly offensive.
    pub fn possibly_offensive_words(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.possibly_offensive)
            .map(|e| e.word.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
