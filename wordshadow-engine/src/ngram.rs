//! N-gram context: the words preceding the word being typed.

use serde::Serialize;

use crate::spacing::SpacingAndPunctuations;

/// Maximum number of previous words carried in a context.
pub const MAX_PREV_WORD_COUNT: usize = 3;

/// Information about one previous word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "word")]
pub enum WordInfo {
    /// Nothing known about this position
    #[default]
    Empty,
    /// The position is the start of a sentence
    BeginningOfSentence,
    /// A concrete word
    Word(String),
}

/// Previous words, nearest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NgramContext {
    prev_words: [WordInfo; MAX_PREV_WORD_COUNT],
}

impl Default for NgramContext {
    fn default() -> Self {
        Self::empty()
    }
}

impl NgramContext {
    /// A context with no known previous words.
    pub fn empty() -> Self {
        Self {
            prev_words: Default::default(),
        }
    }

    /// A context at the start of a sentence.
    pub fn beginning_of_sentence() -> Self {
        let mut ctx = Self::empty();
        ctx.prev_words[0] = WordInfo::BeginningOfSentence;
        ctx
    }

    /// Build a context from a single previous word.
    pub fn from_word(word: &str) -> Self {
        let mut ctx = Self::empty();
        ctx.prev_words[0] = WordInfo::Word(word.to_string());
        ctx
    }

    /// Build the context whose nearest word is the `n`th word from the end of `text`.
    ///
    /// `n == 1` treats the last whitespace-delimited word as the previous word;
    /// `n == 2` skips it, which is what callers want while that last word is
    /// still being composed.
    pub fn from_nth_previous_word(text: &str, spacing: &SpacingAndPunctuations, n: usize) -> Self {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut ctx = Self::empty();

        for i in 0..MAX_PREV_WORD_COUNT {
            let focused = words.len() as isize - n as isize - i as isize;

            // Stop when the word after the focused one starts with a connector
            let following = focused + 1;
            if following >= 0 && (following as usize) < words.len() {
                let first = words[following as usize].chars().next();
                if first.is_some_and(|c| spacing.is_word_connector(c)) {
                    break;
                }
            }

            if focused < 0 {
                ctx.prev_words[i] = WordInfo::BeginningOfSentence;
                break;
            }
            let word = words[focused as usize];
            let Some(last) = word.chars().last() else {
                ctx.prev_words[i] = WordInfo::BeginningOfSentence;
                break;
            };
            if spacing.is_sentence_terminator(last) {
                ctx.prev_words[i] = WordInfo::BeginningOfSentence;
                break;
            }
            if spacing.is_word_separator(last) || spacing.is_word_connector(last) {
                break;
            }
            ctx.prev_words[i] = WordInfo::Word(word.to_string());
        }
        ctx
    }

    /// The word at position `index` (0 = nearest), if it is a concrete word.
    pub fn prev_word(&self, index: usize) -> Option<&str> {
        match self.prev_words.get(index) {
            Some(WordInfo::Word(w)) => Some(w),
            _ => None,
        }
    }

    pub fn is_beginning_of_sentence(&self) -> bool {
        self.prev_words[0] == WordInfo::BeginningOfSentence
    }

    pub fn is_empty(&self) -> bool {
        self.prev_words.iter().all(|w| *w == WordInfo::Empty)
    }

    pub fn prev_words(&self) -> &[WordInfo] {
        &self.prev_words
    }
}
