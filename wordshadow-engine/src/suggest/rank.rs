use std::collections::HashMap;

use crate::history::UserHistory;
use crate::lexicon::Lexicon;
use crate::text::{capitalize_first, fold_case, is_first_char_upper, to_all_caps};

use super::{SuggestedWord, SuggestionRequest};

/// Bonus for a word that followed the previous word in user history.
const BIGRAM_BONUS: f64 = 5.0;

/// Rank candidates for `request`.
///
/// Lexicon predictions score `ln(1 + frequency)`; learned words add their
/// history score, and words that previously followed the context word add
/// a bigram bonus. With nothing typed, only learned next words are
/// returned. Casing follows the request's caps mode (or the typed word's
/// first letter), and duplicates that collapse under casing are dropped.
pub fn rank_suggestions(
    lexicon: &Lexicon,
    history: Option<&UserHistory>,
    request: &SuggestionRequest,
    max_suggestions: usize,
    now: u64,
) -> Vec<SuggestedWord> {
    let typed = request.typed_word();
    let mut scores: HashMap<String, f64> = HashMap::new();

    if !typed.is_empty() {
        for entry in lexicon.predict(&typed, max_suggestions.saturating_mul(2)) {
            if request.block_offensive && entry.possibly_offensive && entry.word != typed {
                continue;
            }
            scores.insert(entry.word.clone(), (entry.frequency as f64).ln_1p());
        }
    }

    if let Some(history) = history {
        if !typed.is_empty() {
            for (word, score) in history.prefix_lookup(&typed, now) {
                if request.block_offensive && lexicon.is_possibly_offensive(&word) {
                    continue;
                }
                *scores.entry(word).or_insert(0.0) += score;
            }
        }
        let folded = fold_case(&typed);
        for (word, score) in history.next_words(&request.ngram, now) {
            if !fold_case(&word).starts_with(&folded) {
                continue;
            }
            *scores.entry(word).or_insert(0.0) += BIGRAM_BONUS + score;
        }
    }

    let mut ranked: Vec<(String, f64)> = scores.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut out: Vec<SuggestedWord> = Vec::with_capacity(max_suggestions);
    for (word, score) in ranked {
        if out.len() >= max_suggestions {
            break;
        }
        let word = apply_caps(&word, request, &typed);
        if out.iter().any(|w| w.word == word) {
            continue;
        }
        out.push(SuggestedWord { word, score });
    }
    out
}

fn apply_caps(word: &str, request: &SuggestionRequest, typed: &str) -> String {
    if request.caps_mode.is_locked() {
        to_all_caps(word)
    } else if request.caps_mode.is_shifted() || is_first_char_upper(typed) {
        capitalize_first(word)
    } else {
        word.to_string()
    }
}
