pub mod caps;
pub mod history;
pub mod lexicon;
pub mod ngram;
pub mod spacing;
pub mod suggest;
pub mod text;

pub use caps::{CapsMode, is_sentence_start};
pub use history::{SharedHistory, UserHistory, UserHistoryStore, now_unix};
pub use lexicon::{Lexicon, LexiconEntry, LexiconError};
pub use ngram::{NgramContext, WordInfo};
pub use spacing::{SpacingAndPunctuations, looks_like_url};
pub use suggest::{
    Coordinate, KeyCoordinates, LexiconSuggest, NOT_A_COORDINATE, SessionKind, SuggestedWord,
    SuggestedWords, SuggestionCallback, SuggestionQuerySource, SuggestionRequest,
};
pub use text::normalize_nfc;
