//! Engine initialization (lexicon loading, learning setup)

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;
use wordshadow_engine::{Lexicon, LexiconSuggest, SharedHistory};

use super::*;

/// Load a TSV or JSON word list.
pub fn load_lexicon(path: &Path) -> Result<Lexicon> {
    let lexicon = Lexicon::load_auto(path)
        .with_context(|| format!("failed to load lexicon from {}", path.display()))?;
    debug!("Loaded lexicon {:?}: {} entries", path, lexicon.len());
    Ok(lexicon)
}

impl SuggestionEngine {
    /// Create an engine that suggests from `lexicon` and learns into an
    /// in-memory user history.
    ///
    /// Words the lexicon flags as possibly offensive are never learned while
    /// `block_offensive` is on.
    pub fn with_lexicon(
        connection: Box<dyn EditorConnection>,
        lexicon: Lexicon,
        settings: Settings,
    ) -> Result<Self> {
        let history = SharedHistory::new(settings.dictionary.history_max_entries)
            .with_blocklist(lexicon.possibly_offensive_words());
        debug!(
            "Initializing lexicon source: {} entries, max_suggestions={}",
            lexicon.len(),
            settings.dictionary.max_suggestions
        );
        let source = LexiconSuggest::spawn(
            Arc::new(lexicon),
            Some(history.clone()),
            settings.dictionary.max_suggestions,
        )
        .context("failed to spawn suggestion worker")?;

        let services = SessionServices {
            source: Arc::new(source),
            history: Arc::new(history),
            key_coordinates: None,
        };
        Self::new(connection, services, settings)
    }
}
