//! Shared setup for the wordshadow binaries.
//!
//! Both the REPL and the HTTP server drive a [`SuggestionEngine`] against an
//! in-memory editor; this module loads settings and the lexicon and parses
//! the REPL's line commands.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};
use wordshadow_engine::Lexicon;
use wordshadow_im::{MemoryEditor, Settings, SuggestionEngine, load_lexicon};

/// Word list used when no lexicon is configured.
pub const SAMPLE_LEXICON: &str = include_str!("../data/sample.tsv");

/// Load settings from `path`, or from the user config file when `None`.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Settings::load(),
    }
}

/// Load the lexicon named on the command line, else the one in the
/// settings, else the bundled sample.
pub fn load_lexicon_or_sample(path: Option<&Path>, settings: &Settings) -> Result<Lexicon> {
    let configured = settings.dictionary.path.as_deref().map(Path::new);
    match path.or(configured) {
        Some(path) => load_lexicon(path),
        None => {
            debug!("No lexicon configured, using the bundled sample");
            Ok(Lexicon::from_tsv_str(SAMPLE_LEXICON))
        }
    }
}

/// Build an engine over `editor` and start an input episode on it.
pub fn build_engine(
    editor: &MemoryEditor,
    lexicon_path: Option<&Path>,
    settings: Settings,
) -> Result<SuggestionEngine> {
    let lexicon = load_lexicon_or_sample(lexicon_path, &settings)?;
    info!("Lexicon ready: {} words", lexicon.len());
    let engine = SuggestionEngine::with_lexicon(Box::new(editor.clone()), lexicon, settings)?;
    engine.start_input(None);
    Ok(engine)
}

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Start,
    Finish,
    Query(String),
    Pick(String),
    Text,
    State,
    Help,
    Quit,
}

impl ReplCommand {
    /// Parse a line. A bare word is a query; `query` alone asks for
    /// next-word predictions.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };
        let command = match head {
            "start" => Self::Start,
            "finish" => Self::Finish,
            "query" | "q" => Self::Query(rest.to_string()),
            "pick" | "p" => {
                if rest.is_empty() {
                    return Err("usage: pick <word>".to_string());
                }
                Self::Pick(rest.to_string())
            }
            "text" => Self::Text,
            "state" => Self::State,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "" => return Err("empty command".to_string()),
            word if rest.is_empty() => Self::Query(word.to_string()),
            other => return Err(format!("unknown command: {}", other)),
        };
        Ok(command)
    }
}
