//! Tests for the suggestion engine

use std::sync::Arc;

use super::*;
use crate::core::memory_editor::MemoryEditor;
use crate::core::test_support::{RecordingHistory, StubSource};
use wordshadow_engine::SuggestionQuerySource;

mod connection;

struct Harness {
    engine: SuggestionEngine,
    editor: MemoryEditor,
    history: Arc<RecordingHistory>,
}

fn make_engine(
    editor: &MemoryEditor,
    source: Arc<dyn SuggestionQuerySource>,
    settings: Settings,
) -> Harness {
    let history = Arc::new(RecordingHistory::default());
    let services = SessionServices {
        source,
        history: history.clone(),
        key_coordinates: None,
    };
    let engine = SuggestionEngine::new(Box::new(editor.clone()), services, settings).unwrap();
    engine.start_input(None);
    Harness {
        engine,
        editor: editor.clone(),
        history,
    }
}

fn make_stub_engine(words: &[&str]) -> (Harness, Arc<StubSource>) {
    let source = StubSource::new(words);
    let harness = make_engine(&MemoryEditor::new(), source.clone(), Settings::default());
    (harness, source)
}

fn mirroring() -> Settings {
    let mut settings = Settings::default();
    settings.input.mirror_composing = true;
    settings
}

/// The cache's view of the text before the cursor.
fn shadow_text(h: &Harness) -> String {
    let shadow = h.engine.snapshot().unwrap().shadow;
    shadow.committed_before_composing + &shadow.composing
}
