use std::thread;
use std::time::Duration;

use super::*;

#[test]
fn test_slow_connection_window() {
    let editor = MemoryEditor::new();
    editor.set_read_latency(Duration::from_millis(150));
    let mut settings = Settings::default();
    settings.connection.slow_full_reload_ms = 100;
    settings.connection.slow_partial_reload_ms = 100;
    settings.connection.slow_persist_secs = 1;
    let h = make_engine(&editor, StubSource::new(&[]), settings);

    assert!(h.engine.snapshot().unwrap().shadow.is_connection_slow);
    // Nothing is learned while the connection is slow
    h.engine.pick("hello");
    assert_eq!(h.editor.text(), "hello");
    assert!(h.history.writes().is_empty());

    editor.set_read_latency(Duration::ZERO);
    thread::sleep(Duration::from_millis(1100));
    assert!(!h.engine.snapshot().unwrap().shadow.is_connection_slow);

    h.engine.pick("world");
    assert_eq!(h.editor.text(), "hello world");
    let writes = h.history.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].word, "world");
}

#[test]
fn test_start_input_clears_slow_mark() {
    let editor = MemoryEditor::new();
    editor.set_read_latency(Duration::from_millis(30));
    let mut settings = Settings::default();
    settings.connection.slow_full_reload_ms = 20;
    let h = make_engine(&editor, StubSource::new(&[]), settings);
    assert!(h.engine.snapshot().unwrap().shadow.is_connection_slow);

    editor.set_read_latency(Duration::ZERO);
    h.engine.start_input(None);
    assert!(!h.engine.snapshot().unwrap().shadow.is_connection_slow);
}

#[test]
fn test_reload_is_idempotent() {
    let editor = MemoryEditor::with_text("one two three");
    let h = make_engine(&editor, StubSource::new(&[]), Settings::default());

    let first = h.engine.snapshot().unwrap();
    h.engine.start_input(None);
    let second = h.engine.snapshot().unwrap();
    assert_eq!(first.shadow, second.shadow);
}

#[test]
fn test_expected_cursor_tracks_commits() {
    let (h, _source) = make_stub_engine(&[]);
    let mut last = 0;
    for word in ["alpha", "beta", "gamma"] {
        h.engine.pick(word);
        let start = h.engine.snapshot().unwrap().shadow.expected_selection_start.unwrap();
        assert!(start > last);
        assert_eq!(start, h.editor.cursor());
        last = start;
    }
}

#[test]
fn test_disconnected_editor() {
    let editor = MemoryEditor::with_text("unreachable");
    editor.set_connected(false);
    let h = make_engine(&editor, StubSource::new(&["hello"]), Settings::default());

    let snapshot = h.engine.snapshot().unwrap();
    assert_eq!(snapshot.shadow.expected_selection_start, None);
    assert!(snapshot.shadow.is_connection_slow);

    // Suggestions still flow; edits are dropped by the editor
    assert_eq!(h.engine.query("hel"), vec!["hello"]);
    h.engine.pick("hello");
    assert_eq!(h.editor.text(), "unreachable");
}

#[test]
fn test_cursor_moved_between_inputs() {
    let editor = MemoryEditor::with_text("hello world");
    let h = make_engine(&editor, StubSource::new(&[]), Settings::default());

    editor.move_cursor(5);
    h.engine.start_input(None);
    let snapshot = h.engine.snapshot().unwrap();
    assert_eq!(snapshot.shadow.committed_before_composing, "hello");
    assert_eq!(snapshot.shadow.expected_selection_start, Some(5));
}

#[test]
fn test_restart_with_mirrored_composing_matches_editor() {
    let h = make_engine(&MemoryEditor::new(), StubSource::new(&[]), mirroring());
    h.engine.query("hel");
    assert_eq!(h.editor.composing_text().as_deref(), Some("hel"));

    h.engine.start_input(None);
    assert_eq!(h.editor.composing_text(), None);
    assert_eq!(shadow_text(&h), h.editor.text());

    h.engine.query("x");
    assert_eq!(h.editor.text(), "helx");
    assert_eq!(shadow_text(&h), h.editor.text());
}
