use std::time::{Duration, Instant};

use wordshadow_engine::SpacingAndPunctuations;

use super::*;
use crate::core::memory_editor::{EditorOp, MemoryEditor};

fn shadow_with(editor: &MemoryEditor) -> TextCursorShadow {
    TextCursorShadow::new(Box::new(editor.clone()), ShadowConfig::default())
}

fn reads(editor: &MemoryEditor) -> usize {
    editor
        .ops()
        .iter()
        .filter(|op| matches!(op, EditorOp::Read(_)))
        .count()
}

#[test]
fn test_reload_is_idempotent() {
    let editor = MemoryEditor::with_text("The quick brown fox");
    let mut shadow = shadow_with(&editor);

    assert!(shadow.reload());
    let first = shadow.committed_before_composing().to_string();
    assert!(shadow.reload());
    assert_eq!(shadow.committed_before_composing(), first);
    assert_eq!(first, "The quick brown fox");
}

#[test]
fn test_reload_sets_unknown_selection_from_short_window() {
    let editor = MemoryEditor::with_text("short");
    let mut shadow = shadow_with(&editor);
    assert_eq!(shadow.expected_selection_start(), None);
    shadow.reload();
    assert_eq!(shadow.expected_selection_start(), Some(5));
    assert_eq!(shadow.expected_selection_end(), Some(5));
}

#[test]
fn test_reload_long_document_keeps_selection_unknown() {
    let text = "x".repeat(100);
    let editor = MemoryEditor::with_text(&text);
    let mut shadow = shadow_with(&editor);
    assert!(shadow.reload());
    assert_eq!(shadow.committed_before_composing().chars().count(), DEFAULT_CACHE_SIZE);
    assert_eq!(shadow.expected_selection_start(), None);
}

#[test]
fn test_reload_failure_unsets_selection() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    assert_eq!(shadow.expected_selection_start(), Some(0));

    editor.set_connected(false);
    assert!(!shadow.reload());
    assert_eq!(shadow.expected_selection_start(), None);
    assert_eq!(shadow.expected_selection_end(), None);
    // A failed read counts as a slow connection
    assert!(shadow.is_connection_slow());
}

#[test]
fn test_commit_monotonicity() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.reload();

    let mut total = 0;
    for word in ["hello", " ", "wörld", "!"] {
        shadow.commit_text(word, 1);
        total += word.chars().count();
        assert_eq!(shadow.expected_selection_start(), Some(total));
        assert_eq!(shadow.expected_selection_end(), Some(total));
    }
    assert_eq!(shadow.committed_before_composing(), "hello wörld!");
    assert_eq!(editor.text(), "hello wörld!");
}

#[test]
fn test_commit_replaces_composing() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.reload();

    shadow.set_composing_text("hel", 1);
    assert_eq!(shadow.composing(), "hel");
    assert_eq!(shadow.expected_selection_start(), Some(3));

    shadow.commit_text("hello", 1);
    assert_eq!(shadow.composing(), "");
    assert_eq!(shadow.committed_before_composing(), "hello");
    assert_eq!(shadow.expected_selection_start(), Some(5));
    assert_eq!(editor.text(), "hello");
}

#[test]
fn test_set_composing_shrinks_selection() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    shadow.set_composing_text("world", 1);
    shadow.set_composing_text("wo", 1);
    assert_eq!(shadow.expected_selection_start(), Some(2));
}

#[test]
fn test_commit_without_known_selection() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.commit_text("abc", 1);
    assert_eq!(shadow.expected_selection_start(), None);
    assert_eq!(shadow.committed_before_composing(), "abc");
}

#[test]
fn test_commit_when_disconnected_still_mirrors() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    editor.set_connected(false);
    shadow.commit_text("lost", 1);
    assert_eq!(shadow.committed_before_composing(), "lost");
    assert_eq!(shadow.expected_selection_start(), Some(4));
    assert_eq!(editor.text(), "");
}

#[test]
fn test_finish_composing() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    shadow.set_composing_text("typed", 1);
    shadow.finish_composing_text();
    assert_eq!(shadow.committed_before_composing(), "typed");
    assert_eq!(shadow.composing(), "");
    assert_eq!(shadow.expected_selection_start(), Some(5));
    assert_eq!(editor.composing_text(), None);
}

#[test]
fn test_key_events() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.reload();

    shadow.send_key_event(&KeyEvent::press(Keysym::from_char('a')));
    shadow.send_key_event(&KeyEvent::press(Keysym::RETURN));
    shadow.send_key_event(&KeyEvent::text("ok"));
    assert_eq!(shadow.committed_before_composing(), "a\nok");
    assert_eq!(shadow.expected_selection_start(), Some(4));

    // Releases do not touch the cache
    shadow.send_key_event(&KeyEvent::release(Keysym::from_char('a')));
    assert_eq!(shadow.committed_before_composing(), "a\nok");

    shadow.send_key_event(&KeyEvent::press(Keysym::BACKSPACE));
    assert_eq!(shadow.committed_before_composing(), "a\no");
    assert_eq!(shadow.expected_selection_start(), Some(3));
    assert_eq!(editor.text(), "a\no");
}

#[test]
fn test_backspace_prefers_composing() {
    let editor = MemoryEditor::with_text("ab ");
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    shadow.set_composing_text("cd", 1);

    shadow.send_key_event(&KeyEvent::press(Keysym::BACKSPACE));
    assert_eq!(shadow.composing(), "c");
    assert_eq!(shadow.committed_before_composing(), "ab ");
    assert_eq!(shadow.expected_selection_start(), Some(4));
}

#[test]
fn test_backspace_on_empty_is_noop() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    shadow.send_key_event(&KeyEvent::press(Keysym::BACKSPACE));
    assert_eq!(shadow.committed_before_composing(), "");
    assert_eq!(shadow.expected_selection_start(), Some(0));
}

#[test]
fn test_literal_key_finishes_composing() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    shadow.set_composing_text("hi", 1);
    shadow.send_key_event(&KeyEvent::press(Keysym::SPACE));
    assert_eq!(shadow.composing(), "");
    assert_eq!(shadow.committed_before_composing(), "hi ");
    assert_eq!(shadow.expected_selection_start(), Some(3));
    assert_eq!(editor.text(), "hi ");
}

#[test]
fn test_cursor_key_invalidates_selection() {
    let editor = MemoryEditor::with_text("abc");
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    shadow.send_key_event(&KeyEvent::press(Keysym::LEFT));
    assert_eq!(shadow.expected_selection_start(), None);
}

#[test]
fn test_text_before_cursor_served_from_cache() {
    let editor = MemoryEditor::with_text("hello world");
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    shadow.set_composing_text("fo", 1);
    editor.clear_ops();

    assert_eq!(shadow.text_before_cursor(5).as_deref(), Some("rldfo"));
    assert_eq!(shadow.text_before_cursor(100).as_deref(), Some("hello worldfo"));
    assert_eq!(reads(&editor), 0);
}

#[test]
fn test_text_before_cursor_round_trips_when_unknown() {
    let editor = MemoryEditor::with_text("hello world");
    let mut shadow = shadow_with(&editor);
    // No reload: the selection is unknown
    editor.clear_ops();
    assert_eq!(shadow.text_before_cursor(5).as_deref(), Some("world"));
    assert_eq!(reads(&editor), 1);
}

#[test]
fn test_text_before_cursor_round_trips_when_cache_short() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    shadow.commit_text(&"y".repeat(60), 1);
    // The reload window is smaller than the known selection
    assert!(shadow.reload());
    assert_eq!(shadow.committed_before_composing().chars().count(), DEFAULT_CACHE_SIZE);
    assert_eq!(shadow.expected_selection_start(), Some(60));

    editor.clear_ops();
    assert_eq!(shadow.text_before_cursor(50).map(|t| t.chars().count()), Some(50));
    assert_eq!(reads(&editor), 1);
}

#[test]
fn test_text_before_cursor_disconnected() {
    let editor = MemoryEditor::with_text("abc");
    let mut shadow = shadow_with(&editor);
    editor.set_connected(false);
    assert_eq!(shadow.text_before_cursor(3), None);
}

#[test]
fn test_batch_nesting() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);

    shadow.begin_batch_edit();
    shadow.begin_batch_edit();
    assert_eq!(shadow.nest_level(), 2);
    shadow.end_batch_edit();
    shadow.end_batch_edit();
    assert_eq!(shadow.nest_level(), 0);

    // Unbalanced end is logged, not fatal
    shadow.end_batch_edit();
    assert_eq!(shadow.nest_level(), 0);

    assert_eq!(editor.ops(), vec![EditorOp::BeginBatch, EditorOp::EndBatch]);
}

#[test]
fn test_detect_slow_operation() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    let threshold = Duration::from_millis(200);

    assert!(!shadow.detect_slow_operation(
        Operation::GetTextBeforeCursor,
        Duration::from_millis(50),
        threshold
    ));
    assert!(!shadow.is_connection_slow());

    assert!(shadow.detect_slow_operation(
        Operation::GetTextBeforeCursor,
        Duration::from_millis(200),
        threshold
    ));
    assert!(shadow.is_connection_slow());

    let persist = shadow.config().slow_persist;
    assert!(shadow.is_connection_slow_at(Instant::now() + persist - Duration::from_secs(1)));
    assert!(!shadow.is_connection_slow_at(Instant::now() + persist + Duration::from_secs(1)));
}

#[test]
fn test_slow_read_marks_connection() {
    let editor = MemoryEditor::with_text("slow editor");
    editor.set_read_latency(Duration::from_millis(60));
    let config = ShadowConfig {
        slow_partial_reload: Duration::from_millis(40),
        slow_persist: Duration::from_millis(200),
        ..ShadowConfig::default()
    };
    let mut shadow = TextCursorShadow::new(Box::new(editor.clone()), config);

    // Selection unknown, so this goes to the editor
    assert!(shadow.text_before_cursor(4).is_some());
    assert!(shadow.is_connection_slow());

    std::thread::sleep(Duration::from_millis(300));
    assert!(!shadow.is_connection_slow());
}

#[test]
fn test_on_start_input_clears_slow_mark() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.detect_slow_operation(
        Operation::ReloadTextCache,
        Duration::from_secs(2),
        Duration::from_secs(1),
    );
    assert!(shadow.is_connection_slow());
    shadow.on_start_input();
    assert!(!shadow.is_connection_slow());
}

#[test]
fn test_reload_keeps_mirrored_composing() {
    let editor = MemoryEditor::with_text("say ");
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    shadow.set_composing_text("hel", 1);
    assert!(shadow.reload());
    assert_eq!(shadow.committed_before_composing(), "say ");
    assert_eq!(shadow.composing(), "hel");
}

#[test]
fn test_reload_after_out_of_band_edit() {
    let editor = MemoryEditor::with_text("before");
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    editor.set_text("after the user typed");
    assert!(shadow.reload());
    assert_eq!(shadow.committed_before_composing(), "after the user typed");
}

#[test]
fn test_ngram_context() {
    let editor = MemoryEditor::with_text("I like green");
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    let spacing = SpacingAndPunctuations::default();

    let ctx = shadow.ngram_context_from_nth_previous_word(&spacing, 1);
    assert_eq!(ctx.prev_word(0), Some("green"));

    shadow.set_composing_text(" te", 1);
    let ctx = shadow.ngram_context_from_nth_previous_word(&spacing, 2);
    assert_eq!(ctx.prev_word(0), Some("green"));
}

#[test]
fn test_ngram_context_disconnected_is_empty() {
    let editor = MemoryEditor::with_text("I like green");
    let mut shadow = shadow_with(&editor);
    editor.set_connected(false);
    let ctx = shadow.ngram_context_from_nth_previous_word(&SpacingAndPunctuations::default(), 1);
    assert!(ctx.is_empty());
}

#[test]
fn test_looks_like_url() {
    let editor = MemoryEditor::with_text("visit http://example");
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    assert!(shadow.text_before_cursor_looks_like_url());

    editor.set_text("plain words");
    shadow.reload();
    assert!(!shadow.text_before_cursor_looks_like_url());
}

#[test]
fn test_cursor_caps_mode() {
    let spacing = SpacingAndPunctuations::default();
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    assert!(shadow.cursor_caps_mode(&spacing, false));

    shadow.commit_text("Done.", 1);
    assert!(!shadow.cursor_caps_mode(&spacing, false));
    assert!(shadow.cursor_caps_mode(&spacing, true));

    shadow.commit_text(" next", 1);
    assert!(!shadow.cursor_caps_mode(&spacing, true));

    shadow.set_composing_text("wo", 1);
    assert!(!shadow.cursor_caps_mode(&spacing, true));
}

#[test]
fn test_cursor_caps_mode_reloads_empty_cache() {
    let spacing = SpacingAndPunctuations::default();
    let editor = MemoryEditor::with_text("End. ");
    let mut shadow = shadow_with(&editor);
    editor.clear_ops();
    assert!(shadow.cursor_caps_mode(&spacing, false));
    assert_eq!(reads(&editor), 1);
    assert_eq!(shadow.committed_before_composing(), "End. ");
}

#[test]
fn test_snapshot() {
    let editor = MemoryEditor::new();
    let mut shadow = shadow_with(&editor);
    shadow.reload();
    shadow.commit_text("hi", 1);
    shadow.set_composing_text("th", 1);
    let snap = shadow.snapshot();
    assert_eq!(snap.committed_before_composing, "hi");
    assert_eq!(snap.composing, "th");
    assert_eq!(snap.expected_selection_start, Some(4));
    assert!(!snap.is_connection_slow);
}

#[test]
fn test_last_chars() {
    assert_eq!(last_chars("héllo", 3), "llo");
    assert_eq!(last_chars("héllo", 4), "éllo");
    assert_eq!(last_chars("ab", 5), "ab");
    assert_eq!(last_chars("ab", 0), "");
}
