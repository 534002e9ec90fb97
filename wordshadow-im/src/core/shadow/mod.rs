//! Editor-state shadow cache
//!
//! [`TextCursorShadow`] keeps a local copy of the text before the cursor
//! (committed text plus the composing text) and the expected selection.
//! Every edit sent to the editor is mirrored here first, so most reads are
//! answered without a round-trip. [`TextCursorShadow::reload`] is the only
//! point where the copy is reconciled with the editor.
//!
//! Round-trips are timed. One that exceeds its threshold marks the
//! connection slow for a while, and callers skip optional reads (such as
//! learning lookups) until the mark expires.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, warn};
use wordshadow_engine::{NgramContext, SpacingAndPunctuations, is_sentence_start, looks_like_url};

use super::connection::{EditorConnection, GetTextFlags};
use super::keycode::{KeyEvent, Keysym};
use crate::config::ConnectionSettings;

#[cfg(test)]
mod tests;

/// Characters fetched by a full reload.
pub const DEFAULT_CACHE_SIZE: usize = 40;

/// Characters inspected when building an n-gram context.
const NUM_CHARS_TO_GET_BEFORE_CURSOR: usize = 40;

/// Tuning for the shadow cache and its slow-connection detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowConfig {
    /// Characters fetched by [`TextCursorShadow::reload`]
    pub cache_size: usize,
    /// A reload slower than this marks the connection slow
    pub slow_full_reload: Duration,
    /// A single read slower than this marks the connection slow
    pub slow_partial_reload: Duration,
    /// How long the slow mark persists
    pub slow_persist: Duration,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            slow_full_reload: Duration::from_millis(1000),
            slow_partial_reload: Duration::from_millis(200),
            slow_persist: Duration::from_secs(10 * 60),
        }
    }
}

impl From<&ConnectionSettings> for ShadowConfig {
    fn from(settings: &ConnectionSettings) -> Self {
        Self {
            cache_size: settings.cache_size,
            slow_full_reload: Duration::from_millis(settings.slow_full_reload_ms),
            slow_partial_reload: Duration::from_millis(settings.slow_partial_reload_ms),
            slow_persist: Duration::from_secs(settings.slow_persist_secs),
        }
    }
}

/// Round-trips whose latency is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReloadTextCache,
    GetTextBeforeCursor,
}

/// Immutable copy of the shadow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShadowSnapshot {
    pub committed_before_composing: String,
    pub composing: String,
    pub expected_selection_start: Option<usize>,
    pub expected_selection_end: Option<usize>,
    pub is_connection_slow: bool,
}

/// Local mirror of the text before the editor's cursor.
pub struct TextCursorShadow {
    connection: Box<dyn EditorConnection>,
    config: ShadowConfig,
    committed_before_composing: String,
    composing: String,
    /// `None` when the editor's selection is unknown
    expected_selection_start: Option<usize>,
    expected_selection_end: Option<usize>,
    nest_level: u32,
    last_slow_operation: Option<Instant>,
}

impl TextCursorShadow {
    pub fn new(connection: Box<dyn EditorConnection>, config: ShadowConfig) -> Self {
        Self {
            connection,
            config,
            committed_before_composing: String::new(),
            composing: String::new(),
            expected_selection_start: None,
            expected_selection_end: None,
            nest_level: 0,
            last_slow_operation: None,
        }
    }

    /// Called when a new input session starts: forget earlier slowness.
    pub fn on_start_input(&mut self) {
        self.last_slow_operation = None;
    }

    /// Drop both buffers and the expected selection.
    pub fn reset(&mut self) {
        self.committed_before_composing.clear();
        self.composing.clear();
        self.expected_selection_start = None;
        self.expected_selection_end = None;
    }

    pub fn committed_before_composing(&self) -> &str {
        &self.committed_before_composing
    }

    pub fn composing(&self) -> &str {
        &self.composing
    }

    pub fn expected_selection_start(&self) -> Option<usize> {
        self.expected_selection_start
    }

    pub fn expected_selection_end(&self) -> Option<usize> {
        self.expected_selection_end
    }

    #[cfg(test)]
    pub fn nest_level(&self) -> u32 {
        self.nest_level
    }

    #[cfg(test)]
    pub fn config(&self) -> &ShadowConfig {
        &self.config
    }

    pub fn snapshot(&self) -> ShadowSnapshot {
        ShadowSnapshot {
            committed_before_composing: self.committed_before_composing.clone(),
            composing: self.composing.clone(),
            expected_selection_start: self.expected_selection_start,
            expected_selection_end: self.expected_selection_end,
            is_connection_slow: self.is_connection_slow(),
        }
    }

    // ------------------------------------------------------------------
    // Batch edits
    // ------------------------------------------------------------------

    /// Open a batch edit. Only the outermost level reaches the editor.
    pub fn begin_batch_edit(&mut self) {
        self.nest_level += 1;
        if self.nest_level == 1 {
            if let Err(e) = self.connection.begin_batch_edit() {
                warn!("begin_batch_edit failed: {}", e);
            }
        } else {
            error!("batch edit nest level too deep: {}", self.nest_level);
        }
    }

    /// Close a batch edit. An unbalanced call is logged and ignored.
    pub fn end_batch_edit(&mut self) {
        if self.nest_level == 0 {
            error!("end_batch_edit called with no batch edit in progress");
            return;
        }
        self.nest_level -= 1;
        if self.nest_level == 0 {
            if let Err(e) = self.connection.end_batch_edit() {
                warn!("end_batch_edit failed: {}", e);
            }
        }
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    /// Commit `text` in place of the composing text.
    pub fn commit_text(&mut self, text: &str, new_cursor_position: i32) {
        let delta = char_len(text) as i64 - char_len(&self.composing) as i64;
        self.committed_before_composing.push_str(text);
        self.composing.clear();
        self.shift_expected_selection(delta);

        if let Err(e) = self.connection.commit_text(text, new_cursor_position) {
            warn!("commit_text failed: {}", e);
        }
    }

    /// Replace the composing text with `text`.
    pub fn set_composing_text(&mut self, text: &str, new_cursor_position: i32) {
        let delta = char_len(text) as i64 - char_len(&self.composing) as i64;
        self.composing.clear();
        self.composing.push_str(text);
        self.shift_expected_selection(delta);

        if let Err(e) = self.connection.set_composing_text(text, new_cursor_position) {
            warn!("set_composing_text failed: {}", e);
        }
    }

    /// Commit the composing text as-is.
    pub fn finish_composing_text(&mut self) {
        self.fold_composing();
        if let Err(e) = self.connection.finish_composing_text() {
            warn!("finish_composing_text failed: {}", e);
        }
    }

    /// Mirror a key event, then forward it.
    ///
    /// Only presses change the cache. Keys that insert text finish the
    /// composing text first, as the editor does.
    pub fn send_key_event(&mut self, event: &KeyEvent) {
        if event.is_press {
            match event.keysym {
                Keysym::RETURN => self.insert_literal("\n"),
                Keysym::BACKSPACE => self.delete_before_cursor(),
                Keysym::VOID_SYMBOL => {
                    if let Some(text) = &event.text {
                        self.insert_literal(text);
                    }
                }
                Keysym::LEFT | Keysym::RIGHT => {
                    debug!("cursor key sent, expected selection unknown until reload");
                    self.expected_selection_start = None;
                    self.expected_selection_end = None;
                }
                _ => {
                    if let Some(c) = event.to_char() {
                        self.insert_literal(c.encode_utf8(&mut [0; 4]));
                    }
                }
            }
        }

        if let Err(e) = self.connection.send_key_event(event) {
            warn!("send_key_event failed: {}", e);
        }
    }

    fn insert_literal(&mut self, text: &str) {
        self.fold_composing();
        self.committed_before_composing.push_str(text);
        if let Some(start) = self.expected_selection_start {
            let start = start + char_len(text);
            self.expected_selection_start = Some(start);
            self.expected_selection_end = Some(start);
        }
    }

    fn delete_before_cursor(&mut self) {
        if self.composing.pop().is_none() {
            self.committed_before_composing.pop();
        }
        if let (Some(start), Some(end)) = (self.expected_selection_start, self.expected_selection_end) {
            let start = if start > 0 && start == end { start - 1 } else { start };
            self.expected_selection_start = Some(start);
            self.expected_selection_end = Some(start);
        }
    }

    fn fold_composing(&mut self) {
        let composing = std::mem::take(&mut self.composing);
        self.committed_before_composing.push_str(&composing);
    }

    /// Move the expected selection by `delta`, collapsing it. Clamped at zero.
    fn shift_expected_selection(&mut self, delta: i64) {
        if let Some(start) = self.expected_selection_start {
            let start = (start as i64 + delta).max(0) as usize;
            self.expected_selection_start = Some(start);
            self.expected_selection_end = Some(start);
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Refetch the text before the cursor from the editor.
    ///
    /// Returns `false` when the editor could not be read; the expected
    /// selection is then unknown. When the fetched window is shorter than
    /// the cache size it reaches the start of the document, which pins down
    /// an unknown expected selection.
    pub fn reload(&mut self) -> bool {
        self.committed_before_composing.clear();
        let Some(fetched) = self.read_and_detect_slow(
            Operation::ReloadTextCache,
            self.config.slow_full_reload,
            self.config.cache_size,
        ) else {
            self.expected_selection_start = None;
            self.expected_selection_end = None;
            error!("unable to reload text cache: editor not readable");
            return false;
        };

        // The editor's text includes our composing text
        if !self.composing.is_empty() && fetched.ends_with(&self.composing) {
            let committed_len = fetched.len() - self.composing.len();
            self.committed_before_composing.push_str(&fetched[..committed_len]);
        } else {
            if !self.composing.is_empty() {
                debug!("composing text no longer in editor, dropping it");
                self.composing.clear();
            }
            self.committed_before_composing.push_str(&fetched);
        }

        let fetched_len = char_len(&fetched);
        if self.expected_selection_start.is_none() && fetched_len < self.config.cache_size {
            self.expected_selection_start = Some(fetched_len);
            self.expected_selection_end = Some(fetched_len);
        }
        true
    }

    /// The last `n` characters before the cursor.
    ///
    /// Served from the cache when it is known to be sufficient, otherwise
    /// read from the editor. `None` when the editor could not be read.
    pub fn text_before_cursor(&mut self, n: usize) -> Option<String> {
        let cached_len = char_len(&self.committed_before_composing) + char_len(&self.composing);
        if let Some(start) = self.expected_selection_start {
            if cached_len >= n || cached_len >= start {
                let mut cached = String::with_capacity(
                    self.committed_before_composing.len() + self.composing.len(),
                );
                cached.push_str(&self.committed_before_composing);
                cached.push_str(&self.composing);
                return Some(last_chars(&cached, n).to_string());
            }
        }
        self.read_and_detect_slow(
            Operation::GetTextBeforeCursor,
            self.config.slow_partial_reload,
            n,
        )
    }

    fn read_and_detect_slow(
        &mut self,
        operation: Operation,
        threshold: Duration,
        n: usize,
    ) -> Option<String> {
        let started = Instant::now();
        let result = self.connection.text_before_cursor(n, GetTextFlags::NONE);
        self.detect_slow_operation(operation, started.elapsed(), threshold);
        match result {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(?operation, "text_before_cursor failed: {}", e);
                self.last_slow_operation = Some(Instant::now());
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Slow connection detection
    // ------------------------------------------------------------------

    /// Mark the connection slow if `observed` reached `threshold`.
    pub fn detect_slow_operation(
        &mut self,
        operation: Operation,
        observed: Duration,
        threshold: Duration,
    ) -> bool {
        if observed < threshold {
            return false;
        }
        warn!(
            ?operation,
            observed_ms = observed.as_millis() as u64,
            threshold_ms = threshold.as_millis() as u64,
            "slow editor connection"
        );
        self.last_slow_operation = Some(Instant::now());
        true
    }

    pub fn is_connection_slow(&self) -> bool {
        self.is_connection_slow_at(Instant::now())
    }

    pub fn is_connection_slow_at(&self, now: Instant) -> bool {
        self.last_slow_operation
            .is_some_and(|t| now.saturating_duration_since(t) <= self.config.slow_persist)
    }

    // ------------------------------------------------------------------
    // Context queries
    // ------------------------------------------------------------------

    /// N-gram context whose nearest word is the `n`th word before the cursor.
    pub fn ngram_context_from_nth_previous_word(
        &mut self,
        spacing: &SpacingAndPunctuations,
        n: usize,
    ) -> NgramContext {
        match self.text_before_cursor(NUM_CHARS_TO_GET_BEFORE_CURSOR) {
            Some(prev) => NgramContext::from_nth_previous_word(&prev, spacing, n),
            None => NgramContext::empty(),
        }
    }

    /// Whether the cached text right before the cursor looks like a URL.
    pub fn text_before_cursor_looks_like_url(&self) -> bool {
        looks_like_url(&self.committed_before_composing)
    }

    /// Whether a word started at the cursor should be auto-capitalized.
    ///
    /// `has_space_before` pretends a space is inserted first, for a pending
    /// phantom space.
    pub fn cursor_caps_mode(&mut self, spacing: &SpacingAndPunctuations, has_space_before: bool) -> bool {
        if !self.composing.is_empty() {
            return false;
        }
        if self.committed_before_composing.is_empty()
            && self.expected_selection_start != Some(0)
            && !self.reload()
        {
            warn!("unable to read the editor, guessing caps mode without text");
        }
        is_sentence_start(&self.committed_before_composing, spacing, has_space_before)
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The last `n` characters of `text`.
fn last_chars(text: &str, n: usize) -> &str {
    let len = char_len(text);
    if len <= n {
        return text;
    }
    let skip = len - n;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}
