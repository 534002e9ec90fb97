//! In-memory editor
//!
//! A complete [`EditorConnection`] over a local string. Clones share the
//! same document, so one handle can be given to the engine while another
//! inspects the text, simulates latency, or moves the cursor behind the
//! engine's back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::trace;

use super::connection::{ConnectionError, EditorConnection, GetTextFlags, Result};
use super::keycode::{KeyEvent, Keysym};

/// One request received by the editor, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOp {
    BeginBatch,
    EndBatch,
    Commit(String),
    SetComposing(String),
    FinishComposing,
    Key(Keysym),
    Read(usize),
}

#[derive(Debug, Default)]
struct Document {
    text: Vec<char>,
    cursor: usize,
    /// Composing region as a character range
    composing: Option<(usize, usize)>,
    batch_depth: usize,
    connected: bool,
    read_latency: Duration,
    ops: Vec<EditorOp>,
}

impl Document {
    /// Replace the composing region (or insert at the cursor) with `text`.
    /// Returns the range the text now occupies.
    fn replace_composing(&mut self, text: &str, new_cursor_position: i32) -> (usize, usize) {
        let (start, end) = self.composing.take().unwrap_or((self.cursor, self.cursor));
        let inserted: Vec<char> = text.chars().collect();
        let len = inserted.len();
        self.text.splice(start..end, inserted);

        let target = if new_cursor_position > 0 {
            (start + len) as i64 + new_cursor_position as i64 - 1
        } else {
            start as i64 + new_cursor_position as i64
        };
        self.cursor = target.clamp(0, self.text.len() as i64) as usize;
        (start, start + len)
    }

    fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.text.remove(self.cursor);
        if let Some((start, end)) = self.composing {
            self.composing = if end <= self.cursor {
                Some((start, end))
            } else if start > self.cursor {
                Some((start - 1, end - 1))
            } else if end - start > 1 {
                Some((start, end - 1))
            } else {
                None
            };
        }
    }
}

/// Shared in-memory document implementing [`EditorConnection`].
#[derive(Debug, Clone)]
pub struct MemoryEditor {
    doc: Arc<Mutex<Document>>,
}

impl Default for MemoryEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEditor {
    /// An empty, connected editor.
    pub fn new() -> Self {
        Self::with_text("")
    }

    /// A connected editor holding `text` with the cursor at the end.
    pub fn with_text(text: &str) -> Self {
        let text: Vec<char> = text.chars().collect();
        let cursor = text.len();
        Self {
            doc: Arc::new(Mutex::new(Document {
                text,
                cursor,
                connected: true,
                ..Default::default()
            })),
        }
    }

    fn doc(&self) -> MutexGuard<'_, Document> {
        self.doc.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Full document text.
    pub fn text(&self) -> String {
        self.doc().text.iter().collect()
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.doc().cursor
    }

    /// Text of the composing region, if any.
    pub fn composing_text(&self) -> Option<String> {
        let doc = self.doc();
        doc.composing
            .map(|(start, end)| doc.text[start..end].iter().collect())
    }

    /// Requests received so far.
    pub fn ops(&self) -> Vec<EditorOp> {
        self.doc().ops.clone()
    }

    /// Texts committed so far, in order.
    pub fn commits(&self) -> Vec<String> {
        self.doc()
            .ops
            .iter()
            .filter_map(|op| match op {
                EditorOp::Commit(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_ops(&self) {
        self.doc().ops.clear();
    }

    /// Simulate the editor going away (or coming back).
    pub fn set_connected(&self, connected: bool) {
        self.doc().connected = connected;
    }

    /// Delay every `text_before_cursor` answer by `latency`.
    pub fn set_read_latency(&self, latency: Duration) {
        self.doc().read_latency = latency;
    }

    /// Move the cursor out-of-band, as a user tapping elsewhere would.
    pub fn move_cursor(&self, position: usize) {
        let mut doc = self.doc();
        doc.cursor = position.min(doc.text.len());
        doc.composing = None;
    }

    /// Replace the whole document out-of-band and put the cursor at the end.
    pub fn set_text(&self, text: &str) {
        let mut doc = self.doc();
        doc.text = text.chars().collect();
        doc.cursor = doc.text.len();
        doc.composing = None;
    }

    fn connected_doc(&self) -> Result<MutexGuard<'_, Document>> {
        let doc = self.doc();
        if doc.connected {
            Ok(doc)
        } else {
            Err(ConnectionError::NotConnected)
        }
    }
}

impl EditorConnection for MemoryEditor {
    fn begin_batch_edit(&mut self) -> Result<()> {
        let mut doc = self.connected_doc()?;
        doc.batch_depth += 1;
        doc.ops.push(EditorOp::BeginBatch);
        Ok(())
    }

    fn end_batch_edit(&mut self) -> Result<()> {
        let mut doc = self.connected_doc()?;
        if doc.batch_depth == 0 {
            return Err(ConnectionError::Rejected("no batch edit in progress".to_string()));
        }
        doc.batch_depth -= 1;
        doc.ops.push(EditorOp::EndBatch);
        Ok(())
    }

    fn commit_text(&mut self, text: &str, new_cursor_position: i32) -> Result<()> {
        let mut doc = self.connected_doc()?;
        doc.replace_composing(text, new_cursor_position);
        doc.ops.push(EditorOp::Commit(text.to_string()));
        trace!(text, cursor = doc.cursor, "editor commit");
        Ok(())
    }

    fn set_composing_text(&mut self, text: &str, new_cursor_position: i32) -> Result<()> {
        let mut doc = self.connected_doc()?;
        let range = doc.replace_composing(text, new_cursor_position);
        doc.composing = (range.0 != range.1).then_some(range);
        doc.ops.push(EditorOp::SetComposing(text.to_string()));
        Ok(())
    }

    fn finish_composing_text(&mut self) -> Result<()> {
        let mut doc = self.connected_doc()?;
        doc.composing = None;
        doc.ops.push(EditorOp::FinishComposing);
        Ok(())
    }

    fn send_key_event(&mut self, event: &KeyEvent) -> Result<()> {
        let mut doc = self.connected_doc()?;
        doc.ops.push(EditorOp::Key(event.keysym));
        if !event.is_press {
            return Ok(());
        }
        match event.keysym {
            Keysym::RETURN => {
                doc.composing = None;
                doc.replace_composing("\n", 1);
            }
            Keysym::BACKSPACE => doc.delete_before_cursor(),
            Keysym::VOID_SYMBOL => {
                if let Some(text) = &event.text {
                    doc.composing = None;
                    doc.replace_composing(text, 1);
                }
            }
            _ => {
                if let Some(c) = event.to_char() {
                    doc.composing = None;
                    doc.replace_composing(c.encode_utf8(&mut [0; 4]), 1);
                }
            }
        }
        Ok(())
    }

    fn text_before_cursor(&mut self, n: usize, _flags: GetTextFlags) -> Result<String> {
        let latency = self.doc().read_latency;
        if !latency.is_zero() {
            thread::sleep(latency);
        }
        let mut doc = self.connected_doc()?;
        doc.ops.push(EditorOp::Read(n));
        let start = doc.cursor.saturating_sub(n);
        Ok(doc.text[start..doc.cursor].iter().collect())
    }
}
